use serde::Deserialize;

/// One entry of the accessible-resources listing: a Jira site the token can reach.
#[derive(Deserialize, Debug, Clone)]
pub struct AccessibleResource {
    pub id: String,
    pub name: String,
}
