//! Shared response and request bodies for the authorization server and REST API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token endpoint response. Success carries `access_token`, failure `error`.
#[derive(Deserialize, Debug, Default)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Authorization-code grant posted to the token endpoint.
#[derive(Serialize, Debug)]
pub struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub grant_type: &'a str,
    pub redirect_uri: &'a str,
    pub code: &'a str,
}

/// Body of the POST search call.
#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub jql: String,
    pub start_at: u32,
    pub fields: Vec<String>,
    pub fields_by_keys: bool,
    pub expand: Vec<String>,
}

/// Search response; only the raw `issues` array is kept.
#[derive(Deserialize, Debug)]
pub struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<Value>,
}
