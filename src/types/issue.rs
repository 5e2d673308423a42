use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An issue trimmed down to what the formatters consume.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NormalizedIssue {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(
        rename = "renderedFields",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rendered_fields: Option<Value>,
}

impl NormalizedIssue {
    pub fn issue_type(&self) -> Option<&str> {
        self.named_field("issuetype")
    }

    pub fn status(&self) -> Option<&str> {
        self.named_field("status")
    }

    /// Rendered HTML description, when rendered fields were requested.
    pub fn rendered_description(&self) -> Option<&str> {
        self.rendered_fields
            .as_ref()?
            .get("description")?
            .as_str()
            .filter(|d| !d.trim().is_empty())
    }

    fn named_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field)?.get("name")?.as_str()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct IssueList {
    pub issues: Vec<NormalizedIssue>,
}
