use serde_json::Value;
use tracing::info;

use crate::config::Options;
use crate::error::{ReleaseNotesError, Result};
use crate::types::{IssueList, NormalizedIssue, NormalizedReport};

/// Strip a raw search result down to `{key, summary, fields}` per issue and
/// wrap it with the run options.
///
/// Input must be the raw `issues` array. Any issue without an object-valued
/// `fields` fails the whole report rather than being skipped.
pub fn normalize(raw: &Value, options: &Options) -> Result<NormalizedReport> {
    info!("making json from jira issues");

    let raw_issues = raw.as_array().ok_or_else(|| {
        ReleaseNotesError::Normalization("expected an array of raw issues".to_string())
    })?;

    let issues = raw_issues
        .iter()
        .enumerate()
        .map(|(index, issue)| normalize_issue(index, issue, options.jira.rendered_fields))
        .collect::<Result<Vec<_>>>()?;

    Ok(NormalizedReport {
        opts: options.clone(),
        issues: IssueList { issues },
    })
}

fn normalize_issue(index: usize, issue: &Value, rendered: bool) -> Result<NormalizedIssue> {
    let fields = issue
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            ReleaseNotesError::Normalization(format!("issue {index} has no fields"))
        })?;

    let text = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_default()
    };

    Ok(NormalizedIssue {
        key: text(issue.get("key")),
        summary: text(fields.get("summary")),
        fields: fields.clone(),
        rendered_fields: if rendered {
            issue.get("renderedFields").cloned()
        } else {
            None
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_issues() -> Value {
        json!([
            {
                "id": "10001",
                "self": "https://example.atlassian.net/rest/api/3/issue/10001",
                "key": "PROJ-2",
                "fields": {
                    "summary": "Second",
                    "status": {"name": "Done"},
                    "issuetype": {"name": "Bug"}
                },
                "renderedFields": {"description": "<p>two</p>"}
            },
            {
                "id": "10000",
                "key": "PROJ-1",
                "fields": {"summary": "First", "status": {"name": "Done"}}
            }
        ])
    }

    fn options(rendered: bool) -> Options {
        let mut options = Options::default();
        options.jira.rendered_fields = rendered;
        options
    }

    #[test]
    fn test_preserves_count_order_and_fields() {
        let raw = raw_issues();
        let report = normalize(&raw, &options(false)).unwrap();

        let issues = report.issues();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].key, "PROJ-2");
        assert_eq!(issues[0].summary, "Second");
        assert_eq!(Value::Object(issues[0].fields.clone()), raw[0]["fields"]);
        assert_eq!(issues[1].key, "PROJ-1");
        assert_eq!(issues[1].summary, "First");
        assert!(issues.iter().all(|i| i.rendered_fields.is_none()));
    }

    #[test]
    fn test_rendered_fields_only_when_enabled_and_present() {
        let report = normalize(&raw_issues(), &options(true)).unwrap();
        let issues = report.issues();

        assert_eq!(
            issues[0].rendered_fields,
            Some(json!({"description": "<p>two</p>"}))
        );
        assert!(issues[1].rendered_fields.is_none());

        let serialized = serde_json::to_value(&report).unwrap();
        assert!(serialized["issues"]["issues"][1].get("renderedFields").is_none());
    }

    #[test]
    fn test_report_wraps_options() {
        let mut opts = options(false);
        opts.jira.project = Some("PROJ".to_string());

        let report = normalize(&raw_issues(), &opts).unwrap();
        assert_eq!(report.opts, opts);

        let serialized = serde_json::to_value(&report).unwrap();
        assert_eq!(serialized["opts"]["jira"]["project"], "PROJ");
        assert_eq!(serialized["issues"]["issues"][0]["key"], "PROJ-2");
    }

    #[test]
    fn test_missing_fields_is_fatal() {
        let raw = json!([
            {"key": "PROJ-1", "fields": {"summary": "ok"}},
            {"key": "PROJ-2"}
        ]);

        let err = normalize(&raw, &options(false)).unwrap_err();
        match err {
            ReleaseNotesError::Normalization(message) => assert!(message.contains("issue 1")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_already_normalized_report_is_rejected() {
        let report = normalize(&raw_issues(), &options(false)).unwrap();
        let normalized = serde_json::to_value(&report).unwrap();

        assert!(matches!(
            normalize(&normalized, &options(false)),
            Err(ReleaseNotesError::Normalization(_))
        ));
        assert!(matches!(
            normalize(&normalized["issues"], &options(false)),
            Err(ReleaseNotesError::Normalization(_))
        ));
    }

    #[test]
    fn test_empty_snapshot() {
        let report = normalize(&json!([]), &options(false)).unwrap();
        assert!(report.issues().is_empty());
    }
}
