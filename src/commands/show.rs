use std::path::Path;

use tabled::Tabled;

use crate::commands::make::read_report;
use crate::error::Result;
use crate::output::{self, print_table, status_colored, truncate};
use crate::types::NormalizedIssue;

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Type")]
    issue_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Summary")]
    summary: String,
}

impl From<&NormalizedIssue> for IssueRow {
    fn from(issue: &NormalizedIssue) -> Self {
        let category = issue
            .fields
            .get("status")
            .and_then(|s| s.get("statusCategory"))
            .and_then(|c| c.get("key"))
            .and_then(|k| k.as_str());

        Self {
            key: issue.key.clone(),
            issue_type: issue.issue_type().unwrap_or("-").to_string(),
            status: issue
                .status()
                .map(|s| status_colored(s, category))
                .unwrap_or_else(|| "-".to_string()),
            summary: truncate(&issue.summary, 60),
        }
    }
}

/// List the issues of a working file.
pub fn run(file: &Path) -> Result<()> {
    let report = read_report(file)?;

    if report.issues().is_empty() && !output::is_json_output() {
        output::print_message("No issues in this working file.");
        return Ok(());
    }

    print_table(report.issues(), |issue| IssueRow::from(issue));
    Ok(())
}
