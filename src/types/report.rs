use serde::{Deserialize, Serialize};

use super::{IssueList, NormalizedIssue};
use crate::config::Options;

/// Run options plus the trimmed issues: the only input a formatter sees.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NormalizedReport {
    #[serde(default)]
    pub opts: Options,
    pub issues: IssueList,
}

impl NormalizedReport {
    pub fn issues(&self) -> &[NormalizedIssue] {
        &self.issues.issues
    }

    pub fn sprint_value(&self) -> Option<&str> {
        self.opts.sprint_value()
    }

    pub fn project(&self) -> Option<&str> {
        self.opts.jira.project.as_deref()
    }
}
