mod issue;
mod report;
mod resource;

pub use issue::{IssueList, NormalizedIssue};
pub use report::NormalizedReport;
pub use resource::AccessibleResource;
