//! External sync-source adapters: a GitHub-shaped code host `UpstreamSource`
//! plus one `Composer` per entity kind (§4.4, §4.4.1, §4.4.3).

mod composers;
mod github_source;
mod jira_composer;

pub use composers::{CiResultComposer, CodeBlobComposer, CommitComposer, IssueComposer, PullRequestComposer};
pub use github_source::{CodeBlobPolicy, GitHubSource};
pub use jira_composer::JiraIssueComposer;
