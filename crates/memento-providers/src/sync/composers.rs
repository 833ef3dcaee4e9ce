//! One [`Composer`] per [`EntityKind`], turning a GitHub-shaped [`RawEntity`]
//! into composed memory text (§4.4.1).

use async_trait::async_trait;
use base64::Engine;
use memento_domain::constants::sync::{PR_DIFF_PATCH_CHAR_CAP, PR_FILE_LIST_CAP};
use memento_domain::entities::EntityKind;
use memento_domain::error::{Error, Result};
use memento_domain::ports::{ComposedEntity, Composer, RawEntity};
use serde_json::Value;

use crate::http::HttpClientConfig;

fn field_str<'a>(raw: &'a Value, field: &str) -> &'a str {
    raw.get(field).and_then(Value::as_str).unwrap_or("")
}

/// Composes GitHub issues: title, body, labels, and state.
#[derive(Debug, Default)]
pub struct IssueComposer;

#[async_trait]
impl Composer for IssueComposer {
    fn kind(&self) -> EntityKind {
        EntityKind::Issues
    }

    async fn compose(&self, entity: &RawEntity) -> Result<ComposedEntity> {
        let raw = &entity.raw;
        let number = raw.get("number").and_then(Value::as_u64).unwrap_or(0);
        let title = field_str(raw, "title");
        let state = field_str(raw, "state");
        let body = field_str(raw, "body");
        let labels = raw
            .get("labels")
            .and_then(Value::as_array)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|l| l.get("name").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();

        let text = format!("Issue #{number}: {title}\nState: {state}\nLabels: {labels}\n\n{body}");
        let source_url = raw.get("html_url").and_then(Value::as_str).map(str::to_owned);
        Ok(ComposedEntity {
            external_id: entity.external_id.clone(),
            kind: entity.kind,
            text,
            source_url,
        })
    }
}

/// Composes GitHub pull requests: title, body, and a capped file-diff summary
/// (§4.4.1: `PR_FILE_LIST_CAP` files, `PR_DIFF_PATCH_CHAR_CAP` patch characters).
#[derive(Debug, Default)]
pub struct PullRequestComposer;

#[async_trait]
impl Composer for PullRequestComposer {
    fn kind(&self) -> EntityKind {
        EntityKind::PullRequests
    }

    async fn compose(&self, entity: &RawEntity) -> Result<ComposedEntity> {
        let raw = &entity.raw;
        let number = raw.get("number").and_then(Value::as_u64).unwrap_or(0);
        let title = field_str(raw, "title");
        let state = field_str(raw, "state");
        let body = field_str(raw, "body");
        let merged = raw.get("merged_at").is_some_and(|v| !v.is_null());

        let files = raw.get("files").and_then(Value::as_array).cloned().unwrap_or_default();
        let total_files = files.len();
        let shown: Vec<&Value> = files.iter().take(PR_FILE_LIST_CAP).collect();
        let mut diff_section = String::new();
        for file in &shown {
            let filename = field_str(file, "filename");
            let additions = file.get("additions").and_then(Value::as_u64).unwrap_or(0);
            let deletions = file.get("deletions").and_then(Value::as_u64).unwrap_or(0);
            let mut patch = field_str(file, "patch").to_owned();
            if patch.chars().count() > PR_DIFF_PATCH_CHAR_CAP {
                patch = patch.chars().take(PR_DIFF_PATCH_CHAR_CAP).collect::<String>() + "\n[... diff truncated ...]";
            }
            diff_section.push_str(&format!("\n--- {filename} (+{additions}/-{deletions}) ---\n{patch}\n"));
        }
        if total_files > PR_FILE_LIST_CAP {
            diff_section.push_str(&format!("\n... and {} more file(s) not shown\n", total_files - PR_FILE_LIST_CAP));
        }

        let text = format!(
            "Pull Request #{number}: {title}\nState: {state} (merged: {merged})\n\n{body}\n{diff_section}"
        );
        let source_url = raw.get("html_url").and_then(Value::as_str).map(str::to_owned);
        Ok(ComposedEntity {
            external_id: entity.external_id.clone(),
            kind: entity.kind,
            text,
            source_url,
        })
    }
}

/// Composes commits: message, author, and changed-file summary.
#[derive(Debug, Default)]
pub struct CommitComposer;

#[async_trait]
impl Composer for CommitComposer {
    fn kind(&self) -> EntityKind {
        EntityKind::Commits
    }

    async fn compose(&self, entity: &RawEntity) -> Result<ComposedEntity> {
        let raw = &entity.raw;
        let sha = field_str(raw, "sha");
        let short_sha = &sha[..sha.len().min(12)];
        let commit = raw.get("commit").cloned().unwrap_or_default();
        let message = field_str(&commit, "message");
        let author_name = commit
            .get("author")
            .and_then(|a| a.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let files = raw
            .get("files")
            .and_then(Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(|f| f.get("filename").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();

        let text = format!("Commit {short_sha} by {author_name}\n\n{message}\n\nFiles: {files}");
        let source_url = raw.get("html_url").and_then(Value::as_str).map(str::to_owned);
        Ok(ComposedEntity {
            external_id: entity.external_id.clone(),
            kind: entity.kind,
            text,
            source_url,
        })
    }
}

/// Composes Actions check-runs: name, conclusion, and timing.
#[derive(Debug, Default)]
pub struct CiResultComposer;

#[async_trait]
impl Composer for CiResultComposer {
    fn kind(&self) -> EntityKind {
        EntityKind::CiResults
    }

    async fn compose(&self, entity: &RawEntity) -> Result<ComposedEntity> {
        let raw = &entity.raw;
        let name = field_str(raw, "name");
        let status = field_str(raw, "status");
        let conclusion = field_str(raw, "conclusion");
        let head_branch = field_str(raw, "head_branch");
        let created_at = field_str(raw, "created_at");
        let updated_at = field_str(raw, "updated_at");

        let text = format!(
            "CI Run: {name}\nBranch: {head_branch}\nStatus: {status} / Conclusion: {conclusion}\nStarted: {created_at}\nUpdated: {updated_at}"
        );
        let source_url = raw.get("html_url").and_then(Value::as_str).map(str::to_owned);
        Ok(ComposedEntity {
            external_id: entity.external_id.clone(),
            kind: entity.kind,
            text,
            source_url,
        })
    }
}

/// Composes code blobs: fetches and decodes the file content behind a git
/// tree entry, since the tree listing itself carries no content (§4.4.3).
pub struct CodeBlobComposer {
    client: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
}

impl CodeBlobComposer {
    pub fn new(config: HttpClientConfig, owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        let base_url = config.base_url.clone();
        let client = crate::http::build_client(&config)?;
        Ok(Self {
            client,
            base_url,
            owner: owner.into(),
            repo: repo.into(),
        })
    }
}

#[async_trait]
impl Composer for CodeBlobComposer {
    fn kind(&self) -> EntityKind {
        EntityKind::CodeBlobs
    }

    async fn compose(&self, entity: &RawEntity) -> Result<ComposedEntity> {
        let path = field_str(&entity.raw, "path");
        let url = format!("{}/repos/{}/{}/contents/{path}", self.base_url, self.owner, self.repo);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::upstream_with_source("code blob fetch failed", e))?;
        if !response.status().is_success() {
            return Err(Error::upstream(format!("code blob fetch returned status {}", response.status())));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::upstream_with_source("malformed code blob response", e))?;

        let encoded = field_str(&body, "content").replace('\n', "");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| Error::upstream_with_source("code blob content was not valid base64", e))?;
        let content = String::from_utf8_lossy(&decoded).into_owned();

        let text = format!("File: {path}\n\n{content}");
        let source_url = body.get("html_url").and_then(Value::as_str).map(str::to_owned);
        Ok(ComposedEntity {
            external_id: entity.external_id.clone(),
            kind: entity.kind,
            text,
            source_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn issue_composer_includes_labels_and_state() {
        let entity = RawEntity {
            external_id: "acme/repo#1".to_owned(),
            kind: EntityKind::Issues,
            raw: json!({
                "number": 1,
                "title": "Crash on startup",
                "state": "open",
                "body": "It crashes.",
                "labels": [{"name": "bug"}, {"name": "p1"}],
                "html_url": "https://github.com/acme/repo/issues/1",
            }),
        };
        let composed = IssueComposer.compose(&entity).await.expect("compose");
        assert!(composed.text.contains("Issue #1: Crash on startup"));
        assert!(composed.text.contains("bug, p1"));
    }

    #[tokio::test]
    async fn pull_request_composer_truncates_long_patches() {
        let long_patch = "x".repeat(PR_DIFF_PATCH_CHAR_CAP + 500);
        let entity = RawEntity {
            external_id: "acme/repo#7".to_owned(),
            kind: EntityKind::PullRequests,
            raw: json!({
                "number": 7,
                "title": "Refactor",
                "state": "closed",
                "merged_at": "2026-01-01T00:00:00Z",
                "body": "desc",
                "files": [{"filename": "a.rs", "additions": 10, "deletions": 2, "patch": long_patch}],
            }),
        };
        let composed = PullRequestComposer.compose(&entity).await.expect("compose");
        assert!(composed.text.contains("[... diff truncated ...]"));
        assert!(composed.text.len() < long_patch.len() + 500);
    }

    #[tokio::test]
    async fn pull_request_composer_summarizes_files_beyond_cap() {
        let files: Vec<Value> = (0..PR_FILE_LIST_CAP + 5)
            .map(|i| json!({"filename": format!("f{i}.rs"), "additions": 1, "deletions": 0, "patch": ""}))
            .collect();
        let entity = RawEntity {
            external_id: "acme/repo#9".to_owned(),
            kind: EntityKind::PullRequests,
            raw: json!({"number": 9, "title": "Big", "state": "open", "body": "", "files": files}),
        };
        let composed = PullRequestComposer.compose(&entity).await.expect("compose");
        assert!(composed.text.contains("5 more file(s) not shown"));
    }

    #[tokio::test]
    async fn commit_composer_shortens_sha() {
        let entity = RawEntity {
            external_id: "acme/repo@abc123".to_owned(),
            kind: EntityKind::Commits,
            raw: json!({
                "sha": "abcdef0123456789",
                "commit": {"message": "fix bug", "author": {"name": "jane"}},
                "files": [{"filename": "x.rs"}],
            }),
        };
        let composed = CommitComposer.compose(&entity).await.expect("compose");
        assert!(composed.text.starts_with("Commit abcdef012345 by jane"));
    }
}
