//! GitHub REST API `UpstreamSource` (§4.4, §4.4.3): a code-host shaped source
//! covering issues, pull requests, commits, CI check-runs, and code blobs, in
//! the fixed [`EntityKind::ordered`] processing order.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use globset::{Glob, GlobSetBuilder};
use memento_domain::entities::EntityKind;
use memento_domain::error::{Error, Result};
use memento_domain::ports::{MergedPullRequest, RateLimitStatus, RawEntity, UpstreamPage, UpstreamSource};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;

use crate::constants::github::{
    ACCEPT_HEADER, GITHUB_MAX_RETRIES, GITHUB_RETRY_BASE_BACKOFF, PAGE_SIZE, RATE_LIMIT_REMAINING_HEADER,
    RATE_LIMIT_RESET_HEADER,
};
use crate::http::HttpClientConfig;

/// Code-blob sync constraints, threaded through from `SyncConfig` so the
/// source can skip oversized or excluded files before they ever reach a
/// composer (§4.4.3).
#[derive(Debug, Clone)]
pub struct CodeBlobPolicy {
    pub max_size_bytes: usize,
    pub exclude_globs: Vec<String>,
}

/// A GitHub-shaped code host: issues, pull requests (with file diffs),
/// commits, Actions check-runs, and git-tree code blobs.
pub struct GitHubSource {
    client: reqwest::Client,
    base_url: String,
    owner: String,
    repo: String,
    code_blob_policy: CodeBlobPolicy,
    rate_limit: Mutex<RateLimitStatus>,
}

impl GitHubSource {
    pub fn new(
        config: HttpClientConfig,
        owner: impl Into<String>,
        repo: impl Into<String>,
        code_blob_policy: CodeBlobPolicy,
    ) -> Result<Self> {
        let base_url = config.base_url.clone();
        let token = config.api_key.clone();
        let client = build_authenticated_client(config, token)?;
        Ok(Self {
            client,
            base_url,
            owner: owner.into(),
            repo: repo.into(),
            code_blob_policy,
            rate_limit: Mutex::new(RateLimitStatus::default()),
        })
    }

    fn record_rate_limit(&self, headers: &HeaderMap) {
        let remaining = headers
            .get(RATE_LIMIT_REMAINING_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok());
        let reset_after_secs = headers
            .get(RATE_LIMIT_RESET_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        if remaining.is_some() || reset_after_secs.is_some() {
            if let Ok(mut guard) = self.rate_limit.lock() {
                *guard = RateLimitStatus { remaining, reset_after_secs };
            }
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        let mut attempt = 0;
        loop {
            let request = self.client.get(&url).query(query);
            let result = request.send().await;
            match result {
                Ok(response) => {
                    self.record_rate_limit(response.headers());
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<Value>()
                            .await
                            .map_err(|e| Error::upstream_with_source("malformed GitHub response", e));
                    }
                    if attempt >= GITHUB_MAX_RETRIES || !status.is_server_error() {
                        return Err(Error::upstream(format!("GitHub API returned status {status} for {path}")));
                    }
                }
                Err(e) => {
                    if attempt >= GITHUB_MAX_RETRIES {
                        return Err(Error::upstream_with_source("GitHub request failed", e));
                    }
                }
            }
            tokio::time::sleep(full_jitter_backoff(attempt)).await;
            attempt += 1;
        }
    }

    fn page_from_cursor(cursor: Option<&str>) -> u32 {
        cursor.and_then(|c| c.parse().ok()).unwrap_or(1)
    }

    fn next_cursor(page: u32, returned: usize) -> Option<String> {
        if returned as u32 >= PAGE_SIZE {
            Some((page + 1).to_string())
        } else {
            None
        }
    }

    async fn fetch_issues(&self, since: Option<DateTime<Utc>>, cursor: Option<String>) -> Result<UpstreamPage> {
        let page = Self::page_from_cursor(cursor.as_deref());
        let mut query: Vec<(&str, String)> = vec![
            ("state", "all".to_owned()),
            ("sort", "updated".to_owned()),
            ("direction", "desc".to_owned()),
            ("per_page", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        let body = self
            .get_json(&format!("/repos/{}/{}/issues", self.owner, self.repo), &query)
            .await?;
        let items = body.as_array().cloned().unwrap_or_default();
        let entities = items
            .into_iter()
            .filter(|item| item.get("pull_request").is_none())
            .filter_map(|item| {
                let number = item.get("number")?.as_u64()?;
                Some(RawEntity {
                    external_id: format!("{}/{}#{number}", self.owner, self.repo),
                    kind: EntityKind::Issues,
                    raw: item,
                })
            })
            .collect::<Vec<_>>();
        let returned = entities.len();
        Ok(UpstreamPage {
            entities,
            next_cursor: Self::next_cursor(page, returned),
        })
    }

    async fn fetch_pull_requests(&self, since: Option<DateTime<Utc>>, cursor: Option<String>) -> Result<UpstreamPage> {
        let page = Self::page_from_cursor(cursor.as_deref());
        let query = [
            ("state", "all".to_owned()),
            ("sort", "updated".to_owned()),
            ("direction", "desc".to_owned()),
            ("per_page", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
        ];
        let body = self
            .get_json(&format!("/repos/{}/{}/pulls", self.owner, self.repo), &query)
            .await?;
        let items = body.as_array().cloned().unwrap_or_default();
        let mut entities = Vec::new();
        for item in items {
            let Some(number) = item.get("number").and_then(Value::as_u64) else {
                continue;
            };
            if let Some(since) = since {
                let updated_at = item
                    .get("updated_at")
                    .and_then(Value::as_str)
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
                if updated_at.is_some_and(|t| t.with_timezone(&Utc) < since) {
                    continue;
                }
            }
            let files = self.fetch_pull_request_files(number).await.unwrap_or_default();
            let mut raw = item;
            raw["files"] = Value::Array(files);
            entities.push(RawEntity {
                external_id: format!("{}/{}#{number}", self.owner, self.repo),
                kind: EntityKind::PullRequests,
                raw,
            });
        }
        let returned = entities.len();
        Ok(UpstreamPage {
            entities,
            next_cursor: Self::next_cursor(page, returned),
        })
    }

    async fn fetch_pull_request_files(&self, number: u64) -> Result<Vec<Value>> {
        let query = [("per_page", PAGE_SIZE.to_string())];
        let body = self
            .get_json(&format!("/repos/{}/{}/pulls/{number}/files", self.owner, self.repo), &query)
            .await?;
        Ok(body.as_array().cloned().unwrap_or_default())
    }

    async fn fetch_commits(&self, since: Option<DateTime<Utc>>, cursor: Option<String>) -> Result<UpstreamPage> {
        let page = Self::page_from_cursor(cursor.as_deref());
        let mut query: Vec<(&str, String)> = vec![("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())];
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        let body = self
            .get_json(&format!("/repos/{}/{}/commits", self.owner, self.repo), &query)
            .await?;
        let items = body.as_array().cloned().unwrap_or_default();
        let entities = items
            .into_iter()
            .filter_map(|item| {
                let sha = item.get("sha")?.as_str()?.to_owned();
                Some(RawEntity {
                    external_id: format!("{}/{}@{sha}", self.owner, self.repo),
                    kind: EntityKind::Commits,
                    raw: item,
                })
            })
            .collect::<Vec<_>>();
        let returned = entities.len();
        Ok(UpstreamPage {
            entities,
            next_cursor: Self::next_cursor(page, returned),
        })
    }

    async fn fetch_ci_results(&self, _since: Option<DateTime<Utc>>, cursor: Option<String>) -> Result<UpstreamPage> {
        let page = Self::page_from_cursor(cursor.as_deref());
        let query = [("per_page", PAGE_SIZE.to_string()), ("page", page.to_string())];
        let body = self
            .get_json(&format!("/repos/{}/{}/actions/runs", self.owner, self.repo), &query)
            .await?;
        let items = body
            .get("workflow_runs")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let entities = items
            .into_iter()
            .filter_map(|item| {
                let id = item.get("id")?.as_u64()?;
                Some(RawEntity {
                    external_id: format!("{}/{}/runs/{id}", self.owner, self.repo),
                    kind: EntityKind::CiResults,
                    raw: item,
                })
            })
            .collect::<Vec<_>>();
        let returned = entities.len();
        Ok(UpstreamPage {
            entities,
            next_cursor: Self::next_cursor(page, returned),
        })
    }

    async fn fetch_code_blobs(&self, cursor: Option<String>) -> Result<UpstreamPage> {
        if cursor.is_some() {
            return Ok(UpstreamPage::default());
        }
        let query: [(&str, String); 1] = [("recursive", "1".to_owned())];
        let body = self
            .get_json(&format!("/repos/{}/{}/git/trees/HEAD", self.owner, self.repo), &query)
            .await?;
        let items = body.get("tree").and_then(Value::as_array).cloned().unwrap_or_default();

        let mut exclude = GlobSetBuilder::new();
        for pattern in &self.code_blob_policy.exclude_globs {
            if let Ok(glob) = Glob::new(pattern) {
                exclude.add(glob);
            }
        }
        let exclude = exclude.build().map_err(|e| Error::internal(e.to_string()))?;

        let mut entities = Vec::new();
        for item in items {
            if item.get("type").and_then(Value::as_str) != Some("blob") {
                continue;
            }
            let Some(path) = item.get("path").and_then(Value::as_str) else {
                continue;
            };
            if exclude.is_match(path) {
                continue;
            }
            let size = item.get("size").and_then(Value::as_u64).unwrap_or(0) as usize;
            if size > self.code_blob_policy.max_size_bytes {
                continue;
            }
            entities.push(RawEntity {
                external_id: format!("{}/{}:{path}", self.owner, self.repo),
                kind: EntityKind::CodeBlobs,
                raw: item,
            });
        }
        Ok(UpstreamPage { entities, next_cursor: None })
    }
}

#[async_trait]
impl UpstreamSource for GitHubSource {
    fn source_name(&self) -> &str {
        "github"
    }

    async fn fetch_page(
        &self,
        kind: EntityKind,
        since: Option<DateTime<Utc>>,
        cursor: Option<String>,
    ) -> Result<UpstreamPage> {
        match kind {
            EntityKind::Issues => self.fetch_issues(since, cursor).await,
            EntityKind::PullRequests => self.fetch_pull_requests(since, cursor).await,
            EntityKind::Commits => self.fetch_commits(since, cursor).await,
            EntityKind::CiResults => self.fetch_ci_results(since, cursor).await,
            EntityKind::CodeBlobs => self.fetch_code_blobs(cursor).await,
        }
    }

    async fn merged_pull_requests_since(&self, since: DateTime<Utc>) -> Result<Vec<MergedPullRequest>> {
        let query = [
            ("state", "closed".to_owned()),
            ("sort", "updated".to_owned()),
            ("direction", "desc".to_owned()),
            ("per_page", PAGE_SIZE.to_string()),
        ];
        let body = self
            .get_json(&format!("/repos/{}/{}/pulls", self.owner, self.repo), &query)
            .await?;
        let items = body.as_array().cloned().unwrap_or_default();

        let mut merged = Vec::new();
        for item in items {
            let Some(merged_at) = item
                .get("merged_at")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc))
            else {
                continue;
            };
            if merged_at < since {
                continue;
            }
            let Some(number) = item.get("number").and_then(Value::as_u64) else {
                continue;
            };
            let files = self
                .fetch_pull_request_files(number)
                .await
                .unwrap_or_default()
                .into_iter()
                .filter_map(|f| f.get("filename").and_then(Value::as_str).map(str::to_owned))
                .collect();
            merged.push(MergedPullRequest {
                external_id: format!("{}/{}#{number}", self.owner, self.repo),
                files_changed: files,
                merged_at,
            });
        }
        Ok(merged)
    }

    fn rate_limit_status(&self) -> RateLimitStatus {
        self.rate_limit.lock().map(|g| *g).unwrap_or_default()
    }
}

fn build_authenticated_client(config: HttpClientConfig, token: Option<String>) -> Result<reqwest::Client> {
    use crate::constants::http::{IDLE_TIMEOUT, KEEPALIVE, MAX_IDLE_PER_HOST, USER_AGENT};

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Error::config_with_source("invalid GitHub token header value", e))?;
        headers.insert(AUTHORIZATION, value);
    }
    reqwest::Client::builder()
        .default_headers(headers)
        .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
        .pool_idle_timeout(IDLE_TIMEOUT)
        .tcp_keepalive(KEEPALIVE)
        .timeout(config.timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::config_with_source("failed to build GitHub HTTP client", e))
}

fn full_jitter_backoff(attempt: u32) -> std::time::Duration {
    let base_ms = GITHUB_RETRY_BASE_BACKOFF.as_millis() as u64;
    let ceiling = base_ms.saturating_mul(1u64 << attempt.min(10));
    let jittered = rand::thread_rng().gen_range(0..=ceiling.max(1));
    std::time::Duration::from_millis(jittered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_cursor_advances_only_on_full_page() {
        assert_eq!(GitHubSource::next_cursor(1, PAGE_SIZE as usize), Some("2".to_owned()));
        assert_eq!(GitHubSource::next_cursor(1, 3), None);
    }

    #[test]
    fn page_from_cursor_defaults_to_first_page() {
        assert_eq!(GitHubSource::page_from_cursor(None), 1);
        assert_eq!(GitHubSource::page_from_cursor(Some("7")), 7);
    }
}
