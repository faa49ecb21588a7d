// GitHub issue fetcher: paginated GraphQL queries for open issues,
// their labels, and cross-reference timeline events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{FetchError, Result};

/// GraphQL query for open issues with labels and cross-references.
///
/// Pages of up to 100 issues, most-recently-created first; up to 5
/// labels and up to 100 cross-referenced timeline events per issue.
const ISSUE_QUERY: &str = r"
query($owner: String!, $repo: String!, $cursor: String) {
    repository(owner: $owner, name: $repo) {
        issues(first: 100, after: $cursor, states: [OPEN], orderBy: {field: CREATED_AT, direction: DESC}) {
            pageInfo {
                hasNextPage
                endCursor
            }
            nodes {
                number
                title
                url
                createdAt
                labels(first: 5) {
                    nodes {
                        name
                        color
                    }
                }
                timelineItems(first: 100, itemTypes: [CROSS_REFERENCED_EVENT]) {
                    nodes {
                        ... on CrossReferencedEvent {
                            source {
                                ... on Issue {
                                    number
                                    repository {
                                        nameWithOwner
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
";

// ── Wire Types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<ApiError>>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    repository: Option<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    issues: IssuePage,
}

/// One page of issues plus the cursor state for the next request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePage {
    pub page_info: PageInfo,
    pub nodes: Vec<IssueRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    /// Opaque cursor, passed back unchanged on the next request.
    pub end_cursor: Option<String>,
}

/// A single issue as returned by the tracker API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: LabelConnection,
    #[serde(default)]
    pub timeline_items: TimelineConnection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelConnection {
    pub nodes: Vec<IssueLabel>,
}

/// Label as fetched: raw hex color without the `#` prefix.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueLabel {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimelineConnection {
    pub nodes: Vec<TimelineItem>,
}

/// A cross-referenced timeline event. The source fragment only matches
/// issues, so events originating from pull requests deserialize as an
/// empty object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimelineItem {
    #[serde(default)]
    pub source: Option<CrossRefSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrossRefSource {
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub repository: Option<RepositoryRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRef {
    pub name_with_owner: String,
}

// ── Page Source Seam ────────────────────────────────────────────────

/// One page of the paginated issue query.
///
/// The pagination loop in [`fetch_all_issues`] only depends on this
/// seam, so it can be exercised against fixture pages without a network.
#[async_trait]
pub trait IssuePageSource: Send + Sync {
    async fn fetch_page(
        &self,
        owner: &str,
        repo: &str,
        cursor: Option<&str>,
    ) -> Result<IssuePage>;
}

/// Fetch every open issue, page by page, until the API reports no
/// further page.
///
/// Pages are fetched strictly sequentially: each request's cursor comes
/// from the previous response. A failed page aborts the whole fetch —
/// no partial results are returned. There is no client-side cap on the
/// number of pages; the API's pagination contract is trusted.
pub async fn fetch_all_issues(
    source: &dyn IssuePageSource,
    owner: &str,
    repo: &str,
) -> Result<Vec<IssueRecord>> {
    let mut issues = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0u32;

    loop {
        let page = source.fetch_page(owner, repo, cursor.as_deref()).await?;
        pages += 1;
        debug!(page = pages, count = page.nodes.len(), "Fetched issue page");

        issues.extend(page.nodes);

        if !page.page_info.has_next_page {
            break;
        }
        cursor = page.page_info.end_cursor;
    }

    info!(owner, repo, pages, issues = issues.len(), "Issue fetch complete");
    Ok(issues)
}

// ── HTTP Client ─────────────────────────────────────────────────────

/// GraphQL client for the GitHub API.
#[derive(Debug)]
pub struct GitHubClient {
    client: Client,
    token: String,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: String) -> Self {
        Self {
            client: Client::new(),
            token,
            base_url: "https://api.github.com".to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

#[async_trait]
impl IssuePageSource for GitHubClient {
    async fn fetch_page(
        &self,
        owner: &str,
        repo: &str,
        cursor: Option<&str>,
    ) -> Result<IssuePage> {
        let url = format!("{}/graphql", self.base_url);
        let body = json!({
            "query": ISSUE_QUERY,
            "variables": { "owner": owner, "repo": repo, "cursor": cursor },
        });

        debug!(owner, repo, cursor = ?cursor, "GitHub GraphQL request");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Transport {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            }
            .into());
        }

        let parsed: GraphQlResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        if let Some(errors) = parsed.errors {
            if let Some(first) = errors.into_iter().next() {
                return Err(FetchError::Query(first.message).into());
            }
        }

        parsed
            .data
            .and_then(|d| d.repository)
            .map(|r| r.issues)
            .ok_or_else(|| FetchError::Parse("repository missing from response".to_string()).into())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
