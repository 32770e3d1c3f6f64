//! GitHub-issue incident adapter

use chrono::{DateTime, Utc};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::errors::{ProxyError, Result};

const GITHUB_API_BASE_URL: &str = "https://api.github.com";

/// An incident derived from a labelled GitHub issue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub url: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub labels: Vec<String>,
    pub body: Option<String>,
    /// Taken from a `severity:` or `sev:` prefixed label
    pub severity: Option<String>,
    /// Taken from `service:` prefixed labels
    pub affected_services: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubIssue {
    id: u64,
    number: u64,
    title: String,
    html_url: String,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
    body: Option<String>,
    // Present when the "issue" is actually a pull request
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GitHubLabel {
    name: String,
}

impl Incident {
    fn from_issue(issue: GitHubIssue) -> Self {
        let labels: Vec<String> = issue.labels.into_iter().map(|label| label.name).collect();
        let severity = severity_from_labels(&labels);
        let affected_services = services_from_labels(&labels);

        Self {
            id: issue.id,
            number: issue.number,
            title: issue.title,
            url: issue.html_url,
            state: issue.state,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            closed_at: issue.closed_at,
            labels,
            body: issue.body,
            severity,
            affected_services,
        }
    }
}

/// Severity from the first `severity:` or `sev:` prefixed label.
pub fn severity_from_labels(labels: &[String]) -> Option<String> {
    labels.iter().find_map(|label| {
        strip_prefix_ci(label, "severity:")
            .or_else(|| strip_prefix_ci(label, "sev:"))
            .map(|rest| rest.trim().to_string())
    })
}

/// Affected service ids from `service:` prefixed labels.
pub fn services_from_labels(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .filter_map(|label| strip_prefix_ci(label, "service:").map(|rest| rest.trim().to_string()))
        .collect()
}

fn strip_prefix_ci<'a>(label: &'a str, prefix: &str) -> Option<&'a str> {
    if label.len() >= prefix.len()
        && label.is_char_boundary(prefix.len())
        && label[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&label[prefix.len()..])
    } else {
        None
    }
}

/// Fetches incident issues for the configured repository.
pub struct IncidentFetcher {
    client: Client,
    base_url: String,
    repo: Option<String>,
    token: Option<String>,
    label: String,
    limit: u32,
}

impl IncidentFetcher {
    /// Create a new fetcher. `repo` is `owner/repo`; with no repo configured
    /// the fetcher always answers with an empty list.
    pub fn new(
        repo: Option<String>,
        token: Option<String>,
        label: String,
        limit: u32,
        http_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(http_timeout)
            .user_agent(format!("status-proxy/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProxyError::Http)?;

        Ok(Self {
            client,
            base_url: GITHUB_API_BASE_URL.to_string(),
            repo,
            token,
            label,
            limit,
        })
    }

    /// Point the fetcher at a different API host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch the most recent incident issues, newest first.
    ///
    /// Fails soft: upstream faults are logged and yield an empty list.
    pub async fn fetch_incidents(&self) -> Vec<Incident> {
        let Some(repo) = &self.repo else {
            debug!("No incident repository configured, returning empty incident list");
            return Vec::new();
        };

        match self.fetch_issues(repo).await {
            Ok(issues) => issues
                .into_iter()
                .filter(|issue| issue.pull_request.is_none())
                .map(Incident::from_issue)
                .collect(),
            Err(e) => {
                error!("Failed to fetch incidents from {}: {}", repo, e);
                Vec::new()
            }
        }
    }

    async fn fetch_issues(&self, repo: &str) -> Result<Vec<GitHubIssue>> {
        let url = format!("{}/repos/{}/issues", self.base_url, repo);
        let limit = self.limit.to_string();

        let mut request = self.client.get(&url).query(&[
            ("labels", self.label.as_str()),
            ("state", "all"),
            ("sort", "created"),
            ("direction", "desc"),
            ("per_page", limit.as_str()),
        ]);
        if let Some(token) = &self.token {
            request = request.header(header::AUTHORIZATION, format!("token {}", token));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ProxyError::Upstream(format!(
                "GitHub API returned status {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}
