//! Prometheus-compatible metric source adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

use crate::errors::{ProxyError, Result};
use crate::history::Sample;

/// One instant-query result: a label set plus its latest sample.
#[derive(Debug, Clone)]
pub struct InstantResult {
    pub labels: HashMap<String, String>,
    pub sample: Sample,
}

/// One range-query result: a label set plus its ordered series of samples.
#[derive(Debug, Clone)]
pub struct RangeResult {
    pub labels: HashMap<String, String>,
    pub samples: Vec<Sample>,
}

/// Boundary to the external time-series source.
///
/// Both operations fail soft: a transport fault, a non-success HTTP status or
/// a non-success payload status is logged and surfaced as an empty result,
/// never as an error the endpoint layer has to handle.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Evaluate an expression at the current instant.
    async fn instant_query(&self, expression: &str) -> Vec<InstantResult>;

    /// Evaluate an expression over `[start, end]` with the given step.
    async fn range_query(
        &self,
        expression: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: &str,
    ) -> Vec<RangeResult>;
}

/// HTTP client for a Prometheus-compatible query API.
pub struct PrometheusClient {
    client: Client,
    base_url: String,
}

impl PrometheusClient {
    /// Create a new client against the given Prometheus base URL.
    pub fn new(base_url: String, http_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(http_timeout)
            .user_agent(format!("status-proxy/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProxyError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn query(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<PromResult>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Querying Prometheus: {} {:?}", url, params);

        let response = self.client.get(&url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::Upstream(format!(
                "Prometheus request failed with status {}",
                status
            )));
        }

        let payload: PromResponse = response.json().await?;
        if payload.status != "success" {
            return Err(ProxyError::Upstream(format!(
                "Prometheus API error: {} - {}",
                payload.error_type.as_deref().unwrap_or("unknown"),
                payload.error.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(payload.data.map(|data| data.result).unwrap_or_default())
    }
}

#[async_trait]
impl MetricSource for PrometheusClient {
    async fn instant_query(&self, expression: &str) -> Vec<InstantResult> {
        match self.query("/api/v1/query", &[("query", expression)]).await {
            Ok(results) => results
                .into_iter()
                .filter_map(|result| {
                    let (timestamp, value) = result.value?;
                    Some(InstantResult {
                        labels: result.metric,
                        sample: Sample {
                            timestamp: timestamp as i64,
                            value,
                        },
                    })
                })
                .collect(),
            Err(e) => {
                error!("Instant query '{}' failed: {}", expression, e);
                Vec::new()
            }
        }
    }

    async fn range_query(
        &self,
        expression: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: &str,
    ) -> Vec<RangeResult> {
        let start = start.to_rfc3339();
        let end = end.to_rfc3339();
        let params = [
            ("query", expression),
            ("start", start.as_str()),
            ("end", end.as_str()),
            ("step", step),
        ];

        match self.query("/api/v1/query_range", &params).await {
            Ok(results) => results
                .into_iter()
                .map(|result| RangeResult {
                    labels: result.metric,
                    samples: result
                        .values
                        .unwrap_or_default()
                        .into_iter()
                        .map(|(timestamp, value)| Sample {
                            timestamp: timestamp as i64,
                            value,
                        })
                        .collect(),
                })
                .collect(),
            Err(e) => {
                error!("Range query '{}' failed: {}", expression, e);
                Vec::new()
            }
        }
    }
}

// Wire shapes of the Prometheus HTTP API.

#[derive(Debug, Deserialize)]
struct PromResponse {
    status: String,
    #[serde(default)]
    data: Option<PromData>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromData {
    #[serde(default)]
    result: Vec<PromResult>,
}

#[derive(Debug, Deserialize)]
struct PromResult {
    #[serde(default)]
    metric: HashMap<String, String>,
    #[serde(default)]
    value: Option<(f64, String)>,
    #[serde(default)]
    values: Option<Vec<(f64, String)>>,
}
