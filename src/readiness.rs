// file: src/readiness.rs
// version: 1.0.0
// guid: 34d33502-d462-46c6-a24f-bf7f919046de

//! HTTP readiness probe against the deployed API's `/health` endpoint

use crate::error::{DeployError, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Body returned by `GET /health`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub uptime_seconds: Option<u64>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Issue a single GET; no retries
pub async fn probe(url: &str, timeout: Duration) -> Result<HealthReport> {
    debug!("Probing {}", url);

    // The service runs on this host; system proxies must not intercept it
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .no_proxy()
        .build()?;
    let response = client.get(url).send().await.map_err(|e| {
        DeployError::readiness(format!("{} did not respond: {}", url, e))
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DeployError::readiness(format!(
            "{} returned HTTP {}",
            url, status
        )));
    }

    let body = response.text().await?;
    let report: HealthReport = serde_json::from_str(&body).map_err(|e| {
        DeployError::readiness(format!(
            "{} returned an unexpected body ({}): {}",
            url,
            e,
            body.chars().take(120).collect::<String>()
        ))
    })?;

    if !report.is_healthy() {
        return Err(DeployError::readiness(format!(
            "{} reported status '{}'",
            url, report.status
        )));
    }

    info!("Health endpoint {} reports healthy", url);
    Ok(report)
}
