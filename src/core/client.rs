use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::core::auth::{resolve_session, SessionCredentials};
use crate::core::config::ApiConfig;
use crate::core::models::usage::{Organization, Snapshot, UsageReport, UsageWindow};

/// Reasons a fetch produced no usable snapshot. All of them end up as the
/// same error badge; the distinction is for logs.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No organization available for this session")]
    NoOrganization,
    #[error("No usage data returned for organization {0}")]
    NoUsageData(String),
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Endpoint must use HTTPS, got: {0}")]
    InsecureEndpoint(String),
}

/// Validate that a resolved endpoint URL uses HTTPS before credentials are
/// sent to it.
pub fn validate_endpoint(url: &str) -> Result<(), FetchError> {
    if !url.starts_with("https://") {
        return Err(FetchError::InsecureEndpoint(url.to_string()));
    }
    Ok(())
}

#[derive(Deserialize)]
struct OrganizationRaw {
    uuid: String,
    name: Option<String>,
    rate_limit_tier: Option<String>,
}

#[derive(Deserialize)]
struct UsageWindowRaw {
    utilization: Option<f64>,
    resets_at: Option<String>,
}

#[derive(Deserialize)]
struct UsageResponse {
    five_hour: Option<UsageWindowRaw>,
    seven_day: Option<UsageWindowRaw>,
    seven_day_sonnet: Option<UsageWindowRaw>,
    seven_day_opus: Option<UsageWindowRaw>,
}

fn parse_window(raw: UsageWindowRaw) -> UsageWindow {
    let resets_at = raw
        .resets_at
        .as_deref()
        .and_then(|s| s.parse::<DateTime<Utc>>().ok());
    UsageWindow {
        utilization: raw.utilization.unwrap_or(0.0),
        resets_at,
    }
}

fn parse_organizations(body: &str) -> Result<Option<Organization>, FetchError> {
    let orgs: Option<Vec<OrganizationRaw>> =
        serde_json::from_str(body).map_err(|source| FetchError::Parse {
            what: "organizations",
            source,
        })?;
    Ok(orgs.and_then(|orgs| orgs.into_iter().next()).map(|raw| Organization {
        uuid: raw.uuid,
        name: raw.name,
        rate_limit_tier: raw.rate_limit_tier,
    }))
}

fn parse_usage(body: &str) -> Result<Option<UsageReport>, FetchError> {
    let data: Option<UsageResponse> =
        serde_json::from_str(body).map_err(|source| FetchError::Parse {
            what: "usage",
            source,
        })?;
    Ok(data.map(|data| UsageReport {
        five_hour: data.five_hour.map(parse_window),
        seven_day: data.seven_day.map(parse_window),
        seven_day_sonnet: data.seven_day_sonnet.map(parse_window),
        seven_day_opus: data.seven_day_opus.map(parse_window),
    }))
}

/// Where snapshots come from. The monitor only depends on this seam.
pub trait UsageSource: Send + Sync {
    fn fetch_snapshot(
        &self,
    ) -> impl std::future::Future<Output = Result<Snapshot, FetchError>> + Send;
}

/// HTTP client for the organizations and usage endpoints.
pub struct UsageClient {
    http: reqwest::Client,
    base_url: String,
    credentials: SessionCredentials,
}

impl UsageClient {
    pub fn new(
        base_url: &str,
        credentials: SessionCredentials,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        validate_endpoint(base_url)?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Client for the configured API, with the session key resolved from the
    /// environment or the config file.
    pub fn from_config(api: &ApiConfig) -> anyhow::Result<Self> {
        let credentials = resolve_session(api)?;
        let client = Self::new(
            &api.base_url,
            credentials,
            Duration::from_secs(api.timeout_secs),
        )?;
        Ok(client)
    }

    async fn get(&self, path: &str) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .header("Cookie", self.credentials.cookie_header())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.text().await?)
    }

    /// First organization visible to the session.
    pub async fn organization(&self) -> Result<Organization, FetchError> {
        let body = self.get("/organizations").await?;
        parse_organizations(&body)?.ok_or(FetchError::NoOrganization)
    }

    pub async fn usage(&self, org_uuid: &str) -> Result<UsageReport, FetchError> {
        let body = self
            .get(&format!("/organizations/{}/usage", org_uuid))
            .await?;
        parse_usage(&body)?.ok_or_else(|| FetchError::NoUsageData(org_uuid.to_string()))
    }
}

impl UsageSource for UsageClient {
    async fn fetch_snapshot(&self) -> Result<Snapshot, FetchError> {
        let org = self.organization().await?;
        let usage = self.usage(&org.uuid).await?;
        Ok(Snapshot {
            org,
            usage,
            last_updated: Utc::now(),
        })
    }
}
