//! External-service seams and their HTTP implementations.
//!
//! Each collaborator is a trait so the publisher and orchestrator can be
//! exercised against in-memory fakes; the production implementations are
//! thin `reqwest` adapters constructed from the explicit [`Config`]
//! (never from ambient environment state).
//!
//! [`Config`]: adweekly_core::config::Config

pub mod ads;
pub mod docstore;
pub mod leads;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use adweekly_core::record::{AdsPayload, DateRange, LeadBatch};

use crate::error::{PipelineError, Result};

/// API version header the document store requires on every request.
pub(crate) const DOCSTORE_VERSION: &str = "2022-06-28";

/// Reference to a published report page in the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub id: String,
    pub url: String,
}

/// Advertising-insights source: campaign-level insights plus the three
/// audience breakdown queries for one reporting window.
#[async_trait]
pub trait AdsSource: Send + Sync {
    async fn fetch_insights(&self, range: &DateRange) -> Result<AdsPayload>;
}

/// Independent conversion source: ground-truth inbound inquiries.
#[async_trait]
pub trait LeadSource: Send + Sync {
    async fn fetch_leads(&self, range: &DateRange) -> Result<LeadBatch>;
}

/// Destination document store. No delete/replace-content operation exists,
/// which is why the update branch of the publisher appends.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Page id of the document whose title exactly matches `title`, if any.
    async fn find_report(&self, title: &str) -> Result<Option<String>>;
    async fn create_report(&self, properties: Value, blocks: Vec<Value>) -> Result<PageRef>;
    async fn update_properties(&self, page_id: &str, properties: Value) -> Result<()>;
    async fn append_blocks(&self, page_id: &str, blocks: Vec<Value>) -> Result<()>;
}

/// Shared HTTP client: rustls, bounded timeouts, no redirects. One instance
/// is cloned into every adapter (reqwest clients are cheap handles).
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| PipelineError::api("http", format!("client build failed: {e}")))
}

/// Map a non-success response to a transient API error carrying the status
/// and a truncated body snippet for the logs.
pub(crate) async fn error_for_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(PipelineError::Api {
        service,
        message: format!("status {status}: {snippet}"),
    })
}
