//! Inbound-lead source: queries the collaborative store's leads database
//! for inquiries created inside the reporting window. Only the count feeds
//! the metrics; the records themselves go to the audit snapshot.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use adweekly_core::record::{DateRange, LeadBatch, LeadRecord};

use crate::error::{PipelineError, Result};

use super::{error_for_status, LeadSource, DOCSTORE_VERSION};

pub struct LeadsClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    database_id: String,
}

impl LeadsClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        database_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            database_id: database_id.into(),
        }
    }

    async fn query_page(&self, filter: &Value, cursor: Option<&str>) -> Result<Value> {
        let mut body = json!({ "filter": filter });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }
        let url = format!("{}/databases/{}/query", self.base_url, self.database_id);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", DOCSTORE_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::api("leads", e))?;
        error_for_status("leads", response)
            .await?
            .json()
            .await
            .map_err(|e| PipelineError::api("leads", format!("malformed response: {e}")))
    }
}

#[async_trait::async_trait]
impl LeadSource for LeadsClient {
    async fn fetch_leads(&self, range: &DateRange) -> Result<LeadBatch> {
        info!(since = %range.since, until = %range.until, "fetching inbound leads");

        let filter = json!({
            "and": [
                { "property": "Created At",
                  "created_time": { "on_or_after": format!("{}T00:00:00Z", range.since) } },
                { "property": "Created At",
                  "created_time": { "on_or_before": format!("{}T23:59:59Z", range.until) } },
            ]
        });

        let mut leads = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.query_page(&filter, cursor.as_deref()).await?;
            if let Some(results) = page["results"].as_array() {
                leads.extend(results.iter().map(lead_from_page));
            }
            if !page["has_more"].as_bool().unwrap_or(false) {
                break;
            }
            cursor = page["next_cursor"].as_str().map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }

        info!(count = leads.len(), "inbound leads fetched");
        Ok(LeadBatch {
            collected_at: Utc::now(),
            date_range: *range,
            total_leads: leads.len() as i64,
            leads,
        })
    }
}

/// Pull the fields we keep out of one lead page. Every property is optional
/// in practice, so missing pieces become empty strings rather than errors.
fn lead_from_page(page: &Value) -> LeadRecord {
    let props = &page["properties"];
    LeadRecord {
        name: props["Name"]["title"][0]["text"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        company: props["Company"]["rich_text"][0]["text"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        email: props["Email"]["email"].as_str().unwrap_or_default().to_string(),
        created_at: props["Created At"]["created_time"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        page_id: page["id"].as_str().unwrap_or_default().to_string(),
    }
}
