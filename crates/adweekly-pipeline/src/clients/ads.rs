//! Graph-style advertising-insights API adapter.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use adweekly_core::record::{
    AdsPayload, DateRange, RawAudienceRecord, RawAudienceSet, RawCampaignRecord,
};

use crate::error::{PipelineError, Result};

use super::{error_for_status, AdsSource};

const CAMPAIGN_FIELDS: &str =
    "campaign_id,campaign_name,impressions,clicks,spend,reach,frequency,cpc,cpm,ctr,actions,action_values";
const AUDIENCE_FIELDS: &str = "impressions,clicks,spend,actions";
const PAGE_LIMIT: u32 = 500;

/// Paged envelope every insights endpoint returns.
#[derive(Debug, Deserialize)]
struct InsightsPage<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Default, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

pub struct AdsInsightsClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    account_id: String,
}

impl AdsInsightsClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            account_id: account_id.into(),
        }
    }

    /// Fetch one insights query, following `paging.next` until exhausted.
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        range: &DateRange,
        level: &str,
        fields: &str,
        breakdown: Option<&str>,
    ) -> Result<Vec<T>> {
        let time_range = json!({
            "since": range.since.to_string(),
            "until": range.until.to_string(),
        })
        .to_string();
        let limit = PAGE_LIMIT.to_string();

        let mut query: Vec<(&str, &str)> = vec![
            ("access_token", self.access_token.as_str()),
            ("level", level),
            ("fields", fields),
            ("time_range", time_range.as_str()),
            ("limit", limit.as_str()),
        ];
        if let Some(dimension) = breakdown {
            query.push(("breakdowns", dimension));
        }

        let url = format!("{}/{}/insights", self.base_url, self.account_id);
        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| PipelineError::api("ads", e))?;
        let mut page: InsightsPage<T> = error_for_status("ads", response)
            .await?
            .json()
            .await
            .map_err(|e| PipelineError::api("ads", format!("malformed response: {e}")))?;

        let mut records = std::mem::take(&mut page.data);
        // `paging.next` is an absolute URL that already carries the token.
        while let Some(next) = page.paging.and_then(|p| p.next) {
            let response = self
                .http
                .get(&next)
                .send()
                .await
                .map_err(|e| PipelineError::api("ads", e))?;
            page = error_for_status("ads", response)
                .await?
                .json()
                .await
                .map_err(|e| PipelineError::api("ads", format!("malformed response: {e}")))?;
            records.append(&mut page.data);
        }
        Ok(records)
    }

    async fn fetch_breakdown(
        &self,
        range: &DateRange,
        dimension: &str,
    ) -> Result<Vec<RawAudienceRecord>> {
        self.fetch_all(range, "account", AUDIENCE_FIELDS, Some(dimension))
            .await
    }
}

#[async_trait::async_trait]
impl AdsSource for AdsInsightsClient {
    async fn fetch_insights(&self, range: &DateRange) -> Result<AdsPayload> {
        info!(
            account_id = %self.account_id,
            since = %range.since,
            until = %range.until,
            "fetching campaign insights"
        );
        let campaigns: Vec<RawCampaignRecord> = self
            .fetch_all(range, "campaign", CAMPAIGN_FIELDS, None)
            .await?;
        info!(count = campaigns.len(), "campaign insights fetched");

        let audience = RawAudienceSet {
            age: self.fetch_breakdown(range, "age").await?,
            gender: self.fetch_breakdown(range, "gender").await?,
            region: self.fetch_breakdown(range, "region").await?,
        };
        info!(
            age = audience.age.len(),
            gender = audience.gender.len(),
            region = audience.region.len(),
            "audience breakdowns fetched"
        );

        Ok(AdsPayload {
            collected_at: Utc::now(),
            date_range: *range,
            ad_account_id: self.account_id.clone(),
            campaigns,
            audience,
        })
    }
}
