use std::time::Duration;

use crate::insight::InsightThresholds;

/// Runtime configuration, loaded once at startup from environment variables
/// and passed explicitly into every adapter and the orchestrator. Nothing
/// outside [`Config::from_env`] reads ambient process state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Advertising-insights API access token.
    pub ads_token: String,
    /// Ad account identifier, e.g. `act_1234567890`.
    pub ad_account_id: String,
    /// Base URL of the insights API. Overridable for tests.
    pub ads_api_base: String,
    /// Document-store integration token.
    pub docstore_token: String,
    /// Base URL of the document-store API. Overridable for tests.
    pub docstore_api_base: String,
    /// Database holding the weekly report pages.
    pub reports_database_id: String,
    /// Database holding the inbound-lead records.
    pub leads_database_id: String,
    /// Optional alerting webhook; alerts are skipped with a warning if unset.
    pub alert_webhook_url: Option<String>,
    pub lookback_days: i64,
    /// Assumed value of one inbound lead, used for the reconciled
    /// conversion-value total.
    pub avg_lead_value: f64,
    /// Total attempts per pipeline step.
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    /// Directory for date-stamped audit snapshots.
    pub data_dir: String,
    pub report_mode: ReportMode,
    pub insight_thresholds: InsightThresholds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportMode {
    /// One account-level document per reporting week.
    Weekly,
    /// The weekly document plus one document per campaign per week.
    PerCampaign,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            ads_token: required("ADWEEKLY_ADS_TOKEN")?,
            ad_account_id: required("ADWEEKLY_AD_ACCOUNT_ID")?,
            ads_api_base: std::env::var("ADWEEKLY_ADS_API_BASE")
                .unwrap_or_else(|_| "https://graph.facebook.com/v19.0".to_string()),
            docstore_token: required("ADWEEKLY_DOCSTORE_TOKEN")?,
            docstore_api_base: std::env::var("ADWEEKLY_DOCSTORE_API_BASE")
                .unwrap_or_else(|_| "https://api.notion.com/v1".to_string()),
            reports_database_id: required("ADWEEKLY_REPORTS_DB_ID")?,
            leads_database_id: required("ADWEEKLY_LEADS_DB_ID")?,
            alert_webhook_url: std::env::var("ADWEEKLY_ALERT_WEBHOOK_URL").ok(),
            lookback_days: std::env::var("ADWEEKLY_LOOKBACK_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .map_err(|e| format!("invalid ADWEEKLY_LOOKBACK_DAYS: {e}"))?,
            avg_lead_value: std::env::var("ADWEEKLY_AVG_LEAD_VALUE")
                .unwrap_or_else(|_| "500.0".to_string())
                .parse()
                .map_err(|e| format!("invalid ADWEEKLY_AVG_LEAD_VALUE: {e}"))?,
            max_retries: std::env::var("ADWEEKLY_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|e| format!("invalid ADWEEKLY_MAX_RETRIES: {e}"))?,
            retry_delay_secs: std::env::var("ADWEEKLY_RETRY_DELAY_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|e| format!("invalid ADWEEKLY_RETRY_DELAY_SECS: {e}"))?,
            data_dir: std::env::var("ADWEEKLY_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            report_mode: {
                let raw =
                    std::env::var("ADWEEKLY_REPORT_MODE").unwrap_or_else(|_| "weekly".to_string());
                match raw.as_str() {
                    "per-campaign" => ReportMode::PerCampaign,
                    _ => ReportMode::Weekly,
                }
            },
            insight_thresholds: {
                let mut thresholds = InsightThresholds::default();
                if let Ok(raw) = std::env::var("ADWEEKLY_AGE_CONCENTRATION_SHARE") {
                    thresholds.age_concentration_share = raw
                        .parse()
                        .map_err(|e| format!("invalid ADWEEKLY_AGE_CONCENTRATION_SHARE: {e}"))?;
                }
                thresholds
            },
        })
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

fn required(name: &str) -> Result<String, String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("{name} must be set"))
}
