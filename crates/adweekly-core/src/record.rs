use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inclusive reporting window, serialized as `{"since": "...", "until": "..."}`
/// to match the upstream insights API's `time_range` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl DateRange {
    /// The last `days` days ending at `until` (the default lookback is 7).
    pub fn last_days(until: NaiveDate, days: i64) -> Self {
        Self {
            since: until - Duration::days(days),
            until,
        }
    }
}

/// One campaign's insight payload as returned by the advertising API.
///
/// Numeric fields arrive as JSON strings ("1234", "56.78"), sometimes as
/// numbers, and are omitted freely, so they are kept as raw [`Value`]s and
/// coerced at the point of use; nothing here is trusted to be well-typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCampaignRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impressions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clicks: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spend: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reach: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpm: Option<Value>,
    /// Typed event counts, e.g. `[{"action_type": "lead", "value": "5"}]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Value>,
    /// Typed monetary values, same shape as `actions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_values: Option<Value>,
}

/// One audience segment's payload for a single breakdown dimension.
/// Exactly one of `age`/`gender`/`region` is present depending on which
/// breakdown query produced the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAudienceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impressions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clicks: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spend: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Value>,
}

/// Raw audience records grouped by breakdown dimension, one query each.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAudienceSet {
    #[serde(default)]
    pub age: Vec<RawAudienceRecord>,
    #[serde(default)]
    pub gender: Vec<RawAudienceRecord>,
    #[serde(default)]
    pub region: Vec<RawAudienceRecord>,
}

/// Everything the ads fetch step produces for one reporting window.
/// Immutable once fetched; consumed read-only downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdsPayload {
    pub collected_at: DateTime<Utc>,
    pub date_range: DateRange,
    pub ad_account_id: String,
    pub campaigns: Vec<RawCampaignRecord>,
    pub audience: RawAudienceSet,
}

impl AdsPayload {
    /// True when neither campaign nor audience queries returned any rows.
    /// The window is still valid; the report just carries all-zero totals.
    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
            && self.audience.age.is_empty()
            && self.audience.gender.is_empty()
            && self.audience.region.is_empty()
    }
}

/// One inbound inquiry pulled from the independent lead database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub page_id: String,
}

/// The ground-truth conversion signal for the window. Only `total_leads`
/// feeds the metrics; the individual records are kept for the audit snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadBatch {
    pub collected_at: DateTime<Utc>,
    pub date_range: DateRange,
    pub total_leads: i64,
    pub leads: Vec<LeadRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_days_spans_the_lookback() {
        let until = NaiveDate::from_ymd_opt(2026, 8, 28).expect("valid date");
        let range = DateRange::last_days(until, 7);
        assert_eq!(
            range.since,
            NaiveDate::from_ymd_opt(2026, 8, 21).expect("valid date")
        );
        assert_eq!(range.until, until);
    }

    #[test]
    fn campaign_record_tolerates_sparse_and_mixed_payloads() {
        let raw: RawCampaignRecord = serde_json::from_str(
            r#"{"campaign_id": "c1", "impressions": "1000", "spend": 12.5, "unknown_field": true}"#,
        )
        .expect("deserialize");
        assert_eq!(raw.campaign_id.as_deref(), Some("c1"));
        assert!(raw.clicks.is_none());
        assert!(raw.actions.is_none());
    }

    #[test]
    fn empty_payload_is_detected() {
        let payload = AdsPayload {
            collected_at: Utc::now(),
            date_range: DateRange::last_days(
                NaiveDate::from_ymd_opt(2026, 8, 28).expect("valid date"),
                7,
            ),
            ad_account_id: "act_1".into(),
            campaigns: vec![],
            audience: RawAudienceSet::default(),
        };
        assert!(payload.is_empty());
    }
}
