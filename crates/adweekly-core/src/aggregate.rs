//! Period-level aggregation: the campaign fold and the audience fold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::insight::{self, Insight, InsightThresholds};
use crate::metrics::{coerce_float, coerce_int, round2, CanonicalMetrics};
use crate::record::{AdsPayload, DateRange, LeadBatch, RawAudienceRecord};

/// One reporting window's summary.
///
/// `total_conversions` is deliberately NOT the sum of per-campaign
/// conversions: platform-reported conversion events are an unreliable proxy,
/// so the true signal is the independently sourced inbound-lead count, and
/// `total_conversion_value` is that count times the configured average lead
/// value. Period-scale `avg_cpa`/`roas` are computed from the reconciled
/// totals, not the platform ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub total_spend: f64,
    pub total_impressions: i64,
    pub total_clicks: i64,
    pub total_conversions: i64,
    pub total_conversion_value: f64,
    pub avg_cpc: f64,
    pub avg_ctr: f64,
    pub avg_cpa: f64,
    pub roas: f64,
    pub campaign_count: usize,
}

impl PeriodSummary {
    pub fn from_campaigns(
        campaigns: &[CanonicalMetrics],
        lead_count: i64,
        avg_lead_value: f64,
    ) -> Self {
        let total_spend: f64 = campaigns.iter().map(|c| c.spend).sum();
        let total_impressions: i64 = campaigns.iter().map(|c| c.impressions).sum();
        let total_clicks: i64 = campaigns.iter().map(|c| c.clicks).sum();

        let total_conversions = lead_count;
        let total_conversion_value = lead_count as f64 * avg_lead_value;

        let avg_cpc = if total_clicks > 0 {
            total_spend / total_clicks as f64
        } else {
            0.0
        };
        let avg_ctr = if total_impressions > 0 {
            total_clicks as f64 / total_impressions as f64 * 100.0
        } else {
            0.0
        };
        let avg_cpa = if total_conversions > 0 {
            total_spend / total_conversions as f64
        } else {
            0.0
        };
        let roas = if total_spend > 0.0 {
            total_conversion_value / total_spend
        } else {
            0.0
        };

        Self {
            total_spend: round2(total_spend),
            total_impressions,
            total_clicks,
            total_conversions,
            total_conversion_value: round2(total_conversion_value),
            avg_cpc: round2(avg_cpc),
            avg_ctr: round2(avg_ctr),
            avg_cpa: round2(avg_cpa),
            roas: round2(roas),
            campaign_count: campaigns.len(),
        }
    }
}

/// One normalized audience segment row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentMetrics {
    pub segment: String,
    pub impressions: i64,
    pub clicks: i64,
    pub spend: f64,
}

/// Per-dimension audience breakdowns, each independently sorted descending
/// by spend (stable, so equal-spend segments keep their input order).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudienceBreakdown {
    pub age: Vec<SegmentMetrics>,
    pub gender: Vec<SegmentMetrics>,
    pub region: Vec<SegmentMetrics>,
}

impl AudienceBreakdown {
    pub fn from_raw(audience: &crate::record::RawAudienceSet) -> Self {
        Self {
            age: normalize_dimension(&audience.age, |r| r.age.as_deref()),
            gender: normalize_dimension(&audience.gender, |r| r.gender.as_deref()),
            region: normalize_dimension(&audience.region, |r| r.region.as_deref()),
        }
    }
}

fn normalize_dimension<F>(records: &[RawAudienceRecord], label: F) -> Vec<SegmentMetrics>
where
    F: Fn(&RawAudienceRecord) -> Option<&str>,
{
    let mut segments: Vec<SegmentMetrics> = records
        .iter()
        .map(|r| SegmentMetrics {
            segment: label(r).unwrap_or("Unknown").to_string(),
            impressions: coerce_int(r.impressions.as_ref(), 0),
            clicks: coerce_int(r.clicks.as_ref(), 0),
            spend: round2(coerce_float(r.spend.as_ref(), 0.0)),
        })
        .collect();
    // Vec::sort_by is stable; ties preserve input order.
    segments.sort_by(|a, b| b.spend.total_cmp(&a.spend));
    segments
}

/// Map every raw campaign to canonical metrics and sort descending by spend.
pub fn canonicalize_campaigns(
    raw: &[crate::record::RawCampaignRecord],
) -> Vec<CanonicalMetrics> {
    let mut campaigns: Vec<CanonicalMetrics> =
        raw.iter().map(CanonicalMetrics::from_raw).collect();
    campaigns.sort_by(|a, b| b.spend.total_cmp(&a.spend));
    campaigns
}

/// The Process step's complete output, handed by value to Publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedReport {
    pub processed_at: DateTime<Utc>,
    pub date_range: DateRange,
    pub ad_account_id: String,
    pub summary: PeriodSummary,
    pub campaigns: Vec<CanonicalMetrics>,
    pub audience: AudienceBreakdown,
    pub insights: Vec<Insight>,
}

/// Fold one window's raw payloads into the processed report: canonical
/// campaign metrics, the reconciled period summary, audience breakdowns,
/// and the triggered insight rules.
pub fn process(
    ads: &AdsPayload,
    leads: &LeadBatch,
    avg_lead_value: f64,
    thresholds: &InsightThresholds,
) -> ProcessedReport {
    let campaigns = canonicalize_campaigns(&ads.campaigns);
    let summary = PeriodSummary::from_campaigns(&campaigns, leads.total_leads, avg_lead_value);
    let audience = AudienceBreakdown::from_raw(&ads.audience);
    let insights = insight::generate(&summary, &audience, thresholds);

    ProcessedReport {
        processed_at: Utc::now(),
        date_range: ads.date_range,
        ad_account_id: ads.ad_account_id.clone(),
        summary,
        campaigns,
        audience,
        insights,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use crate::record::{RawAudienceSet, RawCampaignRecord};

    use super::*;

    fn campaign(name: &str, spend: f64, impressions: i64, clicks: i64) -> CanonicalMetrics {
        CanonicalMetrics {
            campaign_name: Some(name.to_string()),
            spend,
            impressions,
            clicks,
            ..CanonicalMetrics::default()
        }
    }

    #[test]
    fn summary_uses_the_external_lead_count_not_the_platform_fold() {
        let mut a = campaign("a", 300.0, 10_000, 200);
        a.conversions.total = 40; // platform-reported, must be ignored
        let b = campaign("b", 100.0, 10_000, 200);

        let summary = PeriodSummary::from_campaigns(&[a, b], 8, 500.0);
        assert_eq!(summary.total_conversions, 8);
        assert_eq!(summary.total_conversion_value, 4000.0);
        assert_eq!(summary.total_spend, 400.0);
        assert_eq!(summary.avg_cpc, 1.0);
        assert_eq!(summary.avg_ctr, 2.0);
        assert_eq!(summary.avg_cpa, 50.0);
        assert_eq!(summary.roas, 10.0);
        assert_eq!(summary.campaign_count, 2);
    }

    #[test]
    fn summary_with_no_activity_has_no_division_errors() {
        let summary = PeriodSummary::from_campaigns(&[], 0, 500.0);
        assert_eq!(summary.avg_cpc, 0.0);
        assert_eq!(summary.avg_ctr, 0.0);
        assert_eq!(summary.avg_cpa, 0.0);
        assert_eq!(summary.roas, 0.0);
        assert_eq!(summary.campaign_count, 0);
    }

    #[test]
    fn campaigns_sort_descending_by_spend_with_stable_ties() {
        let raw: Vec<RawCampaignRecord> = [
            json!({"campaign_name": "low", "spend": "10"}),
            json!({"campaign_name": "tie-first", "spend": "50"}),
            json!({"campaign_name": "tie-second", "spend": "50"}),
            json!({"campaign_name": "high", "spend": "90"}),
        ]
        .into_iter()
        .map(|v| serde_json::from_value(v).expect("raw record"))
        .collect();

        let sorted = canonicalize_campaigns(&raw);
        let names: Vec<_> = sorted
            .iter()
            .filter_map(|c| c.campaign_name.as_deref())
            .collect();
        assert_eq!(names, ["high", "tie-first", "tie-second", "low"]);
    }

    #[test]
    fn audience_dimensions_sort_independently_and_default_unknown() {
        let audience: RawAudienceSet = serde_json::from_value(json!({
            "age": [
                {"age": "25-34", "spend": "10", "impressions": "100"},
                {"age": "35-44", "spend": "30", "clicks": "5"}
            ],
            "gender": [
                {"spend": "7"},
                {"gender": "female", "spend": "20"}
            ],
            "region": []
        }))
        .expect("raw audience");

        let breakdown = AudienceBreakdown::from_raw(&audience);
        assert_eq!(breakdown.age[0].segment, "35-44");
        assert_eq!(breakdown.age[1].impressions, 100);
        assert_eq!(breakdown.gender[0].segment, "female");
        assert_eq!(breakdown.gender[1].segment, "Unknown");
        assert!(breakdown.region.is_empty());
    }

    #[test]
    fn process_wires_the_full_fold_together() {
        let range = DateRange::last_days(
            NaiveDate::from_ymd_opt(2026, 8, 28).expect("valid date"),
            7,
        );
        let ads = AdsPayload {
            collected_at: Utc::now(),
            date_range: range,
            ad_account_id: "act_42".into(),
            campaigns: vec![serde_json::from_value(json!({
                "campaign_id": "c1",
                "campaign_name": "Brand",
                "impressions": "1000",
                "clicks": "50",
                "spend": "100.0"
            }))
            .expect("raw record")],
            audience: RawAudienceSet::default(),
        };
        let leads = LeadBatch {
            collected_at: Utc::now(),
            date_range: range,
            total_leads: 4,
            leads: vec![],
        };

        let report = process(&ads, &leads, 500.0, &InsightThresholds::default());
        assert_eq!(report.summary.total_conversions, 4);
        assert_eq!(report.summary.total_conversion_value, 2000.0);
        assert_eq!(report.campaigns.len(), 1);
        assert_eq!(report.campaigns[0].ctr, 5.0);
        assert_eq!(report.ad_account_id, "act_42");
    }
}
