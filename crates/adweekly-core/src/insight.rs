//! Rule-based insight generation.
//!
//! A fixed, ordered list of independent threshold checks over the immutable
//! period summary and audience breakdowns. Each triggered rule emits one
//! observation → implication → recommended-action triple; untriggered rules
//! emit nothing. Rules never mutate their inputs, so new rules can be added
//! without touching the aggregation logic.

use serde::{Deserialize, Serialize};

use crate::aggregate::{AudienceBreakdown, PeriodSummary, SegmentMetrics};

/// One qualitative finding for the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub observation: String,
    pub implication: String,
    pub action: String,
}

/// Trigger thresholds for the rule set. Shares are fractions of the
/// dimension's total spend.
#[derive(Debug, Clone)]
pub struct InsightThresholds {
    /// CTR above this (percent) reads as strong creative/targeting.
    pub strong_ctr: f64,
    /// CTR below this (percent) reads as creative fatigue.
    pub weak_ctr: f64,
    /// Top age bucket share of age spend above this triggers a warning.
    pub age_concentration_share: f64,
    /// Gap between the largest and smallest gender spend share.
    pub gender_skew_share: f64,
    /// Top region share of region spend above this triggers a suggestion.
    pub region_concentration_share: f64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            strong_ctr: 5.0,
            weak_ctr: 1.0,
            age_concentration_share: 0.40,
            gender_skew_share: 0.30,
            region_concentration_share: 0.50,
        }
    }
}

/// Evaluate every rule in order and collect the triggered triples.
/// Multiple rules may fire in the same run.
pub fn generate(
    summary: &PeriodSummary,
    audience: &AudienceBreakdown,
    thresholds: &InsightThresholds,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    if summary.avg_ctr > thresholds.strong_ctr {
        insights.push(Insight {
            observation: format!(
                "Average CTR of {:.2}% is above the {:.0}% benchmark.",
                summary.avg_ctr, thresholds.strong_ctr
            ),
            implication: "Creative and targeting are resonating with the current audience."
                .to_string(),
            action: "Scale up budget on the top-spending campaigns while performance holds."
                .to_string(),
        });
    }

    if summary.total_impressions > 0 && summary.avg_ctr < thresholds.weak_ctr {
        insights.push(Insight {
            observation: format!(
                "Average CTR of {:.2}% is below the {:.0}% floor.",
                summary.avg_ctr, thresholds.weak_ctr
            ),
            implication: "Ads are being shown but rarely clicked; creative fatigue is likely."
                .to_string(),
            action: "Test new creative variations and tighten audience targeting.".to_string(),
        });
    }

    if summary.total_conversions == 0 && summary.total_spend > 0.0 {
        insights.push(Insight {
            observation: format!(
                "Spend of {:.2} produced zero inbound leads this period.",
                summary.total_spend
            ),
            implication: "Traffic is arriving but not converting into inquiries.".to_string(),
            action: "Diagnose the landing page: load time, form friction, and message match."
                .to_string(),
        });
    }

    if let Some((top, share)) = top_share(&audience.age) {
        if share > thresholds.age_concentration_share {
            insights.push(Insight {
                observation: format!(
                    "Age bucket {} accounts for {:.0}% of audience spend.",
                    top.segment,
                    share * 100.0
                ),
                implication: "Delivery is concentrated in a single age group; results depend heavily on it.".to_string(),
                action: "Review whether the concentration is intentional and test adjacent age buckets.".to_string(),
            });
        }
    }

    if let Some(skew) = gender_skew(&audience.gender) {
        if skew > thresholds.gender_skew_share {
            insights.push(Insight {
                observation: format!(
                    "Gender spend split is skewed by {:.0} percentage points.",
                    skew * 100.0
                ),
                implication: "One gender segment dominates delivery.".to_string(),
                action: "Consider dedicated creative for the underserved segment to expand the market.".to_string(),
            });
        }
    }

    if let Some((top, share)) = top_share(&audience.region) {
        if share > thresholds.region_concentration_share {
            insights.push(Insight {
                observation: format!(
                    "{} alone receives {:.0}% of regional spend.",
                    top.segment,
                    share * 100.0
                ),
                implication: "Regional reach is narrow; a single market drives the results."
                    .to_string(),
                action: "Trial campaigns in secondary regions to diversify the pipeline."
                    .to_string(),
            });
        }
    }

    insights
}

/// Share of the dimension's total spend held by its top segment.
/// The lists arrive sorted descending by spend, so the top is index 0.
fn top_share(segments: &[SegmentMetrics]) -> Option<(&SegmentMetrics, f64)> {
    let total: f64 = segments.iter().map(|s| s.spend).sum();
    if total <= 0.0 {
        return None;
    }
    segments.first().map(|top| (top, top.spend / total))
}

/// Gap between the largest and smallest gender spend shares.
/// Needs at least two segments with any spend to be meaningful.
fn gender_skew(segments: &[SegmentMetrics]) -> Option<f64> {
    if segments.len() < 2 {
        return None;
    }
    let total: f64 = segments.iter().map(|s| s.spend).sum();
    if total <= 0.0 {
        return None;
    }
    let max = segments.iter().map(|s| s.spend).fold(f64::MIN, f64::max);
    let min = segments.iter().map(|s| s.spend).fold(f64::MAX, f64::min);
    Some((max - min) / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(name: &str, spend: f64) -> SegmentMetrics {
        SegmentMetrics {
            segment: name.to_string(),
            spend,
            ..SegmentMetrics::default()
        }
    }

    fn summary(ctr: f64, spend: f64, conversions: i64, impressions: i64) -> PeriodSummary {
        PeriodSummary {
            avg_ctr: ctr,
            total_spend: spend,
            total_conversions: conversions,
            total_impressions: impressions,
            ..PeriodSummary::default()
        }
    }

    #[test]
    fn strong_ctr_triggers_scale_up() {
        let insights = generate(
            &summary(6.2, 100.0, 5, 10_000),
            &AudienceBreakdown::default(),
            &InsightThresholds::default(),
        );
        assert_eq!(insights.len(), 1);
        assert!(insights[0].action.contains("Scale up"));
    }

    #[test]
    fn weak_ctr_requires_impressions() {
        let thresholds = InsightThresholds::default();
        let fired = generate(
            &summary(0.4, 100.0, 5, 10_000),
            &AudienceBreakdown::default(),
            &thresholds,
        );
        assert!(fired[0].action.contains("new creative"));

        // Zero impressions means CTR 0 by defaulting, not weak creative.
        let silent = generate(
            &summary(0.0, 0.0, 5, 0),
            &AudienceBreakdown::default(),
            &thresholds,
        );
        assert!(silent.is_empty());
    }

    #[test]
    fn zero_conversions_with_spend_flags_the_landing_page() {
        let insights = generate(
            &summary(2.0, 250.0, 0, 10_000),
            &AudienceBreakdown::default(),
            &InsightThresholds::default(),
        );
        assert_eq!(insights.len(), 1);
        assert!(insights[0].action.contains("landing page"));
    }

    #[test]
    fn audience_concentration_rules_fire_independently() {
        let audience = AudienceBreakdown {
            age: vec![segment("25-34", 80.0), segment("35-44", 20.0)],
            gender: vec![segment("female", 70.0), segment("male", 30.0)],
            region: vec![segment("Seoul", 90.0), segment("Busan", 10.0)],
        };
        let insights = generate(
            &summary(2.0, 100.0, 3, 10_000),
            &audience,
            &InsightThresholds::default(),
        );
        assert_eq!(insights.len(), 3);
        assert!(insights[0].observation.contains("25-34"));
        assert!(insights[1].observation.contains("40 percentage points"));
        assert!(insights[2].observation.contains("Seoul"));
    }

    #[test]
    fn multiple_rules_fire_in_declaration_order() {
        let audience = AudienceBreakdown {
            region: vec![segment("Seoul", 100.0)],
            ..AudienceBreakdown::default()
        };
        let insights = generate(
            &summary(7.0, 500.0, 0, 10_000),
            &audience,
            &InsightThresholds::default(),
        );
        // strong CTR, zero conversions, region concentration.
        assert_eq!(insights.len(), 3);
        assert!(insights[0].observation.contains("CTR"));
        assert!(insights[1].observation.contains("zero inbound leads"));
        assert!(insights[2].observation.contains("Seoul"));
    }

    #[test]
    fn balanced_breakdowns_stay_silent() {
        let audience = AudienceBreakdown {
            age: vec![
                segment("18-24", 30.0),
                segment("25-34", 35.0),
                segment("35-44", 35.0),
            ],
            gender: vec![segment("female", 55.0), segment("male", 45.0)],
            region: vec![segment("Seoul", 40.0), segment("Busan", 60.0)],
        };
        let insights = generate(
            &summary(2.5, 100.0, 4, 10_000),
            &audience,
            &InsightThresholds::default(),
        );
        assert!(insights.is_empty());
    }
}
