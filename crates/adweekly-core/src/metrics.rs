//! Metric extraction and per-campaign derivation.
//!
//! The upstream API serializes numbers as strings, omits fields, and mixes
//! malformed entries into its action arrays. Every coercion here takes a
//! caller-supplied default and never fails; every derived ratio guards its
//! denominator so a zero-click or zero-spend window produces `0`, not
//! `NaN`/`Infinity`. Ad accounts hit those windows routinely.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::RawCampaignRecord;

/// Coerce a loosely-typed JSON value to an integer count.
/// Numbers are truncated, numeric strings parsed; anything else is `default`.
pub fn coerce_int(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(default)
        }
        _ => default,
    }
}

/// Coerce a loosely-typed JSON value to a float.
pub fn coerce_float(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(default),
        _ => default,
    }
}

/// Round a money/ratio value to 2 decimal places at the point of derivation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Pull the count for the first entry matching `action_type` out of a typed
/// event array. Absent tag, empty or non-array input, and malformed entries
/// all yield `0`.
pub fn extract_action_count(actions: Option<&Value>, action_type: &str) -> i64 {
    extract_tagged(actions, action_type).map_or(0, |v| coerce_int(Some(v), 0))
}

/// Same as [`extract_action_count`] but for monetary action values.
pub fn extract_action_value(action_values: Option<&Value>, action_type: &str) -> f64 {
    extract_tagged(action_values, action_type).map_or(0.0, |v| coerce_float(Some(v), 0.0))
}

fn extract_tagged<'a>(entries: Option<&'a Value>, action_type: &str) -> Option<&'a Value> {
    let items = entries?.as_array()?;
    items
        .iter()
        .find(|item| item.get("action_type").and_then(Value::as_str) == Some(action_type))
        .and_then(|item| item.get("value"))
}

/// Typed conversion event counts; `total = purchase + lead`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversions {
    pub purchase: i64,
    pub lead: i64,
    pub add_to_cart: i64,
    pub link_click: i64,
    pub total: i64,
}

/// Monetary conversion value; `total` is the platform's aggregate
/// ("omni") purchase value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionValue {
    pub purchase: f64,
    pub total: f64,
}

/// The normalized, fully-defaulted per-campaign record every downstream
/// calculation works from. All ratios are finite and non-negative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalMetrics {
    pub campaign_id: Option<String>,
    pub campaign_name: Option<String>,
    pub impressions: i64,
    pub clicks: i64,
    pub spend: f64,
    pub reach: i64,
    pub frequency: f64,
    pub cpm: f64,
    pub cpc: f64,
    pub ctr: f64,
    pub conversions: Conversions,
    pub conversion_value: ConversionValue,
    pub cpa: f64,
    pub roas: f64,
}

impl CanonicalMetrics {
    pub fn from_raw(raw: &RawCampaignRecord) -> Self {
        let impressions = coerce_int(raw.impressions.as_ref(), 0);
        let clicks = coerce_int(raw.clicks.as_ref(), 0);
        let spend = coerce_float(raw.spend.as_ref(), 0.0);

        let purchase = extract_action_count(raw.actions.as_ref(), "purchase");
        let lead = extract_action_count(raw.actions.as_ref(), "lead");
        let add_to_cart = extract_action_count(raw.actions.as_ref(), "add_to_cart");
        let link_click = extract_action_count(raw.actions.as_ref(), "link_click");

        let purchase_value = extract_action_value(raw.action_values.as_ref(), "purchase");
        let total_conversion_value = extract_action_value(raw.action_values.as_ref(), "omni_purchase");

        let total_conversions = purchase + lead;

        let cpc = if clicks > 0 { spend / clicks as f64 } else { 0.0 };
        let ctr = if impressions > 0 {
            clicks as f64 / impressions as f64 * 100.0
        } else {
            0.0
        };
        let cpa = if total_conversions > 0 {
            spend / total_conversions as f64
        } else {
            0.0
        };
        let roas = if spend > 0.0 {
            total_conversion_value / spend
        } else {
            0.0
        };

        Self {
            campaign_id: raw.campaign_id.clone(),
            campaign_name: raw.campaign_name.clone(),
            impressions,
            clicks,
            spend: round2(spend),
            reach: coerce_int(raw.reach.as_ref(), 0),
            frequency: coerce_float(raw.frequency.as_ref(), 0.0),
            cpm: coerce_float(raw.cpm.as_ref(), 0.0),
            cpc: round2(cpc),
            ctr: round2(ctr),
            conversions: Conversions {
                purchase,
                lead,
                add_to_cart,
                link_click,
                total: total_conversions,
            },
            conversion_value: ConversionValue {
                purchase: round2(purchase_value),
                total: round2(total_conversion_value),
            },
            cpa: round2(cpa),
            roas: round2(roas),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(value: Value) -> RawCampaignRecord {
        serde_json::from_value(value).expect("raw campaign record")
    }

    #[test]
    fn coercions_handle_numbers_strings_and_garbage() {
        assert_eq!(coerce_int(Some(&json!("1234")), 0), 1234);
        assert_eq!(coerce_int(Some(&json!(12.9)), 0), 12);
        assert_eq!(coerce_int(Some(&json!("12.9")), 0), 12);
        assert_eq!(coerce_int(Some(&json!("n/a")), 7), 7);
        assert_eq!(coerce_int(Some(&json!(null)), 7), 7);
        assert_eq!(coerce_int(None, 7), 7);

        assert_eq!(coerce_float(Some(&json!("56.78")), 0.0), 56.78);
        assert_eq!(coerce_float(Some(&json!(" 3.5 ")), 0.0), 3.5);
        assert_eq!(coerce_float(Some(&json!([])), 1.5), 1.5);
    }

    #[test]
    fn extractor_takes_first_match_and_skips_malformed_entries() {
        let actions = json!([
            "not-an-object",
            {"value": "9"},
            {"action_type": "lead", "value": "5"},
            {"action_type": "lead", "value": "99"}
        ]);
        assert_eq!(extract_action_count(Some(&actions), "lead"), 5);
        assert_eq!(extract_action_count(Some(&actions), "purchase"), 0);
        assert_eq!(extract_action_count(Some(&json!("oops")), "lead"), 0);
        assert_eq!(extract_action_count(None, "lead"), 0);
        assert_eq!(
            extract_action_value(Some(&json!([{"action_type": "omni_purchase", "value": "120.50"}])), "omni_purchase"),
            120.50
        );
    }

    #[test]
    fn derives_the_reference_scenario() {
        let metrics = CanonicalMetrics::from_raw(&raw(json!({
            "impressions": 1000,
            "clicks": 50,
            "spend": 100.0,
            "actions": [{"action_type": "lead", "value": 5}]
        })));
        assert_eq!(metrics.ctr, 5.0);
        assert_eq!(metrics.cpc, 2.0);
        assert_eq!(metrics.conversions.total, 5);
        assert_eq!(metrics.cpa, 20.0);
    }

    #[test]
    fn zero_denominators_yield_zero_not_errors() {
        let metrics = CanonicalMetrics::from_raw(&raw(json!({
            "campaign_id": "c1",
            "spend": 0,
            "clicks": 0
        })));
        assert_eq!(metrics.cpc, 0.0);
        assert_eq!(metrics.ctr, 0.0);
        assert_eq!(metrics.cpa, 0.0);
        assert_eq!(metrics.roas, 0.0);
        for ratio in [metrics.cpc, metrics.ctr, metrics.cpa, metrics.roas] {
            assert!(ratio.is_finite() && ratio >= 0.0);
        }
    }

    #[test]
    fn missing_fields_default_without_error() {
        let metrics = CanonicalMetrics::from_raw(&RawCampaignRecord::default());
        assert_eq!(metrics.impressions, 0);
        assert_eq!(metrics.clicks, 0);
        assert_eq!(metrics.spend, 0.0);
        assert_eq!(metrics.conversions, Conversions::default());
    }

    #[test]
    fn string_encoded_payload_round_trips_to_numbers() {
        let metrics = CanonicalMetrics::from_raw(&raw(json!({
            "impressions": "2000",
            "clicks": "40",
            "spend": "88.40",
            "reach": "1800",
            "frequency": "1.11",
            "cpm": "44.20",
            "action_values": [{"action_type": "purchase", "value": "353.60"},
                              {"action_type": "omni_purchase", "value": "442.0"}]
        })));
        assert_eq!(metrics.impressions, 2000);
        assert_eq!(metrics.ctr, 2.0);
        assert_eq!(metrics.cpc, 2.21);
        assert_eq!(metrics.conversion_value.purchase, 353.60);
        assert_eq!(metrics.roas, 5.0);
    }
}
