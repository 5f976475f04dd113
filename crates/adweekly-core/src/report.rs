//! Rendering of a processed week into the document store's page schema:
//! a property set mirroring the period summary plus an ordered list of
//! content blocks (summary callout, top-10 campaign toggles, audience
//! sections, insight callouts).

use serde_json::{json, Value};

use crate::aggregate::{ProcessedReport, SegmentMetrics};
use crate::insight::Insight;
use crate::metrics::CanonicalMetrics;
use crate::record::DateRange;

/// How many campaigns the campaign table shows.
const TOP_CAMPAIGNS: usize = 10;
/// How many segments the age and region sections show.
const TOP_SEGMENTS: usize = 5;

/// A fully rendered document ready for upsert: the canonical title key,
/// the destination property set, and the content blocks in order.
#[derive(Debug, Clone)]
pub struct DocumentDraft {
    pub title: String,
    pub properties: Value,
    pub blocks: Vec<Value>,
}

/// Canonical key for the account-level weekly report.
pub fn week_title(range: &DateRange) -> String {
    format!("Week of {}", range.since)
}

/// Canonical key for a per-campaign report: the week key suffixed with the
/// whitespace-normalized campaign name.
pub fn campaign_title(range: &DateRange, campaign_name: &str) -> String {
    let normalized = campaign_name.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{} — {}", week_title(range), normalized)
}

/// Render the account-level weekly document.
pub fn weekly_document(report: &ProcessedReport) -> DocumentDraft {
    let summary = &report.summary;
    let range = &report.date_range;

    let title = week_title(range);
    let properties = json!({
        "Report": { "title": [{ "text": { "content": title } }] },
        "Week": { "date": { "start": range.since.to_string(), "end": range.until.to_string() } },
        "Total Spend": { "number": summary.total_spend },
        "Total Impressions": { "number": summary.total_impressions },
        "Total Clicks": { "number": summary.total_clicks },
        "Avg CPC": { "number": summary.avg_cpc },
        // Percent-formatted property expects a 0-1 fraction.
        "Avg CTR": { "number": summary.avg_ctr / 100.0 },
        "Total Conversions": { "number": summary.total_conversions },
        "Avg CPA": { "number": summary.avg_cpa },
        "ROAS": { "number": summary.roas },
        "Campaigns": { "number": summary.campaign_count },
        "Status": { "select": { "name": "Complete" } },
    });

    let mut blocks = Vec::new();

    blocks.push(heading_2("Weekly Summary"));
    blocks.push(callout(
        "💰",
        &format!(
            "Total spend: {}\nTotal impressions: {}\nTotal clicks: {}\nAvg CPC: {}\nAvg CTR: {:.2}%\nTotal conversions (leads): {}\nAvg CPA: {}\nROAS: {:.2}",
            fmt_money(summary.total_spend),
            fmt_count(summary.total_impressions),
            fmt_count(summary.total_clicks),
            fmt_money(summary.avg_cpc),
            summary.avg_ctr,
            fmt_count(summary.total_conversions),
            fmt_money(summary.avg_cpa),
            summary.roas,
        ),
    ));

    blocks.push(heading_2("Campaign Performance"));
    for campaign in report.campaigns.iter().take(TOP_CAMPAIGNS) {
        blocks.push(campaign_toggle(campaign));
    }

    blocks.push(heading_2("Audience Insights"));
    blocks.push(heading_3("By Age"));
    blocks.extend(segment_bullets(&report.audience.age, TOP_SEGMENTS));
    blocks.push(heading_3("By Gender"));
    blocks.extend(segment_bullets(&report.audience.gender, usize::MAX));
    blocks.push(heading_3("By Region (Top 5)"));
    blocks.extend(segment_bullets(&report.audience.region, TOP_SEGMENTS));

    if !report.insights.is_empty() {
        blocks.push(heading_2("Insights & Recommendations"));
        for insight in &report.insights {
            blocks.push(insight_callout(insight));
        }
    }

    DocumentDraft {
        title,
        properties,
        blocks,
    }
}

/// Render a per-campaign document for the extended report mode.
pub fn campaign_document(range: &DateRange, campaign: &CanonicalMetrics) -> DocumentDraft {
    let name = campaign.campaign_name.as_deref().unwrap_or("(unnamed)");
    let title = campaign_title(range, name);

    let properties = json!({
        "Report": { "title": [{ "text": { "content": title } }] },
        "Week": { "date": { "start": range.since.to_string(), "end": range.until.to_string() } },
        "Total Spend": { "number": campaign.spend },
        "Total Impressions": { "number": campaign.impressions },
        "Total Clicks": { "number": campaign.clicks },
        "Avg CPC": { "number": campaign.cpc },
        "Avg CTR": { "number": campaign.ctr / 100.0 },
        "Total Conversions": { "number": campaign.conversions.total },
        "Avg CPA": { "number": campaign.cpa },
        "ROAS": { "number": campaign.roas },
        "Campaigns": { "number": 1 },
        "Status": { "select": { "name": "Complete" } },
    });

    let blocks = vec![
        heading_2("Campaign Summary"),
        callout(
            "📣",
            &format!(
                "{name}\nSpend: {} | Impressions: {} | Clicks: {} | CTR: {:.2}%",
                fmt_money(campaign.spend),
                fmt_count(campaign.impressions),
                fmt_count(campaign.clicks),
                campaign.ctr,
            ),
        ),
        bullet(&format!(
            "Conversions: {} purchase / {} lead / {} add-to-cart / {} link-click (total {})",
            campaign.conversions.purchase,
            campaign.conversions.lead,
            campaign.conversions.add_to_cart,
            campaign.conversions.link_click,
            campaign.conversions.total,
        )),
        bullet(&format!(
            "CPC: {} | CPA: {} | ROAS: {:.2} | Conversion value: {}",
            fmt_money(campaign.cpc),
            fmt_money(campaign.cpa),
            campaign.roas,
            fmt_money(campaign.conversion_value.total),
        )),
    ];

    DocumentDraft {
        title,
        properties,
        blocks,
    }
}

fn campaign_toggle(campaign: &CanonicalMetrics) -> Value {
    let name = campaign.campaign_name.as_deref().unwrap_or("(unnamed)");
    json!({
        "object": "block",
        "type": "toggle",
        "toggle": {
            "rich_text": [text(&format!(
                "{name} | Spend: {} | ROAS: {:.2}",
                fmt_money(campaign.spend),
                campaign.roas,
            ))],
            "children": [
                bullet(&format!(
                    "Impressions: {} | Clicks: {} | CTR: {:.2}%",
                    fmt_count(campaign.impressions),
                    fmt_count(campaign.clicks),
                    campaign.ctr,
                )),
                bullet(&format!(
                    "CPC: {} | Conversions: {} | CPA: {}",
                    fmt_money(campaign.cpc),
                    campaign.conversions.total,
                    fmt_money(campaign.cpa),
                )),
            ],
        }
    })
}

fn segment_bullets(segments: &[SegmentMetrics], limit: usize) -> Vec<Value> {
    if segments.is_empty() {
        return vec![bullet("No data for this dimension.")];
    }
    segments
        .iter()
        .take(limit)
        .map(|s| {
            bullet(&format!(
                "{}: spend {} | impressions {} | clicks {}",
                s.segment,
                fmt_money(s.spend),
                fmt_count(s.impressions),
                fmt_count(s.clicks),
            ))
        })
        .collect()
}

fn insight_callout(insight: &Insight) -> Value {
    callout(
        "💡",
        &format!(
            "{}\nWhy it matters: {}\nRecommended action: {}",
            insight.observation, insight.implication, insight.action
        ),
    )
}

fn text(content: &str) -> Value {
    json!({ "type": "text", "text": { "content": content } })
}

fn heading_2(content: &str) -> Value {
    json!({ "object": "block", "type": "heading_2", "heading_2": { "rich_text": [text(content)] } })
}

fn heading_3(content: &str) -> Value {
    json!({ "object": "block", "type": "heading_3", "heading_3": { "rich_text": [text(content)] } })
}

fn bullet(content: &str) -> Value {
    json!({
        "object": "block",
        "type": "bulleted_list_item",
        "bulleted_list_item": { "rich_text": [text(content)] }
    })
}

fn callout(emoji: &str, content: &str) -> Value {
    json!({
        "object": "block",
        "type": "callout",
        "callout": { "icon": { "emoji": emoji }, "rich_text": [text(content)] }
    })
}

/// `$1,234.56`
fn fmt_money(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as i64;
    let whole = group_thousands(cents / 100);
    let frac = cents % 100;
    if negative {
        format!("-${whole}.{frac:02}")
    } else {
        format!("${whole}.{frac:02}")
    }
}

/// `1,234,567`
fn fmt_count(value: i64) -> String {
    if value < 0 {
        format!("-{}", group_thousands(-value))
    } else {
        group_thousands(value)
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use crate::aggregate::{AudienceBreakdown, PeriodSummary};
    use crate::metrics::Conversions;

    use super::*;

    fn range() -> DateRange {
        DateRange::last_days(
            NaiveDate::from_ymd_opt(2026, 8, 28).expect("valid date"),
            7,
        )
    }

    fn campaign(name: &str, spend: f64) -> CanonicalMetrics {
        CanonicalMetrics {
            campaign_name: Some(name.to_string()),
            spend,
            ..CanonicalMetrics::default()
        }
    }

    fn sample_report(campaign_count: usize) -> ProcessedReport {
        let campaigns: Vec<_> = (0..campaign_count)
            .map(|i| campaign(&format!("c{i}"), 100.0 - i as f64))
            .collect();
        ProcessedReport {
            processed_at: Utc::now(),
            date_range: range(),
            ad_account_id: "act_1".into(),
            summary: PeriodSummary {
                total_spend: 1234.5,
                avg_ctr: 2.5,
                campaign_count,
                ..PeriodSummary::default()
            },
            campaigns,
            audience: AudienceBreakdown::default(),
            insights: vec![],
        }
    }

    #[test]
    fn week_titles_are_deterministic_keys() {
        assert_eq!(week_title(&range()), "Week of 2026-08-21");
        assert_eq!(
            campaign_title(&range(), "  Brand   Awareness "),
            "Week of 2026-08-21 — Brand Awareness"
        );
    }

    #[test]
    fn weekly_document_caps_the_campaign_table_at_ten() {
        let draft = weekly_document(&sample_report(14));
        let toggles = draft
            .blocks
            .iter()
            .filter(|b| b["type"] == "toggle")
            .count();
        assert_eq!(toggles, 10);
    }

    #[test]
    fn weekly_properties_mirror_the_summary() {
        let draft = weekly_document(&sample_report(2));
        assert_eq!(draft.properties["Total Spend"]["number"], 1234.5);
        // CTR is stored as a 0-1 fraction for the percent property format.
        assert_eq!(draft.properties["Avg CTR"]["number"], 0.025);
        assert_eq!(draft.properties["Campaigns"]["number"], 2);
        assert_eq!(
            draft.properties["Report"]["title"][0]["text"]["content"],
            "Week of 2026-08-21"
        );
    }

    #[test]
    fn insight_blocks_appear_only_when_rules_fired() {
        let mut report = sample_report(1);
        assert!(!weekly_document(&report)
            .blocks
            .iter()
            .any(|b| b["heading_2"]["rich_text"][0]["text"]["content"]
                == "Insights & Recommendations"));

        report.insights.push(Insight {
            observation: "obs".into(),
            implication: "imp".into(),
            action: "act".into(),
        });
        let draft = weekly_document(&report);
        assert!(draft
            .blocks
            .iter()
            .any(|b| b["heading_2"]["rich_text"][0]["text"]["content"]
                == "Insights & Recommendations"));
    }

    #[test]
    fn campaign_document_uses_the_suffixed_key() {
        let mut c = campaign("Brand", 88.4);
        c.conversions = Conversions {
            purchase: 1,
            lead: 2,
            total: 3,
            ..Conversions::default()
        };
        let draft = campaign_document(&range(), &c);
        assert_eq!(draft.title, "Week of 2026-08-21 — Brand");
        assert_eq!(draft.properties["Total Conversions"]["number"], 3);
        assert_eq!(draft.blocks.len(), 4);
    }

    #[test]
    fn money_and_count_formatting() {
        assert_eq!(fmt_money(1234.5), "$1,234.50");
        assert_eq!(fmt_money(0.0), "$0.00");
        assert_eq!(fmt_count(1_234_567), "1,234,567");
        assert_eq!(fmt_count(999), "999");
    }
}
