//! Idempotent publish of rendered report documents.
//!
//! Per (reporting-week, optional campaign) key: look the title up in the
//! destination store, create the document if absent, otherwise overwrite
//! its properties and append the new content blocks. The lookup-before-write
//! step is what keeps at most one document per key across repeated runs;
//! the store itself enforces no uniqueness, and concurrent runs for the
//! same key are not protected by any lock.

use tracing::info;

use adweekly_core::aggregate::ProcessedReport;
use adweekly_core::config::ReportMode;
use adweekly_core::report::{self, DocumentDraft};

use crate::clients::{docstore, PageRef, ReportStore};
use crate::error::Result;

/// Which branch the upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Created,
    Updated,
}

#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub page: PageRef,
    pub state: PublishState,
}

/// Upsert one rendered document by its canonical title key.
pub async fn upsert_document<S: ReportStore + ?Sized>(
    store: &S,
    draft: DocumentDraft,
) -> Result<PublishOutcome> {
    match store.find_report(&draft.title).await? {
        Some(page_id) => {
            info!(title = %draft.title, page_id = %page_id, "existing report found; updating");
            store.update_properties(&page_id, draft.properties).await?;
            store.append_blocks(&page_id, draft.blocks).await?;
            Ok(PublishOutcome {
                page: PageRef {
                    url: docstore::page_url(&page_id),
                    id: page_id,
                },
                state: PublishState::Updated,
            })
        }
        None => {
            info!(title = %draft.title, "no report for key; creating");
            let page = store.create_report(draft.properties, draft.blocks).await?;
            Ok(PublishOutcome {
                page,
                state: PublishState::Created,
            })
        }
    }
}

/// Publish the account-level weekly document and, in per-campaign mode,
/// one document per campaign. Returns the weekly document's outcome (the
/// pipeline's terminal result).
pub async fn publish<S: ReportStore + ?Sized>(
    store: &S,
    processed: &ProcessedReport,
    mode: &ReportMode,
) -> Result<PublishOutcome> {
    let outcome = upsert_document(store, report::weekly_document(processed)).await?;
    info!(
        state = ?outcome.state,
        url = %outcome.page.url,
        "weekly report published"
    );

    if *mode == ReportMode::PerCampaign {
        for campaign in &processed.campaigns {
            let draft = report::campaign_document(&processed.date_range, campaign);
            let campaign_outcome = upsert_document(store, draft).await?;
            info!(
                state = ?campaign_outcome.state,
                campaign = campaign.campaign_name.as_deref().unwrap_or("(unnamed)"),
                "campaign report published"
            );
        }
    }

    Ok(outcome)
}
