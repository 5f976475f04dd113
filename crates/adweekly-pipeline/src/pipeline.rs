//! Pipeline orchestration: FetchAds → FetchLeads → Process → Publish.
//!
//! Steps run strictly in order, each step's output feeding the next as a
//! typed value. Every step sits behind a bounded retry wrapper; the run
//! ends with exactly one success or failure notification carrying the
//! elapsed time. Backoff uses the runtime's timer, so a shutdown signal is
//! honored even mid-delay.

use std::future::Future;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use adweekly_core::aggregate;
use adweekly_core::config::Config;
use adweekly_core::record::DateRange;

use crate::clients::{AdsSource, LeadSource, ReportStore};
use crate::error::Result;
use crate::notify::{AlertSink, Severity};
use crate::publisher::{self, PublishOutcome, PublishState};
use crate::snapshot::SnapshotWriter;

pub struct Pipeline<A, L, S, N> {
    ads: A,
    leads: L,
    store: S,
    alerts: N,
    config: Config,
    snapshots: SnapshotWriter,
}

impl<A, L, S, N> Pipeline<A, L, S, N>
where
    A: AdsSource,
    L: LeadSource,
    S: ReportStore,
    N: AlertSink,
{
    pub fn new(ads: A, leads: L, store: S, alerts: N, config: Config) -> Self {
        let snapshots = SnapshotWriter::new(config.data_dir.clone());
        Self {
            ads,
            leads,
            store,
            alerts,
            config,
            snapshots,
        }
    }

    /// Run the full pipeline once and send the single end-of-run alert.
    pub async fn run(&self) -> Result<PublishOutcome> {
        let started = Instant::now();
        info!("weekly report run starting");

        let result = self.run_steps().await;
        let elapsed = format_elapsed(started.elapsed());

        match &result {
            Ok(outcome) => {
                let state = match outcome.state {
                    PublishState::Created => "created",
                    PublishState::Updated => "updated",
                };
                info!(elapsed = %elapsed, state, url = %outcome.page.url, "weekly report run succeeded");
                self.alerts
                    .notify(
                        &format!(
                            "Weekly report published ({state}).\nElapsed: {elapsed}\nReport: {}",
                            outcome.page.url
                        ),
                        Severity::Info,
                    )
                    .await;
            }
            Err(e) => {
                error!(elapsed = %elapsed, error = %e, "weekly report run failed");
                self.alerts
                    .notify(
                        &format!("Weekly report run failed.\nElapsed: {elapsed}\nError: {e}"),
                        Severity::Error,
                    )
                    .await;
            }
        }

        result
    }

    async fn run_steps(&self) -> Result<PublishOutcome> {
        let range = DateRange::last_days(Utc::now().date_naive(), self.config.lookback_days);

        let ads = self
            .with_retry("fetch_ads", || self.ads.fetch_insights(&range))
            .await?;
        self.snapshots.record("ads_data", &ads);
        // A window with no delivery (paused or brand-new account) is valid
        // input; the report goes out with all-zero totals.
        if ads.is_empty() {
            warn!(
                since = %range.since,
                until = %range.until,
                "insights window returned no campaign or audience rows; publishing a zero-activity report"
            );
        }

        let leads = self
            .with_retry("fetch_leads", || self.leads.fetch_leads(&range))
            .await?;
        self.snapshots.record("leads", &leads);

        let processed = self
            .with_retry("process", || async {
                Ok(aggregate::process(
                    &ads,
                    &leads,
                    self.config.avg_lead_value,
                    &self.config.insight_thresholds,
                ))
            })
            .await?;
        self.snapshots.record("weekly_report", &processed);
        info!(
            campaigns = processed.summary.campaign_count,
            conversions = processed.summary.total_conversions,
            spend = processed.summary.total_spend,
            insights = processed.insights.len(),
            "window processed"
        );

        self.with_retry("publish", || {
            publisher::publish(&self.store, &processed, &self.config.report_mode)
        })
        .await
    }

    /// Run `op` up to `max_retries` attempts total, sleeping the configured
    /// delay between attempts. Non-retryable failures propagate immediately.
    async fn with_retry<T, F, Fut>(&self, step: &'static str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 1;
        loop {
            info!(step, attempt, max_attempts, "step starting");
            match op().await {
                Ok(value) => {
                    info!(step, attempt, "step succeeded");
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        step,
                        attempt,
                        error = %e,
                        delay_secs = self.config.retry_delay_secs,
                        "step failed; retrying after delay"
                    );
                    tokio::time::sleep(self.config.retry_delay()).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(step, attempt, error = %e, "step failed permanently");
                    return Err(e);
                }
            }
        }
    }
}

fn format_elapsed(elapsed: std::time::Duration) -> String {
    let total = elapsed.as_secs();
    format!("{}m {}s", total / 60, total % 60)
}
