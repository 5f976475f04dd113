use anyhow::Result;
use tracing::info;

use adweekly_core::config::Config;
use adweekly_pipeline::clients::{
    ads::AdsInsightsClient, docstore::DocStoreClient, http_client, leads::LeadsClient,
};
use adweekly_pipeline::notify::WebhookNotifier;
use adweekly_pipeline::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adweekly=info".parse()?),
        )
        .json()
        .init();

    // The only place ambient environment state is read; everything
    // downstream receives the explicit config object.
    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    info!(
        account_id = %cfg.ad_account_id,
        lookback_days = cfg.lookback_days,
        mode = ?cfg.report_mode,
        "configuration loaded"
    );

    let http = http_client()?;
    let ads = AdsInsightsClient::new(
        http.clone(),
        cfg.ads_api_base.clone(),
        cfg.ads_token.clone(),
        cfg.ad_account_id.clone(),
    );
    let leads = LeadsClient::new(
        http.clone(),
        cfg.docstore_api_base.clone(),
        cfg.docstore_token.clone(),
        cfg.leads_database_id.clone(),
    );
    let store = DocStoreClient::new(
        http.clone(),
        cfg.docstore_api_base.clone(),
        cfg.docstore_token.clone(),
        cfg.reports_database_id.clone(),
    );
    let alerts = WebhookNotifier::new(http, cfg.alert_webhook_url.clone());

    let pipeline = Pipeline::new(ads, leads, store, alerts, cfg);
    match pipeline.run().await {
        Ok(outcome) => {
            info!(url = %outcome.page.url, "run complete");
            Ok(())
        }
        // The failure notification has already been sent by the pipeline.
        Err(_) => std::process::exit(1),
    }
}
