use anyhow::Context;
use clap::Parser;
use sighthound_estimator::adapters::hubspot::{HubSpotClient, HubSpotConfig};
use sighthound_estimator::core::params::{build_share_url, ensure_print_mode, mode_switch_url, Mode};
use sighthound_estimator::core::report::EstimateReport;
use sighthound_estimator::core::state::{BroadcastSink, LatestEstimateUrl};
use sighthound_estimator::core::UrlSink;
use sighthound_estimator::utils::{logger, validation::Validate};
use sighthound_estimator::{CliConfig, EstimateEngine, EstimatePipeline, EstimatorError, LocalStorage};
use std::sync::Arc;
use url::Url;

fn exit_with(e: &EstimatorError) -> ! {
    tracing::error!(
        "❌ Estimate failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code().max(1));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse().resolved();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting sighthound-estimator CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let email = config.email.clone();
    let hubspot = HubSpotConfig::default().with_base_url(config.hubspot_url.clone());
    let verbose = config.verbose;

    let latest = Arc::new(LatestEstimateUrl::new());
    let mut sinks: Vec<Arc<dyn UrlSink>> = vec![latest.clone() as Arc<dyn UrlSink>];
    if config.broadcast {
        sinks.push(Arc::new(BroadcastSink::new(std::io::stdout())));
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = EstimatePipeline::new(storage, config).with_url_sinks(sinks);
    let engine = EstimateEngine::new_with_monitoring(pipeline, verbose);

    let run = match engine.run().await {
        Ok(run) => run,
        Err(e) => exit_with(&e),
    };

    let report = EstimateReport::from_results(&run.results, chrono::Local::now().date_naive());
    println!("{}", report.to_text());
    println!("✅ Estimate completed");
    println!("📁 Output saved to: {}", run.output_path);

    let estimate_url = latest.get().unwrap_or(run.estimate_url);
    if let Ok(current) = Url::parse(&estimate_url) {
        let guided = build_share_url(Mode::Guided.page(), &current);
        println!("🔗 Share link: {}", guided);
        let live = mode_switch_url(&current, Mode::Live)
            .context("failed to build the live-mode link")?;
        println!("🔗 Live mode: {}", live);
        let print_view = ensure_print_mode(&guided).context("failed to build the print link")?;
        println!("🖨️ Print view: {}", print_view);
    } else if !estimate_url.is_empty() {
        println!("🔗 Query: {}", estimate_url);
    }

    if let Some(email) = email {
        let client = HubSpotClient::new(hubspot);
        match client.submit_estimate(&email, &estimate_url).await {
            Ok(receipt) => {
                println!("📨 Estimate link sent to HubSpot for {}", email);
                if let Some(message) = receipt.inline_message {
                    tracing::debug!("HubSpot inline message: {}", message);
                }
            }
            Err(e) => exit_with(&e),
        }
    }

    Ok(())
}
