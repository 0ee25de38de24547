use clap::Parser;
use sighthound_estimator::adapters::hubspot::HubSpotClient;
use sighthound_estimator::config::toml_config::{EstimateJob, TomlConfig};
use sighthound_estimator::core::params::{normalize_params, parse_estimate_source};
use sighthound_estimator::core::ConfigProvider;
use sighthound_estimator::utils::{logger, validation::Validate};
use sighthound_estimator::{EstimateEngine, EstimatePipeline, LocalStorage};

#[derive(Parser)]
#[command(name = "toml-estimate")]
#[command(about = "Render a batch of estimates described in a TOML file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "estimates.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Only run the named estimate
    #[arg(long)]
    only: Option<String>,

    /// Skip HubSpot submissions even when entries carry an email
    #[arg(long)]
    no_submit: bool,

    /// Dry run - show what would be rendered without writing files
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌（[logging] 可切換 JSON）
    let verbose = args.verbose || config.is_verbose_logging();
    if config.is_json_logging() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting TOML-based estimate batch");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let jobs: Vec<EstimateJob> = config
        .jobs()
        .into_iter()
        .filter(|job| args.only.as_ref().map_or(true, |only| &job.name == only))
        .collect();

    if jobs.is_empty() {
        anyhow::bail!("no estimate matches --only {:?}", args.only);
    }

    display_config_summary(&config, &jobs, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        perform_dry_run(&jobs)?;
        return Ok(());
    }

    let hubspot = HubSpotClient::new(config.hubspot_config());
    let mut failures = 0usize;

    for job in jobs {
        let name = job.name.clone();
        let email = job.email.clone();
        tracing::info!("▶️ Estimate '{}'", name);

        let storage = LocalStorage::new(job.output_path().to_string());
        let pipeline = EstimatePipeline::new(storage, job);
        let engine = EstimateEngine::new_with_monitoring(pipeline, verbose);

        let run = match engine.run().await {
            Ok(run) => run,
            Err(e) => {
                failures += 1;
                tracing::error!(
                    "❌ Estimate '{}' failed: {} (Category: {:?}, Severity: {:?})",
                    name,
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                continue;
            }
        };

        println!(
            "✅ {}: {} node(s), output at {}",
            name,
            run.results.nodes_needed(),
            run.output_path
        );

        if let (Some(email), false) = (email, args.no_submit) {
            if let Err(e) = hubspot.submit_estimate(&email, &run.estimate_url).await {
                failures += 1;
                tracing::error!("❌ HubSpot submission for '{}' failed: {}", name, e);
                eprintln!("❌ {}", e.user_friendly_message());
            }
        }
    }

    if failures > 0 {
        eprintln!("❌ {} step(s) failed", failures);
        std::process::exit(1);
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, jobs: &[EstimateJob], args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Batch: {}", config.estimator.name);
    if let Some(description) = &config.estimator.description {
        println!("  Description: {}", description);
    }
    println!("  Output: {}", config.output.path);
    println!("  Formats: {}", config.output.formats.join(", "));
    println!("  Page size: {:?}", config.page_size());
    println!("  Estimates: {}", jobs.len());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(jobs: &[EstimateJob]) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");
    println!();

    for job in jobs {
        let (_, raw) = parse_estimate_source(job.estimate_source())?;
        let params = normalize_params(&raw);
        println!("📐 {}", job.name);
        println!("  Source: {}", job.estimate_source());
        println!("  Cameras: {} (scenario {})", params.cameras, params.scenario());
        println!("  Software: {} / {}", params.software.label(), params.billing.label());
        println!("  Output: {}", job.output_path());
        if job.bundle() {
            println!("  Bundle: estimate_bundle.zip");
        }
        if let Some(email) = &job.email {
            println!("  HubSpot contact: {}", email);
        }
        println!();
    }

    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
    Ok(())
}
