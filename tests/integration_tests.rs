use chrono::NaiveDate;
use clap::Parser;
use sighthound_estimator::config::toml_config::TomlConfig;
use sighthound_estimator::core::state::{BroadcastSink, EstimateUrlMessage, LatestEstimateUrl};
use sighthound_estimator::core::UrlSink;
use sighthound_estimator::{CliConfig, EstimateEngine, EstimatePipeline, LocalStorage};
use std::io::Read;
use std::sync::Arc;
use tempfile::TempDir;

fn cli(args: &[&str]) -> CliConfig {
    let mut argv = vec!["sighthound-estimator"];
    argv.extend_from_slice(args);
    CliConfig::parse_from(argv).resolved()
}

#[tokio::test]
async fn test_end_to_end_estimate_writes_every_format() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let config = cli(&[
        "--url",
        "https://estimator.example.com/index.html?cameras=50&hasSmartCameras=1&software=both",
        "--today-software",
        "60",
        "--formats",
        "pdf,svg,json,csv",
        "--output-path",
        &output_path,
    ]);

    let latest = Arc::new(LatestEstimateUrl::new());
    let storage = LocalStorage::new(output_path.clone());
    let pipeline = EstimatePipeline::new(storage, config)
        .with_url_sinks(vec![latest.clone() as Arc<dyn UrlSink>])
        .with_generated_on(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());

    let engine = EstimateEngine::new(pipeline);
    let run = engine.run().await;
    tokio_test::assert_ok!(&run);
    let run = run.unwrap();

    assert_eq!(run.output_path, output_path);
    assert_eq!(run.results.nodes_needed(), 13);
    assert_eq!(run.results.hardware.savings, 92_000.0);

    for name in ["estimate.pdf", "break_even.svg", "estimate.json", "estimate.csv", "roi_projection.csv"] {
        assert!(temp_dir.path().join(name).exists(), "missing {}", name);
    }

    let pdf = std::fs::read(temp_dir.path().join("estimate.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF"));

    // PDF 匯出會把明細展開寫回網址
    let url = latest.get().unwrap();
    assert!(url.contains("todaySoftware=60"));
    assert!(url.contains("expandBreakdown=1"));
    assert_eq!(run.estimate_url, url);
}

#[tokio::test]
async fn test_bundle_contains_all_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let config = cli(&[
        "--query",
        "cameras=10&smartCost=500&hasSmartCameras=1&software=lpr&todaySoftware=80",
        "--formats",
        "svg,json,csv",
        "--bundle",
        "--output-path",
        &output_path,
    ]);

    let storage = LocalStorage::new(output_path.clone());
    let engine = EstimateEngine::new(EstimatePipeline::new(storage, config));
    let run = engine.run().await.unwrap();

    assert!(run.output_path.ends_with("estimate_bundle.zip"));
    let zip_data = std::fs::read(temp_dir.path().join("estimate_bundle.zip")).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();

    let file_names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(
        file_names,
        vec!["break_even.svg", "estimate.json", "estimate.csv", "roi_projection.csv"]
    );

    let mut svg = String::new();
    archive
        .by_name("break_even.svg")
        .unwrap()
        .read_to_string(&mut svg)
        .unwrap();
    assert!(svg.contains("16 mo"));
}

#[tokio::test]
async fn test_scenario_flag_overrides_url_flags() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let config = cli(&[
        "--query",
        "cameras=12&hasSmartCameras=1",
        "--scenario",
        "b",
        "--formats",
        "json",
        "--output-path",
        &output_path,
    ]);

    let storage = LocalStorage::new(output_path.clone());
    let run = EstimateEngine::new(EstimatePipeline::new(storage, config))
        .run()
        .await
        .unwrap();

    assert_eq!(run.results.scenario().as_str(), "b");
    assert_eq!(run.results.hardware.sighthound_total, 3.0 * 3500.0);
    assert_eq!(run.estimate_url, "?cameras=12&hasExistingCameras=1");
}

#[tokio::test]
async fn test_toml_jobs_run_into_named_directories() {
    let temp_dir = TempDir::new().unwrap();
    let output_root = temp_dir.path().to_str().unwrap().to_string();

    let content = format!(
        r#"
[estimator]
name = "batch"
share_base = "https://estimator.example.com/index.html"

[[estimates]]
name = "warehouse"
url = "cameras=50&hasSmartCameras=1"

[[estimates]]
name = "campus"
url = "cameras=7"

[output]
path = "{}"
formats = ["json"]
"#,
        output_root.replace('\\', "/")
    );

    let config = TomlConfig::from_toml_str(&content).unwrap();
    tokio_test::assert_ok!(sighthound_estimator::utils::validation::Validate::validate(&config));

    for job in config.jobs() {
        let storage = LocalStorage::new(job.output_path.clone());
        let run = EstimateEngine::new(EstimatePipeline::new(storage, job))
            .run()
            .await
            .unwrap();
        assert!(run.estimate_url.starts_with("https://estimator.example.com/index.html?"));
    }

    let warehouse = std::fs::read_to_string(temp_dir.path().join("warehouse/estimate.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&warehouse).unwrap();
    assert_eq!(json["results"]["hardware"]["nodesNeeded"], 13);

    assert!(temp_dir.path().join("campus/estimate.json").exists());
}

#[tokio::test]
async fn test_strict_mode_rejects_inputs_outside_guided_limits() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let config = cli(&[
        "--cameras",
        "0",
        "--strict",
        "--formats",
        "json",
        "--output-path",
        &output_path,
    ]);

    let storage = LocalStorage::new(output_path.clone());
    let result = EstimateEngine::new(EstimatePipeline::new(storage, config)).run().await;
    let err = tokio_test::assert_err!(result);
    assert_eq!(err.exit_code(), 1);
    assert!(!temp_dir.path().join("estimate.json").exists());
}

#[tokio::test]
async fn test_broadcast_sink_receives_estimate_url_message() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let config = cli(&[
        "--url",
        "https://estimator.example.com/live.html?cameras=9&software=lpr",
        "--broadcast",
        "--formats",
        "json",
        "--output-path",
        &output_path,
    ]);
    assert!(config.broadcast);

    let sink = Arc::new(BroadcastSink::new(Vec::<u8>::new()));
    let storage = LocalStorage::new(output_path.clone());
    let engine = EstimateEngine::new(
        EstimatePipeline::new(storage, config).with_url_sinks(vec![sink.clone() as Arc<dyn UrlSink>]),
    );
    let run = engine.run().await.unwrap();
    drop(engine);

    let sink = Arc::try_unwrap(sink).ok().unwrap();
    let output = String::from_utf8(sink.into_inner()).unwrap();
    let message = EstimateUrlMessage::parse(output.lines().last().unwrap()).unwrap();
    assert_eq!(message.url, run.estimate_url);
    assert_eq!(
        message.url,
        "https://estimator.example.com/live.html?cameras=9&software=lpr"
    );
}
