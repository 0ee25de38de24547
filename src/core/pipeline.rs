use crate::adapters::chart::render_break_even_svg;
use crate::adapters::pdf::render_estimate_pdf;
use crate::core::calc::compute_scenario_results;
use crate::core::params::{apply_params_to_url, build_search_from_params, parse_estimate_source, PARAM_EXPAND_BREAKDOWN};
use crate::core::report::EstimateReport;
use crate::core::state::{EstimatorState, UrlSync, URL_SYNC_DEBOUNCE};
use crate::core::{ConfigProvider, Pipeline, Storage, UrlSink};
use crate::domain::model::{Artifact, EstimateParams, RenderedEstimate, ScenarioResults};
use crate::utils::error::{EstimatorError, Result};
use crate::utils::validation::validate_guided_inputs;
use chrono::NaiveDate;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use zip::write::{FileOptions, ZipWriter};

pub const PDF_FILENAME: &str = "estimate.pdf";
pub const SVG_FILENAME: &str = "break_even.svg";
pub const JSON_FILENAME: &str = "estimate.json";
pub const SUMMARY_CSV_FILENAME: &str = "estimate.csv";
pub const PROJECTION_CSV_FILENAME: &str = "roi_projection.csv";
pub const BUNDLE_FILENAME: &str = "estimate_bundle.zip";

pub struct EstimatePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    url_sinks: Vec<Arc<dyn UrlSink>>,
    generated_on: Option<NaiveDate>,
}

impl<S: Storage, C: ConfigProvider> EstimatePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            url_sinks: Vec::new(),
            generated_on: None,
        }
    }

    /// Receivers of the canonical URL, written once extract settles the params.
    pub fn with_url_sinks(mut self, sinks: Vec<Arc<dyn UrlSink>>) -> Self {
        self.url_sinks = sinks;
        self
    }

    /// Fixes the report date (defaults to today).
    pub fn with_generated_on(mut self, date: NaiveDate) -> Self {
        self.generated_on = Some(date);
        self
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn wants(&self, format: &str) -> bool {
        self.config
            .output_formats()
            .iter()
            .any(|f| f.eq_ignore_ascii_case(format))
    }

    fn estimate_url(&self, params: &EstimateParams) -> Result<String> {
        let (base, _) = parse_estimate_source(self.config.estimate_source())?;
        Ok(match base {
            Some(mut url) => {
                apply_params_to_url(&mut url, params);
                url.to_string()
            }
            None => {
                let search = build_search_from_params(params);
                if search.is_empty() {
                    String::new()
                } else {
                    format!("?{}", search)
                }
            }
        })
    }

    fn summary_csv(report: &EstimateReport) -> Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(["field", "value"])?;
        for (label, value) in report.input_rows() {
            wtr.write_record([label, value.as_str()])?;
        }
        for (label, value) in report.result_rows() {
            wtr.write_record([label.as_str(), value.as_str()])?;
        }
        if let Some(headline) = &report.roi_headline {
            wtr.write_record(["Break-even", headline.as_str()])?;
        }
        into_bytes(wtr)
    }

    fn projection_csv(results: &ScenarioResults) -> Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for point in &results.roi.data_points {
            wtr.serialize(point)?;
        }
        into_bytes(wtr)
    }
}

fn into_bytes(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    wtr.into_inner().map_err(|e| EstimatorError::ProcessingError {
        message: format!("Failed to flush CSV output: {}", e),
    })
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for EstimatePipeline<S, C> {
    async fn extract(&self) -> Result<EstimateParams> {
        tracing::debug!("Reading estimate parameters from: {}", self.config.estimate_source());
        let mut state = EstimatorState::from_source(self.config.estimate_source())?;

        if !self.url_sinks.is_empty() {
            let sync = UrlSync::spawn(self.url_sinks.clone(), URL_SYNC_DEBOUNCE);
            state = state.with_url_sync(sync);
        }

        let overrides = self.config.param_overrides();
        if !overrides.is_empty() {
            tracing::debug!("Applying {} parameter override(s)", overrides.len());
            state.update(overrides);
        }

        // 匯出 PDF 時一律展開明細
        if self.wants("pdf") && !state.params().expand_breakdown {
            state.update([(PARAM_EXPAND_BREAKDOWN, "1")]);
        }

        let params = state.params();
        state.close().await;

        if self.config.strict() {
            validate_guided_inputs(
                f64::from(params.cameras),
                params.smart_cost,
                params.ip_cost,
            )?;
        }

        Ok(params)
    }

    async fn transform(&self, params: EstimateParams) -> Result<RenderedEstimate> {
        let results = compute_scenario_results(&params);
        let canonical_query = build_search_from_params(&params);
        let estimate_url = self.estimate_url(&params)?;
        let generated_on = self
            .generated_on
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let report = EstimateReport::from_results(&results, generated_on);

        let mut artifacts = Vec::new();

        if self.wants("pdf") {
            let link = (!estimate_url.is_empty()).then_some(estimate_url.as_str());
            let bytes = render_estimate_pdf(&report, &results.roi, self.config.page_size(), link)?;
            artifacts.push(Artifact {
                filename: PDF_FILENAME.to_string(),
                bytes,
            });
        }

        if self.wants("svg") {
            match render_break_even_svg(&results.roi) {
                Some(svg) => artifacts.push(Artifact {
                    filename: SVG_FILENAME.to_string(),
                    bytes: svg.into_bytes(),
                }),
                None => tracing::info!(
                    "Break-even chart only applies to smart-camera replacement with software; skipping SVG"
                ),
            }
        }

        if self.wants("json") {
            let document = json!({
                "estimateUrl": estimate_url,
                "query": canonical_query,
                "results": results,
                "report": report,
            });
            artifacts.push(Artifact {
                filename: JSON_FILENAME.to_string(),
                bytes: serde_json::to_vec_pretty(&document)?,
            });
        }

        if self.wants("csv") {
            artifacts.push(Artifact {
                filename: SUMMARY_CSV_FILENAME.to_string(),
                bytes: Self::summary_csv(&report)?,
            });
            if results.roi.applicable {
                artifacts.push(Artifact {
                    filename: PROJECTION_CSV_FILENAME.to_string(),
                    bytes: Self::projection_csv(&results)?,
                });
            }
        }

        tracing::debug!(
            "Rendered {} artifact(s) for scenario {}",
            artifacts.len(),
            results.scenario()
        );

        Ok(RenderedEstimate {
            results,
            canonical_query,
            estimate_url,
            artifacts,
        })
    }

    async fn load(&self, estimate: RenderedEstimate) -> Result<String> {
        let output_path = self.config.output_path();

        if estimate.artifacts.is_empty() {
            tracing::warn!("No artifacts to write");
            return Ok(output_path.to_string());
        }

        if self.config.bundle() {
            tracing::debug!("Creating ZIP bundle with {} files", estimate.artifacts.len());

            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for artifact in &estimate.artifacts {
                    zip.start_file::<_, ()>(artifact.filename.as_str(), FileOptions::default())?;
                    zip.write_all(&artifact.bytes)?;
                }
                let cursor = zip.finish()?;
                cursor.into_inner()
            };

            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(BUNDLE_FILENAME, &zip_data).await?;
            return Ok(format!("{}/{}", output_path, BUNDLE_FILENAME));
        }

        for artifact in &estimate.artifacts {
            tracing::debug!("Writing {} ({} bytes)", artifact.filename, artifact.bytes.len());
            self.storage
                .write_file(&artifact.filename, &artifact.bytes)
                .await?;
        }

        Ok(output_path.to_string())
    }
}
