use crate::core::Pipeline;
use crate::domain::model::ScenarioResults;
use crate::utils::error::Result;
use std::time::{Duration, Instant};

/// Outcome of one engine run.
#[derive(Debug, Clone)]
pub struct EstimateRun {
    pub output_path: String,
    pub estimate_url: String,
    pub results: ScenarioResults,
    pub artifact_names: Vec<String>,
    pub timings: PhaseTimings,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimings {
    pub extract: Duration,
    pub transform: Duration,
    pub load: Duration,
}

impl PhaseTimings {
    pub fn total(&self) -> Duration {
        self.extract + self.transform + self.load
    }
}

pub struct EstimateEngine<P: Pipeline> {
    pipeline: P,
    timing: bool,
}

impl<P: Pipeline> EstimateEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            timing: false,
        }
    }

    /// Logs per-phase timings at info level.
    pub fn new_with_monitoring(pipeline: P, timing: bool) -> Self {
        Self { pipeline, timing }
    }

    pub async fn run(&self) -> Result<EstimateRun> {
        tracing::info!("🚀 Starting estimate run");
        let mut timings = PhaseTimings::default();

        // Extract
        tracing::info!("📥 Reading estimate parameters...");
        let started = Instant::now();
        let params = self.pipeline.extract().await?;
        timings.extract = started.elapsed();
        tracing::info!(
            "✅ Parameters: {} camera(s), scenario {}",
            params.cameras,
            params.scenario()
        );
        self.log_phase("extract", timings.extract);

        // Transform
        tracing::info!("🔄 Computing estimate and rendering outputs...");
        let started = Instant::now();
        let rendered = self.pipeline.transform(params).await?;
        timings.transform = started.elapsed();
        tracing::info!(
            "✅ {} Compute Node(s), {} artifact(s) rendered",
            rendered.results.nodes_needed(),
            rendered.artifacts.len()
        );
        self.log_phase("transform", timings.transform);

        let results = rendered.results.clone();
        let estimate_url = rendered.estimate_url.clone();
        let artifact_names = rendered
            .artifacts
            .iter()
            .map(|a| a.filename.clone())
            .collect();

        // Load
        tracing::info!("💾 Writing outputs...");
        let started = Instant::now();
        let output_path = self.pipeline.load(rendered).await?;
        timings.load = started.elapsed();
        tracing::info!("✅ Output saved to: {}", output_path);
        self.log_phase("load", timings.load);

        if self.timing {
            tracing::info!("⏱️ Total time: {:.2?}", timings.total());
        }

        Ok(EstimateRun {
            output_path,
            estimate_url,
            results,
            artifact_names,
            timings,
        })
    }

    fn log_phase(&self, phase: &str, elapsed: Duration) {
        if self.timing {
            tracing::info!("⏱️ {} phase: {:.2?}", phase, elapsed);
        } else {
            tracing::debug!("{} phase: {:.2?}", phase, elapsed);
        }
    }
}
