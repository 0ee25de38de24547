use crate::domain::model::{EstimateParams, RenderedEstimate};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    Letter,
    A4,
}

impl PageSize {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "letter" => Some(PageSize::Letter),
            "a4" => Some(PageSize::A4),
            _ => None,
        }
    }

    /// `PDF_FORMAT` 環境變數，預設 Letter
    pub fn from_env() -> Self {
        std::env::var("PDF_FORMAT")
            .ok()
            .and_then(|v| Self::parse(&v))
            .unwrap_or_default()
    }

    /// Width and height in millimetres.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            PageSize::Letter => (215.9, 279.4),
            PageSize::A4 => (210.0, 297.0),
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    /// Estimator URL or bare query string to read parameters from.
    fn estimate_source(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn page_size(&self) -> PageSize;
    fn bundle(&self) -> bool;

    /// Raw `key=value` pairs applied on top of the source parameters.
    fn param_overrides(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Enforce the guided-form input limits.
    fn strict(&self) -> bool {
        false
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<EstimateParams>;
    async fn transform(&self, params: EstimateParams) -> Result<RenderedEstimate>;
    async fn load(&self, estimate: RenderedEstimate) -> Result<String>;
}

/// Receives the canonical estimator URL each time the state is written back.
pub trait UrlSink: Send + Sync {
    fn replace_url(&self, url: &str) -> Result<()>;
}
