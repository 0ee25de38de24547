pub mod calc;
pub mod engine;
pub mod format;
pub mod params;
pub mod pipeline;
pub mod report;
pub mod state;

pub use crate::domain::model::{EstimateParams, RenderedEstimate, ScenarioResults};
pub use crate::domain::ports::{ConfigProvider, PageSize, Pipeline, Storage, UrlSink};
pub use crate::utils::error::Result;
