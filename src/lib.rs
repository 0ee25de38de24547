pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use core::{engine::EstimateEngine, pipeline::EstimatePipeline, state::EstimatorState};
pub use utils::error::{EstimatorError, Result};
