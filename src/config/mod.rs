pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::params::{
    PARAM_BILLING, PARAM_CAMERAS, PARAM_HAS_EXISTING, PARAM_HAS_SMART, PARAM_IP_COST,
    PARAM_SMART_COST, PARAM_SOFTWARE, PARAM_TODAY_SOFTWARE,
};
#[cfg(feature = "cli")]
use crate::config::toml_config::resolve_source;
#[cfg(feature = "cli")]
use crate::core::{ConfigProvider, PageSize};
#[cfg(feature = "cli")]
use crate::domain::model::Scenario;
#[cfg(feature = "cli")]
use crate::utils::error::{EstimatorError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "sighthound-estimator")]
#[command(about = "Compute Node count and hardware/software cost estimates for Sighthound deployments")]
pub struct CliConfig {
    /// Estimator URL to read parameters from (index.html or live.html)
    #[arg(long)]
    pub url: Option<String>,

    /// Bare query string, e.g. "cameras=50&hasSmartCameras=1"
    #[arg(long, conflicts_with = "url")]
    pub query: Option<String>,

    #[arg(long)]
    pub cameras: Option<u32>,

    /// Price of one smart AI camera (USD)
    #[arg(long)]
    pub smart_cost: Option<f64>,

    /// Price of one standard IP camera (USD)
    #[arg(long)]
    pub ip_cost: Option<f64>,

    /// none, lpr, mmcg or both
    #[arg(long)]
    pub software: Option<String>,

    /// monthly or yearly
    #[arg(long)]
    pub billing: Option<String>,

    /// a (smart cameras today), b (existing IP cameras) or c (new deployment)
    #[arg(long)]
    pub scenario: Option<String>,

    /// Current software spend per camera per month (USD)
    #[arg(long)]
    pub today_software: Option<f64>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Comma-separated list of pdf, svg, json, csv
    #[arg(long, value_delimiter = ',', default_value = "pdf")]
    pub formats: Vec<String>,

    /// Write a single estimate_bundle.zip instead of separate files
    #[arg(long)]
    pub bundle: bool,

    /// letter or a4 (defaults to PDF_FORMAT, then letter)
    #[arg(long)]
    pub page_size: Option<String>,

    /// Page URL used for the share link when only a query string is given
    #[arg(long)]
    pub share_base: Option<String>,

    /// Submit the estimate link to the HubSpot form for this email
    #[arg(long)]
    pub email: Option<String>,

    #[arg(long, default_value = crate::adapters::hubspot::DEFAULT_BASE_URL)]
    pub hubspot_url: String,

    /// Reject inputs outside the guided form limits
    #[arg(long)]
    pub strict: bool,

    /// Print a HARDWARE_ESTIMATE_URL JSON message for each canonical URL
    #[arg(long)]
    pub broadcast: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(skip)]
    #[serde(skip)]
    source: String,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Settles the estimate source; call once after parsing.
    pub fn resolved(mut self) -> Self {
        self.source = match (&self.url, &self.query) {
            (Some(url), _) => url.clone(),
            (None, Some(query)) => resolve_source(query, self.share_base.as_deref()),
            (None, None) => self.share_base.clone().unwrap_or_default(),
        };
        self
    }

    pub fn parse_scenario(&self) -> Result<Option<Scenario>> {
        match &self.scenario {
            None => Ok(None),
            Some(raw) => Scenario::parse(raw).map(Some).ok_or_else(|| {
                EstimatorError::InvalidConfigValueError {
                    field: "scenario".to_string(),
                    value: raw.clone(),
                    reason: "Expected a, b or c".to_string(),
                }
            }),
        }
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn estimate_source(&self) -> &str {
        &self.source
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn page_size(&self) -> PageSize {
        self.page_size
            .as_deref()
            .and_then(PageSize::parse)
            .unwrap_or_else(PageSize::from_env)
    }

    fn bundle(&self) -> bool {
        self.bundle
    }

    fn param_overrides(&self) -> Vec<(String, String)> {
        let mut overrides = Vec::new();
        let mut push = |key: &str, value: String| overrides.push((key.to_string(), value));

        if let Some(cameras) = self.cameras {
            push(PARAM_CAMERAS, cameras.to_string());
        }
        if let Some(cost) = self.smart_cost {
            push(PARAM_SMART_COST, cost.to_string());
        }
        if let Some(cost) = self.ip_cost {
            push(PARAM_IP_COST, cost.to_string());
        }
        if let Some(software) = &self.software {
            push(PARAM_SOFTWARE, software.clone());
        }
        if let Some(billing) = &self.billing {
            push(PARAM_BILLING, billing.clone());
        }
        if let Some(spend) = self.today_software {
            push(PARAM_TODAY_SOFTWARE, spend.to_string());
        }
        // 情境以兩個旗標表示
        if let Ok(Some(scenario)) = self.parse_scenario() {
            let flag = |on: bool| (if on { "1" } else { "0" }).to_string();
            push(PARAM_HAS_SMART, flag(scenario == Scenario::A));
            push(PARAM_HAS_EXISTING, flag(scenario == Scenario::B));
        }
        overrides
    }

    fn strict(&self) -> bool {
        self.strict
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.url {
            validation::validate_url("url", url)?;
        }
        if let Some(base) = &self.share_base {
            validation::validate_url("share_base", base)?;
        }
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_output_formats("formats", &self.formats)?;
        self.parse_scenario()?;

        if let Some(raw) = &self.page_size {
            if PageSize::parse(raw).is_none() {
                return Err(EstimatorError::InvalidConfigValueError {
                    field: "page_size".to_string(),
                    value: raw.clone(),
                    reason: "Expected letter or a4".to_string(),
                });
            }
        }
        if let Some(email) = &self.email {
            validation::validate_non_empty_string("email", email)?;
        }
        validation::validate_url("hubspot_url", &self.hubspot_url)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["sighthound-estimator"];
        argv.extend_from_slice(args);
        CliConfig::parse_from(argv).resolved()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.output_path(), "./output");
        assert_eq!(config.output_formats(), &["pdf".to_string()]);
        assert_eq!(config.estimate_source(), "");
        assert!(!config.bundle());
        assert!(config.param_overrides().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_source_and_overrides() {
        let config = parse(&[
            "--query",
            "cameras=5",
            "--cameras",
            "50",
            "--software",
            "both",
            "--scenario",
            "b",
            "--formats",
            "json,csv",
        ]);
        assert_eq!(config.estimate_source(), "cameras=5");
        assert_eq!(config.output_formats(), &["json".to_string(), "csv".to_string()]);

        let overrides = config.param_overrides();
        assert!(overrides.contains(&("cameras".to_string(), "50".to_string())));
        assert!(overrides.contains(&("software".to_string(), "both".to_string())));
        assert!(overrides.contains(&("hasSmartCameras".to_string(), "0".to_string())));
        assert!(overrides.contains(&("hasExistingCameras".to_string(), "1".to_string())));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(parse(&["--formats", "pdf,docx"]).validate().is_err());
        assert!(parse(&["--scenario", "d"]).validate().is_err());
        assert!(parse(&["--page-size", "legal"]).validate().is_err());
        assert!(parse(&["--url", "ftp://example.com/index.html"]).validate().is_err());
    }

    #[test]
    fn test_share_base_prefixes_query() {
        let config = parse(&["--query", "cameras=5", "--share-base", "https://e.com/live.html"]);
        assert_eq!(config.estimate_source(), "https://e.com/live.html?cameras=5");
    }

    #[test]
    fn test_broadcast_flag() {
        assert!(!parse(&[]).broadcast);
        assert!(parse(&["--broadcast"]).broadcast);
    }

    #[test]
    fn test_page_size_flag() {
        assert_eq!(parse(&["--page-size", "A4"]).page_size(), PageSize::A4);
    }
}
