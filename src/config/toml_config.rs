use crate::adapters::hubspot::HubSpotConfig;
use crate::core::{ConfigProvider, PageSize};
use crate::utils::error::{EstimatorError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Batch configuration: one `[[estimates]]` entry per estimate to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub estimator: EstimatorSection,
    #[serde(default)]
    pub estimates: Vec<EstimateEntry>,
    pub output: OutputSection,
    pub hubspot: Option<HubSpotConfig>,
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorSection {
    pub name: String,
    pub description: Option<String>,
    /// Page URL used when an entry only carries a query string.
    pub share_base: Option<String>,
    pub page_size: Option<String>,
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateEntry {
    pub name: String,
    /// Full estimator URL or bare query string.
    pub url: String,
    /// Contact to submit the estimate link for.
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: String,
    pub formats: Vec<String>,
    pub bundle: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    pub level: Option<String>,
    /// `text` (default) or `json`
    pub format: Option<String>,
}

impl LoggingSection {
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }

    pub fn is_verbose(&self) -> bool {
        self.level
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case("debug") || l.eq_ignore_ascii_case("trace"))
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EstimatorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EstimatorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ESTIMATOR_URL})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EstimatorError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn page_size(&self) -> PageSize {
        self.estimator
            .page_size
            .as_deref()
            .and_then(PageSize::parse)
            .unwrap_or_else(PageSize::from_env)
    }

    pub fn is_json_logging(&self) -> bool {
        self.logging.as_ref().is_some_and(LoggingSection::is_json)
    }

    pub fn is_verbose_logging(&self) -> bool {
        self.logging.as_ref().is_some_and(LoggingSection::is_verbose)
    }

    pub fn hubspot_config(&self) -> HubSpotConfig {
        self.hubspot.clone().unwrap_or_default()
    }

    /// One runnable config per `[[estimates]]` entry, each writing into
    /// `<output.path>/<name>`.
    pub fn jobs(&self) -> Vec<EstimateJob> {
        self.estimates
            .iter()
            .map(|entry| EstimateJob {
                name: entry.name.clone(),
                source: resolve_source(&entry.url, self.estimator.share_base.as_deref()),
                email: entry.email.clone(),
                output_path: format!("{}/{}", self.output.path.trim_end_matches('/'), entry.name),
                formats: self.output.formats.clone(),
                page_size: self.page_size(),
                bundle: self.output.bundle.unwrap_or(false),
                strict: self.estimator.strict.unwrap_or(false),
                share_base: self.estimator.share_base.clone(),
            })
            .collect()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("estimator.name", &self.estimator.name)?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_output_formats("output.formats", &self.output.formats)?;

        if let Some(base) = &self.estimator.share_base {
            validation::validate_url("estimator.share_base", base)?;
        }
        if let Some(raw) = &self.estimator.page_size {
            if PageSize::parse(raw).is_none() {
                return Err(EstimatorError::InvalidConfigValueError {
                    field: "estimator.page_size".to_string(),
                    value: raw.clone(),
                    reason: "Expected letter or a4".to_string(),
                });
            }
        }

        if self.estimates.is_empty() {
            return Err(EstimatorError::MissingConfigError {
                field: "estimates".to_string(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for (i, entry) in self.estimates.iter().enumerate() {
            let field = format!("estimates[{}]", i);
            validation::validate_non_empty_string(&format!("{}.name", field), &entry.name)?;
            validation::validate_path(&format!("{}.name", field), &entry.name)?;
            // 名稱會成為輸出子目錄，不可跳出 output.path
            if entry.name.contains(['/', '\\']) || entry.name.contains("..") {
                return Err(EstimatorError::InvalidConfigValueError {
                    field: format!("{}.name", field),
                    value: entry.name.clone(),
                    reason: "Estimate names cannot contain path separators or '..'".to_string(),
                });
            }
            if entry.url.contains("://") {
                validation::validate_url(&format!("{}.url", field), &entry.url)?;
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(EstimatorError::ConfigValidationError {
                    field: format!("{}.name", field),
                    message: format!("Duplicate estimate name '{}'", entry.name),
                });
            }
        }

        if let Some(hubspot) = &self.hubspot {
            validation::validate_url("hubspot.base_url", &hubspot.base_url)?;
            validation::validate_non_empty_string("hubspot.portal_id", &hubspot.portal_id)?;
            validation::validate_non_empty_string("hubspot.form_id", &hubspot.form_id)?;
        }

        Ok(())
    }
}

/// Prefixes a bare query string with the share page, when one is configured.
pub fn resolve_source(source: &str, share_base: Option<&str>) -> String {
    let source = source.trim();
    match share_base {
        Some(base) if !source.contains("://") => {
            let query = source.trim_start_matches('?');
            if query.is_empty() {
                base.to_string()
            } else {
                let separator = if base.contains('?') { '&' } else { '?' };
                format!("{}{}{}", base, separator, query)
            }
        }
        _ => source.to_string(),
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// A single estimate resolved from [`TomlConfig`].
#[derive(Debug, Clone)]
pub struct EstimateJob {
    pub name: String,
    pub source: String,
    pub email: Option<String>,
    pub output_path: String,
    pub formats: Vec<String>,
    pub page_size: PageSize,
    pub bundle: bool,
    pub strict: bool,
    pub share_base: Option<String>,
}

impl ConfigProvider for EstimateJob {
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
    }

    fn bundle(&self) -> bool {
        self.bundle
    }

    fn strict(&self) -> bool {
        self.strict
    }
}
