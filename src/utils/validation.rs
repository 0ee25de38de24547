use crate::utils::error::{EstimatorError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Upper bound accepted by the guided form for cameras and per-camera costs.
pub const GUIDED_MAX: f64 = 10_000.0;

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EstimatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" | "file" => Ok(()),
            scheme => Err(EstimatorError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EstimatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EstimatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EstimatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EstimatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EstimatorError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_output_formats(field_name: &str, formats: &[String]) -> Result<()> {
    let valid_formats = ["pdf", "svg", "json", "csv"];
    for format in formats {
        if !valid_formats.contains(&format.as_str()) {
            return Err(EstimatorError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: format.clone(),
                reason: format!(
                    "Unsupported format. Valid formats: {}",
                    valid_formats.join(", ")
                ),
            });
        }
    }
    Ok(())
}

/// Guided-form checks: the camera count must be a whole number in 1..=10,000
/// and both per-camera costs within $1..=$10,000.
pub fn validate_guided_inputs(cameras: f64, smart_cost: f64, ip_cost: f64) -> Result<()> {
    if !cameras.is_finite() || cameras.fract() != 0.0 || !(1.0..=GUIDED_MAX).contains(&cameras) {
        return Err(EstimatorError::ValidationError {
            message: "Enter a whole number between 1 and 10,000.".to_string(),
        });
    }

    for cost in [smart_cost, ip_cost] {
        if !cost.is_finite() || !(1.0..=GUIDED_MAX).contains(&cost) {
            return Err(EstimatorError::ValidationError {
                message: "Enter a value between $1.00 and $10,000.00.".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("estimator.base_url", "https://example.com/live.html").is_ok());
        assert!(validate_url("estimator.base_url", "http://example.com").is_ok());
        assert!(validate_url("estimator.base_url", "").is_err());
        assert!(validate_url("estimator.base_url", "invalid-url").is_err());
        assert!(validate_url("estimator.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("cameras", 50, 1, 10_000).is_ok());
        assert!(validate_range("cameras", 0, 1, 10_000).is_err());
        assert!(validate_range("smart_cost", 10_000.5, 1.0, 10_000.0).is_err());
    }

    #[test]
    fn test_validate_output_formats() {
        let formats = vec!["pdf".to_string(), "svg".to_string()];
        assert!(validate_output_formats("output.formats", &formats).is_ok());

        let invalid = vec!["docx".to_string()];
        assert!(validate_output_formats("output.formats", &invalid).is_err());
    }

    #[test]
    fn test_guided_inputs() {
        assert!(validate_guided_inputs(50.0, 3000.0, 250.0).is_ok());
        assert!(validate_guided_inputs(10_000.0, 10_000.0, 1.0).is_ok());
        assert!(validate_guided_inputs(0.0, 3000.0, 250.0).is_err());
        assert!(validate_guided_inputs(12.5, 3000.0, 250.0).is_err());
        assert!(validate_guided_inputs(10_001.0, 3000.0, 250.0).is_err());
        assert!(validate_guided_inputs(50.0, 0.5, 250.0).is_err());
        assert!(validate_guided_inputs(50.0, 3000.0, f64::NAN).is_err());
    }
}
