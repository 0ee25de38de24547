//! HubSpot Forms submission of the shareable estimate URL.

use crate::utils::error::{EstimatorError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.hsforms.com";
pub const DEFAULT_PORTAL_ID: &str = "3983149";
pub const DEFAULT_FORM_ID: &str = "a2c21e81-1915-4b3d-a858-9aadfe08b542";
pub const DEFAULT_REGION: &str = "na1";
pub const URL_FIELD: &str = "hardware_estimate_url";
const CONTACT_OBJECT_TYPE: &str = "0-1";
const PAGE_NAME: &str = "Sighthound hardware estimate";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_portal_id() -> String {
    DEFAULT_PORTAL_ID.to_string()
}

fn default_form_id() -> String {
    DEFAULT_FORM_ID.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_url_field() -> String {
    URL_FIELD.to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    250
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubSpotConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_portal_id")]
    pub portal_id: String,
    #[serde(default = "default_form_id")]
    pub form_id: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Form field that receives the estimate URL; may be namespaced.
    #[serde(default = "default_url_field")]
    pub url_field: String,
    /// Field names declared on the form. When set, the URL field is looked
    /// up among them with [`resolve_url_field`].
    #[serde(default)]
    pub form_fields: Vec<String>,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for HubSpotConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            portal_id: default_portal_id(),
            form_id: default_form_id(),
            region: default_region(),
            url_field: default_url_field(),
            form_fields: Vec::new(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl HubSpotConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_retry_delay_ms(mut self, ms: u64) -> Self {
        self.retry_delay_ms = ms;
        self
    }

    pub fn with_form_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.form_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Name of the field that receives the estimate URL.
    pub fn estimate_url_field(&self) -> &str {
        if self.form_fields.is_empty() {
            return &self.url_field;
        }
        resolve_url_field(self.form_fields.iter().map(String::as_str)).unwrap_or_else(|| {
            tracing::debug!(
                "No form field matches {}, using '{}'",
                URL_FIELD,
                self.url_field
            );
            self.url_field.as_str()
        })
    }

    pub fn submit_endpoint(&self) -> String {
        format!(
            "{}/submissions/v3/integration/submit/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.portal_id,
            self.form_id
        )
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Picks the form field that should carry the estimate URL: an exact
/// `hardware_estimate_url`, then a namespaced `.../hardware_estimate_url`,
/// then any name containing it.
pub fn resolve_url_field<'a, I>(field_names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = field_names.into_iter().collect();
    let suffix = format!("/{}", URL_FIELD);

    names
        .iter()
        .find(|n| **n == URL_FIELD)
        .or_else(|| names.iter().find(|n| n.ends_with(&suffix)))
        .or_else(|| names.iter().find(|n| n.contains(URL_FIELD)))
        .copied()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionField<'a> {
    object_type_id: &'static str,
    name: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionContext<'a> {
    page_uri: &'a str,
    page_name: &'static str,
}

#[derive(Debug, Serialize)]
struct SubmissionPayload<'a> {
    fields: Vec<SubmissionField<'a>>,
    context: SubmissionContext<'a>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionResponse {
    inline_message: Option<String>,
    redirect_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub status: u16,
    pub attempts: u32,
    pub inline_message: Option<String>,
    pub redirect_uri: Option<String>,
}

pub struct HubSpotClient {
    config: HubSpotConfig,
    client: Client,
}

impl HubSpotClient {
    pub fn new(config: HubSpotConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &HubSpotConfig {
        &self.config
    }

    /// Submits the email with the estimate URL. Transport errors and 5xx
    /// responses are retried; 4xx responses fail immediately.
    pub async fn submit_estimate(&self, email: &str, estimate_url: &str) -> Result<SubmissionReceipt> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(EstimatorError::ValidationError {
                message: format!("'{}' is not a valid email address", email),
            });
        }

        let payload = SubmissionPayload {
            fields: vec![
                SubmissionField {
                    object_type_id: CONTACT_OBJECT_TYPE,
                    name: "email",
                    value: email,
                },
                SubmissionField {
                    object_type_id: CONTACT_OBJECT_TYPE,
                    name: self.config.estimate_url_field(),
                    value: estimate_url,
                },
            ],
            context: SubmissionContext {
                page_uri: estimate_url,
                page_name: PAGE_NAME,
            },
        };

        let endpoint = self.config.submit_endpoint();
        let max_attempts = self.config.retry_attempts.max(1);

        for attempt in 1..=max_attempts {
            tracing::debug!("📨 Submitting estimate to {} (attempt {}/{})", endpoint, attempt, max_attempts);
            let last = attempt == max_attempts;

            match self.client.post(&endpoint).json(&payload).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = read_body(response).await;
                        let parsed: Option<SubmissionResponse> = serde_json::from_str(&body).ok();
                        tracing::info!("✅ Estimate URL submitted to HubSpot form {}", self.config.form_id);
                        return Ok(SubmissionReceipt {
                            status: status.as_u16(),
                            attempts: attempt,
                            inline_message: parsed.as_ref().and_then(|r| r.inline_message.clone()),
                            redirect_uri: parsed.and_then(|r| r.redirect_uri),
                        });
                    }

                    let body = read_body(response).await;
                    if status.is_client_error() || last {
                        return Err(rejection(status, body));
                    }
                    tracing::warn!("⚠️ HubSpot returned {}, retrying", status);
                }
                Err(e) => {
                    if last {
                        return Err(EstimatorError::ApiError(e));
                    }
                    tracing::warn!("⚠️ HubSpot request failed: {}, retrying", e);
                }
            }

            tokio::time::sleep(self.config.retry_delay()).await;
        }

        Err(EstimatorError::ProcessingError {
            message: "form submission was not attempted".to_string(),
        })
    }
}

async fn read_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!("Failed to read HubSpot response body: {}", e);
            String::new()
        }
    }
}

fn rejection(status: StatusCode, body: String) -> EstimatorError {
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        body
    };
    EstimatorError::FormSubmissionError {
        status: status.as_u16(),
        message,
    }
}
