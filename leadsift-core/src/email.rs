//! LeadMagic client: email validation and discovery.
//!
//! Both endpoints also return whatever firmographics LeadMagic knows about
//! the email's company, which is carried along as [`CompanyInfo`].

use crate::config::EnrichConfig;
use crate::error::{EnrichError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const SOURCE: &str = "leadmagic";

/// Company firmographics attached to a LeadMagic answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub founded: String,
    pub linkedin_url: String,
    pub linkedin_id: String,
    pub facebook_url: String,
    pub twitter_url: String,
    pub company_type: String,
    pub mx_provider: String,
    pub is_domain_catch_all: bool,
}

impl CompanyInfo {
    fn from_response(body: &Value) -> Self {
        let linkedin = text(body, "company_linkedin_url");
        Self {
            name: text(body, "company_name"),
            industry: text(body, "company_industry"),
            size: text(body, "company_size"),
            founded: text(body, "company_founded"),
            // LeadMagic returns the profile without a scheme
            linkedin_url: if linkedin.is_empty() || linkedin.starts_with("http") {
                linkedin
            } else {
                format!("https://{}", linkedin)
            },
            linkedin_id: text(body, "company_linkedin_id"),
            facebook_url: text(body, "company_facebook_url"),
            twitter_url: text(body, "company_twitter_url"),
            company_type: text(body, "company_type"),
            mx_provider: text(body, "mx_provider"),
            is_domain_catch_all: body
                .get("is_domain_catch_all")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// String-ish field of a JSON body; numbers are rendered, null is empty.
fn text(body: &Value, key: &str) -> String {
    match body.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailValidation {
    pub is_valid: bool,
    pub status: String,
    pub company: CompanyInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailFinding {
    pub email: Option<String>,
    pub confidence: f64,
    pub company: CompanyInfo,
}

/// Final email state for a lead after validation and, if needed, discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailOutcome {
    pub email: Option<String>,
    pub is_valid: bool,
    pub validation_status: String,
    pub validation_source: String,
    pub company: CompanyInfo,
}

impl Default for EmailOutcome {
    fn default() -> Self {
        Self {
            email: None,
            is_valid: false,
            validation_status: "not_provided".to_string(),
            validation_source: "none".to_string(),
            company: CompanyInfo::default(),
        }
    }
}

impl EmailOutcome {
    /// Outcome recorded when the service is not configured at all.
    pub fn skipped(email: Option<&str>) -> Self {
        Self {
            email: email.map(String::from),
            validation_status: "skipped".to_string(),
            ..Default::default()
        }
    }

    fn errored(mut self) -> Self {
        self.is_valid = false;
        self.validation_status = "error".to_string();
        self.validation_source = SOURCE.to_string();
        self
    }
}

#[derive(Clone)]
pub struct EmailService {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl EmailService {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: crate::config::DEFAULT_LEADMAGIC_BASE_URL.to_string(),
        }
    }

    /// `None` when no LeadMagic key is configured.
    pub fn from_config(config: &EnrichConfig) -> Option<Self> {
        config
            .leadmagic_api_key
            .as_ref()
            .map(|key| Self::new(key.clone()).with_base_url(&config.leadmagic_base_url))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn post(&self, endpoint: &str, body: Value) -> Result<Value> {
        if self.api_key.is_empty() {
            return Err(EnrichError::Config("LeadMagic API key is not configured".into()));
        }

        let response = self
            .http_client
            .post(format!("{}/{}", self.base_url, endpoint))
            .header("X-API-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, endpoint, "LeadMagic request failed");
                EnrichError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %message, endpoint, "LeadMagic API error");
            return Err(EnrichError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| EnrichError::Parse(e.to_string()))?;
        debug!(endpoint, response = %value, "LeadMagic response");
        Ok(value)
    }

    pub async fn validate_email(&self, email: &str) -> Result<EmailValidation> {
        let body = self.post("email-validate", json!({ "email": email })).await?;

        let status = text(&body, "email_status");
        Ok(EmailValidation {
            is_valid: matches!(status.as_str(), "valid" | "valid_catch_all"),
            status: if status.is_empty() { "unknown".to_string() } else { status },
            company: CompanyInfo::from_response(&body),
        })
    }

    pub async fn find_email(
        &self,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> Result<EmailFinding> {
        let body = self
            .post(
                "email-finder",
                json!({
                    "first_name": first_name,
                    "last_name": last_name,
                    "domain": domain,
                }),
            )
            .await?;

        let email = text(&body, "email");
        Ok(EmailFinding {
            email: (!email.is_empty()).then_some(email),
            confidence: body.get("confidence").and_then(Value::as_f64).unwrap_or(0.0),
            company: CompanyInfo::from_response(&body),
        })
    }

    /// Validate the lead's email; when it is missing or invalid, look one up
    /// by name and domain and validate that instead. Never fails: API errors
    /// end up as `validation_status = "error"`.
    pub async fn process_email(
        &self,
        contact_email: Option<&str>,
        first_name: &str,
        last_name: &str,
        domain: &str,
    ) -> EmailOutcome {
        let mut outcome = EmailOutcome {
            email: contact_email.map(String::from),
            ..Default::default()
        };

        if let Some(email) = contact_email {
            outcome = match self.validate_email(email).await {
                Ok(validation) => EmailOutcome {
                    is_valid: validation.is_valid,
                    validation_status: validation.status,
                    validation_source: SOURCE.to_string(),
                    company: validation.company,
                    ..outcome
                },
                Err(e) => {
                    warn!("Validating {} failed: {}", email, e);
                    outcome.errored()
                }
            };
        }

        if outcome.is_valid {
            return outcome;
        }

        let finding = match self.find_email(first_name, last_name, domain).await {
            Ok(finding) => finding,
            Err(e) => {
                warn!("Email lookup for {} {} at {} failed: {}", first_name, last_name, domain, e);
                return outcome.errored();
            }
        };

        let Some(email) = finding.email else {
            outcome.company = finding.company;
            return outcome;
        };

        match self.validate_email(&email).await {
            Ok(validation) => EmailOutcome {
                email: Some(email),
                is_valid: validation.is_valid,
                validation_status: validation.status,
                validation_source: SOURCE.to_string(),
                company: if validation.company == CompanyInfo::default() {
                    finding.company
                } else {
                    validation.company
                },
            },
            Err(e) => {
                warn!("Validating found email {} failed: {}", email, e);
                EmailOutcome {
                    email: Some(email),
                    ..outcome
                }
                .errored()
            }
        }
    }
}
