use leadsift_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    /// Missing API key or an unusable setting.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failure or timeout talking to an API.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx answer from an API.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Lead input that cannot be turned into a site.
    #[error("Invalid lead: {0}")]
    InvalidLead(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
}

impl EnrichError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, EnrichError::Api { status: 429, .. })
    }
}

impl From<reqwest::Error> for EnrichError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            EnrichError::Parse(e.to_string())
        } else {
            EnrichError::Network(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrichError>;
