pub mod analysis;
pub mod email;

use crate::models::RawExtractionRecord;
use async_trait::async_trait;
use thiserror::Error;

pub use analysis::{HttpAnalysisProvider, MockAnalysisProvider};
pub use email::{MockEmailProvider, SmtpProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Upstream error: status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// An uploaded insurance card image or PDF.
#[derive(Debug, Clone)]
pub struct CardDocument {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
}

/// Extracts fields from insurance card documents.
#[async_trait]
pub trait DocumentAnalysisProvider: Send + Sync {
    /// Returns the provider's raw extraction record. A record with
    /// `success: false` is a provider-reported failure, not an `Err`.
    async fn analyze(&self, document: &CardDocument)
        -> Result<RawExtractionRecord, ProviderError>;
    fn is_configured(&self) -> bool;
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Sends one message and returns the provider's message id, if any.
    async fn send(&self, email: &EmailMessage) -> Result<Option<String>, ProviderError>;
    fn is_enabled(&self) -> bool;
}
