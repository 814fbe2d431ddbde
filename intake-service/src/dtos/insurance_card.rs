use serde::Serialize;

/// Field name of the uploaded card in the multipart form.
pub const CARD_FIELD: &str = "insurance_card";

pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "application/pdf"];

#[derive(Debug, Serialize)]
pub struct AnalysisStatusResponse {
    pub configured: bool,
    pub provider: &'static str,
}
