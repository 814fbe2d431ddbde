use crate::dtos::insurance_card::{AnalysisStatusResponse, ALLOWED_CONTENT_TYPES, CARD_FIELD};
use crate::models::CardAnalysis;
use crate::services::{
    card_normalizer, metrics::record_card_analysis, CardDocument, ProviderError,
};
use crate::startup::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::{ValidationError, ValidationErrors};

fn card_error(code: &'static str, message: String) -> AppError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    let mut errors = ValidationErrors::new();
    errors.add(CARD_FIELD, err);
    AppError::ValidationError(errors)
}

/// Pull the card upload out of the form and check its type and size.
async fn read_card(mut multipart: Multipart, max_bytes: usize) -> Result<CardDocument, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some(CARD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("insurance_card").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_ascii_lowercase();

        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(card_error(
                "mimes",
                "The insurance card must be a JPEG, PNG or PDF file".to_string(),
            ));
        }

        let bytes = field.bytes().await.map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e))
        })?;

        if bytes.is_empty() {
            return Err(card_error(
                "required",
                "The insurance card file is empty".to_string(),
            ));
        }
        if bytes.len() > max_bytes {
            return Err(card_error(
                "max",
                format!(
                    "The insurance card may not be larger than {} kilobytes",
                    max_bytes / 1024
                ),
            ));
        }

        return Ok(CardDocument {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(card_error(
        "required",
        "The insurance card field is required".to_string(),
    ))
}

/// Extract and normalise the fields printed on an insurance card.
///
/// A failure reported by the analysis provider is returned as-is with 422;
/// a provider that cannot be reached is a 502.
#[tracing::instrument(skip(state, multipart))]
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let document = read_card(multipart, state.config.max_upload_bytes).await?;
    let provider = state.analysis_provider.name();

    tracing::info!(
        file_name = %document.file_name,
        content_type = %document.content_type,
        size = document.bytes.len(),
        provider,
        "Insurance card analysis started"
    );

    let raw = state
        .analysis_provider
        .analyze(&document)
        .await
        .map_err(|e| {
            record_card_analysis(provider, "upstream_error");
            tracing::error!(error = %e, "Insurance card analysis failed");
            match e {
                ProviderError::NotConfigured(_) => AppError::ServiceUnavailable,
                other => AppError::BadGateway(other.to_string()),
            }
        })?;

    match card_normalizer::normalize(raw) {
        CardAnalysis::Normalized(data) => {
            record_card_analysis(provider, "success");
            tracing::info!(
                fields = data.data.len(),
                confidence = data.confidence,
                "Insurance card normalized"
            );
            Ok((StatusCode::OK, Json(CardAnalysis::Normalized(data))))
        }
        failed @ CardAnalysis::Failed(_) => {
            record_card_analysis(provider, "failed");
            tracing::warn!("Insurance card analysis reported failure");
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(failed)))
        }
    }
}

pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(AnalysisStatusResponse {
        configured: state.analysis_provider.is_configured(),
        provider: state.analysis_provider.name(),
    })
}
