use crate::dtos::{AdminEmailRequest, AdminEmailResponse, FailedRecipient};
use crate::extractors::ValidatedJson;
use crate::services::{metrics::record_email, EmailMessage};
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;
use validator::{ValidationError, ValidationErrors};

/// Send a plain-text notification to each admin recipient. One failed
/// recipient does not stop delivery to the rest.
#[tracing::instrument(skip_all)]
pub async fn send_admin_email(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<AdminEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    let recipients = match request.recipients {
        Some(recipients) if !recipients.is_empty() => recipients,
        _ => state.config.notifications.admin_recipients.clone(),
    };

    if recipients.is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("No recipients given and no admin recipients configured".into());
        let mut errors = ValidationErrors::new();
        errors.add("recipients", err);
        return Err(errors.into());
    }

    let mut sent = 0;
    let mut failed = Vec::new();

    for recipient in recipients {
        let message = EmailMessage {
            to: recipient.clone(),
            subject: request.subject.clone(),
            body_text: request.message.clone(),
        };

        match state.email_provider.send(&message).await {
            Ok(_) => {
                sent += 1;
                record_email("sent");
            }
            Err(e) => {
                tracing::warn!(to = %recipient, error = %e, "Admin notification failed");
                record_email("failed");
                failed.push(FailedRecipient {
                    recipient,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        subject = %request.subject,
        sent,
        failed = failed.len(),
        "Admin notification dispatched"
    );

    Ok(Json(AdminEmailResponse { sent, failed }))
}
