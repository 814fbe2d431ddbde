use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AdminEmailRequest {
    #[validate(length(min = 1, max = 255, message = "Subject is required"))]
    pub subject: String,

    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,

    /// Defaults to the configured admin recipients.
    #[validate(custom(function = "validate_recipients"))]
    pub recipients: Option<Vec<String>>,
}

fn validate_recipients(recipients: &Vec<String>) -> Result<(), validator::ValidationError> {
    for recipient in recipients {
        if !validator::ValidateEmail::validate_email(recipient) {
            let mut err = validator::ValidationError::new("email");
            err.message = Some(format!("'{}' is not a valid email address", recipient).into());
            err.add_param("value".into(), recipient);
            return Err(err);
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct FailedRecipient {
    pub recipient: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct AdminEmailResponse {
    pub sent: usize,
    pub failed: Vec<FailedRecipient>,
}
