pub mod diagnosis_codes;
pub mod health;
pub mod insurance_card;
pub mod notifications;
pub mod products;

pub use health::{health_check, metrics, readiness_check};
