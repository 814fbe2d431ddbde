//! Read-only access to the reference tables.

pub mod memory;
pub mod postgres;

use crate::models::{DiagnosisCode, MappedDiagnosisCode, Product, ProductFilter, WoundType};
use async_trait::async_trait;
use service_core::error::AppError;

pub use memory::InMemoryReferenceStore;
pub use postgres::PgReferenceStore;

/// Reference data queries used by the handlers.
///
/// Each call is a single read with no retry; failures surface as
/// [`AppError::DatabaseError`].
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    /// Wound types among `codes` that exist in the reference table.
    async fn wound_types(&self, codes: &[String]) -> Result<Vec<WoundType>, AppError>;

    /// Active diagnosis codes mapped to any of the given wound types, ordered
    /// by category then code.
    async fn wound_type_mappings(
        &self,
        codes: &[String],
    ) -> Result<Vec<MappedDiagnosisCode>, AppError>;

    /// Every active diagnosis code, ordered by category then code.
    async fn active_diagnosis_codes(&self) -> Result<Vec<DiagnosisCode>, AppError>;

    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError>;

    /// Active products the provider is actively onboarded with.
    async fn provider_products(&self, provider_id: i64) -> Result<Vec<Product>, AppError>;
}
