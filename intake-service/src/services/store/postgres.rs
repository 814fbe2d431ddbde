//! PostgreSQL reference store.

use super::ReferenceStore;
use crate::models::{DiagnosisCode, MappedDiagnosisCode, Product, ProductFilter, WoundType};
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

const PRODUCT_COLUMNS: &str =
    "p.id, p.name, p.sku, p.q_code, p.manufacturer, p.category, p.price_per_sq_cm, p.is_active";

/// Connection pool wrapper.
#[derive(Clone)]
pub struct PgReferenceStore {
    pool: PgPool,
}

impl PgReferenceStore {
    /// Create a new connection pool.
    #[instrument(skip(database_url), fields(service = "intake-service"))]
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

/// `ILIKE` pattern matching `needle` literally anywhere in the column.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn query_failed(query: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::DatabaseError(anyhow::anyhow!("Failed to {}: {}", query, e))
}

#[async_trait]
impl ReferenceStore for PgReferenceStore {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(query_failed("run health check"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn wound_types(&self, codes: &[String]) -> Result<Vec<WoundType>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["wound_types"])
            .start_timer();

        let rows = sqlx::query_as::<_, WoundType>(
            r#"
            SELECT code, display_name
            FROM wound_types
            WHERE code = ANY($1)
            ORDER BY sort_order, code
            "#,
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("load wound types"))?;

        timer.observe_duration();
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn wound_type_mappings(
        &self,
        codes: &[String],
    ) -> Result<Vec<MappedDiagnosisCode>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["wound_type_mappings"])
            .start_timer();

        let rows = sqlx::query_as::<_, MappedDiagnosisCode>(
            r#"
            SELECT m.wound_type_code, m.diagnosis_code, m.category, m.is_required,
                   d.description, d.specialty, d.is_active
            FROM wound_type_diagnosis_codes m
            JOIN diagnosis_codes d ON d.code = m.diagnosis_code
            WHERE m.wound_type_code = ANY($1)
              AND d.is_active = TRUE
            ORDER BY m.category NULLS FIRST, d.code
            "#,
        )
        .bind(codes)
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("load wound type mappings"))?;

        timer.observe_duration();
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn active_diagnosis_codes(&self) -> Result<Vec<DiagnosisCode>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["active_diagnosis_codes"])
            .start_timer();

        let rows = sqlx::query_as::<_, DiagnosisCode>(
            r#"
            SELECT code, description, category, specialty, wound_type, is_active
            FROM diagnosis_codes
            WHERE is_active = TRUE
            ORDER BY category NULLS FIRST, code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed("load diagnosis codes"))?;

        timer.observe_duration();
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["search_products"])
            .start_timer();

        let pattern = filter.query.as_deref().map(contains_pattern);
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            WHERE p.is_active = TRUE
              AND ($1::text IS NULL
                   OR p.name ILIKE $1 ESCAPE '\'
                   OR p.sku ILIKE $1 ESCAPE '\'
                   OR p.q_code ILIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR p.category = $2)
              AND ($3::text[] IS NULL OR p.q_code = ANY($3))
            ORDER BY p.name
            "#
        );

        let rows = sqlx::query_as::<_, Product>(&sql)
            .bind(pattern)
            .bind(&filter.category)
            .bind(&filter.q_codes)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("search products"))?;

        timer.observe_duration();
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn provider_products(&self, provider_id: i64) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["provider_products"])
            .start_timer();

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN provider_products pp ON pp.product_id = p.id
            WHERE pp.provider_id = $1
              AND pp.onboarding_status = 'active'
              AND p.is_active = TRUE
            ORDER BY p.name
            "#
        );

        let rows = sqlx::query_as::<_, Product>(&sql)
            .bind(provider_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed("load provider products"))?;

        timer.observe_duration();
        Ok(rows)
    }
}
