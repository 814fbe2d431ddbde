//! In-process reference store for local runs and tests.

use super::ReferenceStore;
use crate::models::{
    Category, DiagnosisCode, MappedDiagnosisCode, Product, ProductFilter, WoundType,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct WoundTypeMapping {
    pub wound_type_code: String,
    pub diagnosis_code: String,
    pub category: Option<String>,
    pub is_required: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceStore {
    pub wound_types: Vec<WoundType>,
    pub diagnosis_codes: Vec<DiagnosisCode>,
    pub mappings: Vec<WoundTypeMapping>,
    pub products: Vec<Product>,
    /// `(provider_id, product_id)` pairs with an active onboarding.
    pub provider_products: Vec<(i64, i64)>,
    /// When set every query fails, to exercise storage error paths.
    pub unavailable: bool,
}

fn category_order(category: &Option<String>) -> String {
    Category::parse(category.as_deref()).as_str().to_string()
}

impl InMemoryReferenceStore {
    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "reference store unavailable"
            )));
        }
        Ok(())
    }

    /// A small catalogue matching the seeded reference tables.
    pub fn seeded() -> Self {
        let wound_type = |code: &str, name: &str| WoundType {
            code: code.to_string(),
            display_name: name.to_string(),
        };
        let diagnosis = |code: &str, description: &str, category: Option<&str>, active: bool| {
            DiagnosisCode {
                code: code.to_string(),
                description: description.to_string(),
                category: category.map(str::to_string),
                specialty: Some("wound_care".to_string()),
                wound_type: None,
                is_active: active,
            }
        };
        let mapping = |wound: &str, code: &str, category: Option<&str>, required: bool| {
            WoundTypeMapping {
                wound_type_code: wound.to_string(),
                diagnosis_code: code.to_string(),
                category: category.map(str::to_string),
                is_required: required,
            }
        };
        let product = |id: i64, name: &str, q_code: &str, category: &str, active: bool| Product {
            id,
            name: name.to_string(),
            sku: Some(format!("SKU-{}", q_code)),
            q_code: Some(q_code.to_string()),
            manufacturer: Some("MedLife Solutions".to_string()),
            category: Some(category.to_string()),
            price_per_sq_cm: Some(Decimal::new(12550, 2)),
            is_active: active,
        };

        Self {
            wound_types: vec![
                wound_type("DFU", "Diabetic Foot Ulcer"),
                wound_type("VLU", "Venous Leg Ulcer"),
                wound_type("PU", "Pressure Ulcer"),
            ],
            diagnosis_codes: vec![
                diagnosis("E11.621", "Type 2 diabetes mellitus with foot ulcer", Some("yellow"), true),
                diagnosis("E10.621", "Type 1 diabetes mellitus with foot ulcer", Some("yellow"), true),
                diagnosis("L97.411", "Non-pressure chronic ulcer of right heel, skin breakdown", Some("orange"), true),
                diagnosis("L97.412", "Non-pressure chronic ulcer of right heel, fat layer exposed", Some("orange"), true),
                diagnosis("I83.013", "Varicose veins of right lower extremity with ulcer of ankle", Some("yellow"), true),
                diagnosis("L89.153", "Pressure ulcer of sacral region, stage 3", None, true),
                diagnosis("E11.9", "Type 2 diabetes mellitus without complications", Some("yellow"), false),
            ],
            mappings: vec![
                mapping("DFU", "E11.621", Some("yellow"), true),
                mapping("DFU", "E10.621", Some("yellow"), true),
                mapping("DFU", "E11.9", Some("yellow"), true),
                mapping("DFU", "L97.411", Some("orange"), true),
                mapping("DFU", "L97.412", Some("orange"), true),
                mapping("VLU", "I83.013", Some("yellow"), true),
                mapping("VLU", "L97.411", Some("orange"), true),
                mapping("PU", "L89.153", None, true),
            ],
            products: vec![
                product(1, "Amnio AMP", "Q4250", "SkinSubstitute", true),
                product(2, "Coll-e-Derm", "Q4193", "SkinSubstitute", true),
                product(3, "Legacy Graft", "Q4100", "SkinSubstitute", false),
                product(4, "Foam Dressing", "A6209", "Dressing", true),
            ],
            provider_products: vec![(10, 1), (10, 3), (10, 4)],
            unavailable: false,
        }
    }
}

#[async_trait]
impl ReferenceStore for InMemoryReferenceStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.check_available()
    }

    async fn wound_types(&self, codes: &[String]) -> Result<Vec<WoundType>, AppError> {
        self.check_available()?;
        Ok(self
            .wound_types
            .iter()
            .filter(|w| codes.contains(&w.code))
            .cloned()
            .collect())
    }

    async fn wound_type_mappings(
        &self,
        codes: &[String],
    ) -> Result<Vec<MappedDiagnosisCode>, AppError> {
        self.check_available()?;
        let mut rows: Vec<MappedDiagnosisCode> = self
            .mappings
            .iter()
            .filter(|m| codes.contains(&m.wound_type_code))
            .filter_map(|m| {
                self.diagnosis_codes
                    .iter()
                    .find(|d| d.code == m.diagnosis_code && d.is_active)
                    .map(|d| MappedDiagnosisCode {
                        wound_type_code: m.wound_type_code.clone(),
                        diagnosis_code: d.code.clone(),
                        category: m.category.clone(),
                        is_required: m.is_required,
                        description: d.description.clone(),
                        specialty: d.specialty.clone(),
                        is_active: d.is_active,
                    })
            })
            .collect();
        rows.sort_by_cached_key(|r| (category_order(&r.category), r.diagnosis_code.clone()));
        Ok(rows)
    }

    async fn active_diagnosis_codes(&self) -> Result<Vec<DiagnosisCode>, AppError> {
        self.check_available()?;
        let mut codes: Vec<DiagnosisCode> = self
            .diagnosis_codes
            .iter()
            .filter(|d| d.is_active)
            .cloned()
            .collect();
        codes.sort_by_cached_key(|d| (category_order(&d.category), d.code.clone()));
        Ok(codes)
    }

    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        self.check_available()?;
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn provider_products(&self, provider_id: i64) -> Result<Vec<Product>, AppError> {
        self.check_available()?;
        let onboarded: HashSet<i64> = self
            .provider_products
            .iter()
            .filter(|(provider, _)| *provider == provider_id)
            .map(|(_, product)| *product)
            .collect();
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|p| p.is_active && onboarded.contains(&p.id))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}
