use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog product identified by its billing Q-code.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub sku: Option<String>,
    pub q_code: Option<String>,
    pub manufacturer: Option<String>,
    pub category: Option<String>,
    pub price_per_sq_cm: Option<Decimal>,
    pub is_active: bool,
}

/// Catalog search criteria. All present criteria must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive substring match on name, SKU or Q-code.
    pub query: Option<String>,
    pub category: Option<String>,
    /// Restrict to these Q-codes. `Some(vec![])` matches nothing.
    pub q_codes: Option<Vec<String>>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if !product.is_active {
            return false;
        }

        if let Some(q_codes) = &self.q_codes {
            match &product.q_code {
                Some(code) if q_codes.iter().any(|c| c == code) => {}
                _ => return false,
            }
        }

        if let Some(category) = &self.category {
            if product.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }

        if let Some(query) = &self.query {
            let needle = query.to_lowercase();
            let hit = |field: Option<&str>| {
                field
                    .map(|f| f.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            };
            if !(hit(Some(&product.name)) || hit(product.sku.as_deref()) || hit(product.q_code.as_deref()))
            {
                return false;
            }
        }

        true
    }
}
