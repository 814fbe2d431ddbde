use crate::config::split_list;
use crate::models::{Product, ProductFilter};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ProductSearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    /// Comma-separated Q-codes the provider is onboarded with.
    pub onboarded_q_codes: Option<String>,
}

impl ProductSearchParams {
    pub fn into_filter(self) -> ProductFilter {
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        ProductFilter {
            query: non_blank(self.q),
            category: non_blank(self.category),
            q_codes: self.onboarded_q_codes.as_deref().map(split_list),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductSearchResponse {
    pub products: Vec<Product>,
    pub total: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub provider_has_no_products: bool,
}

#[derive(Debug, Serialize)]
pub struct ProviderProductsResponse {
    pub provider_id: i64,
    pub products: Vec<Product>,
    pub q_codes: Vec<String>,
    pub has_products: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_params_are_ignored() {
        let params = ProductSearchParams {
            q: Some("  ".to_string()),
            category: Some(String::new()),
            onboarded_q_codes: None,
        };
        assert_eq!(params.into_filter(), ProductFilter::default());
    }

    #[test]
    fn test_present_but_empty_code_list_restricts_to_nothing() {
        let params = ProductSearchParams {
            onboarded_q_codes: Some(" , ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.into_filter().q_codes, Some(Vec::new()));
    }
}
