use crate::dtos::{ProductSearchParams, ProductSearchResponse, ProviderProductsResponse};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

/// Search the active catalog, optionally restricted to a provider's
/// onboarded Q-codes.
#[tracing::instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<ProductSearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.into_filter();

    if matches!(&filter.q_codes, Some(codes) if codes.is_empty()) {
        return Ok(Json(ProductSearchResponse {
            products: Vec::new(),
            total: 0,
            provider_has_no_products: true,
        }));
    }

    let products = state.store.search_products(&filter).await?;

    Ok(Json(ProductSearchResponse {
        total: products.len(),
        products,
        provider_has_no_products: false,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn provider_products(
    State(state): State<AppState>,
    Path(provider_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let products = state.store.provider_products(provider_id).await?;

    let mut q_codes: Vec<String> = products.iter().filter_map(|p| p.q_code.clone()).collect();
    q_codes.sort();
    q_codes.dedup();

    Ok(Json(ProviderProductsResponse {
        provider_id,
        has_products: !products.is_empty(),
        products,
        q_codes,
    }))
}
