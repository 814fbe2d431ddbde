use crate::dtos::{AllDiagnosisCodesResponse, WoundTypeCodesRequest, WoundTypeCodesResponse};
use crate::extractors::AppJson;
use crate::services::{diagnosis, metrics::record_diagnosis_lookup};
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;
use std::collections::HashMap;

/// Diagnosis codes for the selected wound types, grouped by category, with
/// the documentation requirements those wound types impose.
#[tracing::instrument(skip(state))]
pub async fn by_wound_types(
    State(state): State<AppState>,
    AppJson(request): AppJson<WoundTypeCodesRequest>,
) -> Result<impl IntoResponse, AppError> {
    let requested: Vec<String> = request
        .wound_types
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let known: HashMap<String, String> = if requested.is_empty() {
        HashMap::new()
    } else {
        state
            .store
            .wound_types(&requested)
            .await
            .inspect_err(|_| record_diagnosis_lookup("by_wound_types", "error"))?
            .into_iter()
            .map(|w| (w.code, w.display_name))
            .collect()
    };

    let wound_types = diagnosis::validate_wound_types(&request.wound_types, &known)
        .inspect_err(|_| record_diagnosis_lookup("by_wound_types", "invalid"))?;

    let codes: Vec<String> = wound_types.iter().cloned().collect();
    let rows = state
        .store
        .wound_type_mappings(&codes)
        .await
        .inspect_err(|_| record_diagnosis_lookup("by_wound_types", "error"))?;

    let result = diagnosis::aggregate(wound_types, &known, rows);

    tracing::info!(
        wound_types = result.wound_types.len(),
        requirements = result.requirements.len(),
        "Diagnosis codes grouped"
    );
    record_diagnosis_lookup("by_wound_types", "ok");

    Ok(Json(WoundTypeCodesResponse::from(result)))
}

/// Every active diagnosis code grouped by category.
#[tracing::instrument(skip(state))]
pub async fn list_all(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let codes = state
        .store
        .active_diagnosis_codes()
        .await
        .inspect_err(|_| record_diagnosis_lookup("list_all", "error"))?;

    record_diagnosis_lookup("list_all", "ok");

    Ok(Json(AllDiagnosisCodesResponse {
        codes: diagnosis::list_all(codes),
    }))
}
