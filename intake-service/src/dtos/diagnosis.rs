use crate::models::{Category, CodeEntry, GroupedCodeResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct WoundTypeCodesRequest {
    /// Missing and empty lists are both reported as a validation error.
    #[serde(default)]
    pub wound_types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct WoundTypeCodesResponse {
    pub codes: BTreeMap<Category, Vec<CodeEntry>>,
    pub requirements: Vec<String>,
    pub wound_types: Vec<String>,
}

impl From<GroupedCodeResult> for WoundTypeCodesResponse {
    fn from(result: GroupedCodeResult) -> Self {
        Self {
            codes: result.codes,
            requirements: result.requirements,
            wound_types: result.wound_types.into_iter().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AllDiagnosisCodesResponse {
    pub codes: BTreeMap<Category, Vec<CodeEntry>>,
}
