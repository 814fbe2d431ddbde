//! Insurance card extraction records as returned by the document analysis
//! provider, and the normalised card data built from them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A loose `{name, value}` pair picked up from the card layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl FormField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Value::String(value.into()),
        }
    }
}

/// Raw result of a document analysis call.
///
/// `structured_data` keeps the provider's key order. Keys this service does
/// not know about are retained in `extra` so a failed record can be handed
/// back exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExtractionRecord {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_fields: Option<Vec<FormField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawExtractionRecord {
    pub fn succeeded(structured_data: Map<String, Value>, form_fields: Vec<FormField>) -> Self {
        Self {
            success: true,
            structured_data: Some(structured_data),
            form_fields: Some(form_fields),
            confidence: None,
            error: None,
            extra: Map::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            structured_data: None,
            form_fields: None,
            confidence: None,
            error: Some(error.into()),
            extra: Map::new(),
        }
    }
}

/// Card data keyed by canonical field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCardData {
    pub success: bool,
    pub data: BTreeMap<String, String>,
    pub confidence: f64,
    pub processing_method: String,
}

/// Outcome of normalising a raw record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CardAnalysis {
    Normalized(NormalizedCardData),
    /// The provider reported failure; the record is passed through untouched.
    Failed(RawExtractionRecord),
}
