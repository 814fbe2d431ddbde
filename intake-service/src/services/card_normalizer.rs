//! Insurance card field normalisation.
//!
//! Document analysis providers name the same card field in different ways
//! (`member_id`, `subscriber_id`, ...). This module re-keys a raw extraction
//! result into the canonical vocabulary used by order forms.

use crate::models::{CardAnalysis, NormalizedCardData, RawExtractionRecord};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub const PROCESSING_METHOD: &str = "document_intelligence_normalized";
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Canonical output field names.
pub mod fields {
    pub const PATIENT_NAME: &str = "patient_name";
    pub const PATIENT_FIRST_NAME: &str = "patient_first_name";
    pub const PATIENT_LAST_NAME: &str = "patient_last_name";
    pub const PATIENT_DOB: &str = "patient_dob";
    pub const PATIENT_MEMBER_ID: &str = "patient_member_id";
    pub const PAYER_NAME: &str = "payer_name";
    pub const PRIMARY_INSURANCE_NAME: &str = "primary_insurance_name";
    pub const GROUP_NUMBER: &str = "group_number";
    pub const PRIMARY_POLICY_NUMBER: &str = "primary_policy_number";
    pub const PRIMARY_PAYER_PHONE: &str = "primary_payer_phone";
}

use fields::*;

/// Provider field name -> canonical field name. Unlisted names pass through.
pub const FIELD_TRANSLATIONS: &[(&str, &str)] = &[
    ("member_name", PATIENT_NAME),
    ("patient_name", PATIENT_NAME),
    ("first_name", PATIENT_FIRST_NAME),
    ("last_name", PATIENT_LAST_NAME),
    ("date_of_birth", PATIENT_DOB),
    ("dob", PATIENT_DOB),
    ("member_id", PATIENT_MEMBER_ID),
    ("subscriber_id", PATIENT_MEMBER_ID),
    ("insurance_company", PAYER_NAME),
    ("payer_name", PAYER_NAME),
    ("insurance_name", PRIMARY_INSURANCE_NAME),
    ("plan_name", PRIMARY_INSURANCE_NAME),
    ("group_number", GROUP_NUMBER),
    ("policy_number", PRIMARY_POLICY_NUMBER),
    ("member_number", PRIMARY_POLICY_NUMBER),
    ("customer_service", PRIMARY_PAYER_PHONE),
    ("phone", PRIMARY_PAYER_PHONE),
    ("payer_phone", PRIMARY_PAYER_PHONE),
];

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// An input name may appear only once, and an input that is also a canonical
/// output must translate to itself so translation is idempotent.
const fn table_is_consistent(table: &[(&str, &str)]) -> bool {
    let mut i = 0;
    while i < table.len() {
        let mut j = 0;
        while j < table.len() {
            if i != j && str_eq(table[i].0, table[j].0) {
                return false;
            }
            if str_eq(table[i].0, table[j].1) && !str_eq(table[i].0, table[i].1) {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(
    table_is_consistent(FIELD_TRANSLATIONS),
    "FIELD_TRANSLATIONS has a duplicate or conflicting entry"
);

static TRANSLATIONS: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| FIELD_TRANSLATIONS.iter().copied().collect());

pub fn translate_field(name: &str) -> &str {
    TRANSLATIONS.get(name).copied().unwrap_or(name)
}

/// Scalar values as text; empty strings, nulls and containers yield `None`.
fn non_empty_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Re-key a raw extraction result.
///
/// Structured data is applied first, later keys overwriting earlier ones
/// that translate to the same field. Form fields only fill gaps, and the
/// first occurrence of a name wins. A failed record is returned untouched.
pub fn normalize(raw: RawExtractionRecord) -> CardAnalysis {
    if !raw.success {
        return CardAnalysis::Failed(raw);
    }

    let mut data = BTreeMap::new();

    for (key, value) in raw.structured_data.iter().flatten() {
        if let Some(text) = non_empty_text(value) {
            data.insert(translate_field(key).to_string(), text);
        }
    }

    for field in raw.form_fields.iter().flatten() {
        if let Some(text) = non_empty_text(&field.value) {
            data.entry(translate_field(&field.name).to_string())
                .or_insert(text);
        }
    }

    apply_derived_fields(&mut data);

    CardAnalysis::Normalized(NormalizedCardData {
        success: true,
        data,
        confidence: raw.confidence.unwrap_or(DEFAULT_CONFIDENCE),
        processing_method: PROCESSING_METHOD.to_string(),
    })
}

fn apply_derived_fields(data: &mut BTreeMap<String, String>) {
    if !data.contains_key(PATIENT_NAME) {
        let full_name = match (data.get(PATIENT_FIRST_NAME), data.get(PATIENT_LAST_NAME)) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last).trim().to_string()),
            _ => None,
        };
        if let Some(name) = full_name {
            data.insert(PATIENT_NAME.to_string(), name);
        }
    }

    if !data.contains_key(PRIMARY_INSURANCE_NAME) {
        if let Some(payer) = data.get(PAYER_NAME).cloned() {
            data.insert(PRIMARY_INSURANCE_NAME.to_string(), payer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FormField;
    use serde_json::{json, Map};

    fn structured(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn normalized(raw: RawExtractionRecord) -> NormalizedCardData {
        match normalize(raw) {
            CardAnalysis::Normalized(card) => card,
            CardAnalysis::Failed(raw) => panic!("unexpected failure: {:?}", raw),
        }
    }

    #[test]
    fn test_member_name_maps_to_patient_name() {
        let card = normalized(RawExtractionRecord::succeeded(
            structured(json!({"member_name": "Jane Doe"})),
            vec![],
        ));
        assert_eq!(card.data[PATIENT_NAME], "Jane Doe");
        assert!(card.success);
        assert_eq!(card.processing_method, PROCESSING_METHOD);
    }

    #[test]
    fn test_patient_name_derived_from_parts() {
        let card = normalized(RawExtractionRecord::succeeded(
            structured(json!({"first_name": "Jane", "last_name": "Doe"})),
            vec![],
        ));
        assert_eq!(card.data[PATIENT_NAME], "Jane Doe");
        assert_eq!(card.data[PATIENT_FIRST_NAME], "Jane");
        assert_eq!(card.data[PATIENT_LAST_NAME], "Doe");
    }

    #[test]
    fn test_derived_name_does_not_replace_extracted_one() {
        let card = normalized(RawExtractionRecord::succeeded(
            structured(json!({"first_name": "Jane", "last_name": "Doe", "member_name": "JANE Q DOE"})),
            vec![],
        ));
        assert_eq!(card.data[PATIENT_NAME], "JANE Q DOE");
    }

    #[test]
    fn test_first_form_field_wins() {
        let card = normalized(RawExtractionRecord::succeeded(
            Map::new(),
            vec![
                FormField::new("phone", "555-1111"),
                FormField::new("phone", "555-2222"),
            ],
        ));
        assert_eq!(card.data[PRIMARY_PAYER_PHONE], "555-1111");
    }

    #[test]
    fn test_structured_data_beats_form_fields() {
        let card = normalized(RawExtractionRecord::succeeded(
            structured(json!({"payer_phone": "555-0000"})),
            vec![FormField::new("phone", "555-9999")],
        ));
        assert_eq!(card.data[PRIMARY_PAYER_PHONE], "555-0000");
    }

    #[test]
    fn test_later_structured_key_overwrites_earlier() {
        let card = normalized(RawExtractionRecord::succeeded(
            structured(json!({"customer_service": "800-111-0000", "payer_phone": "800-222-0000"})),
            vec![],
        ));
        assert_eq!(card.data[PRIMARY_PAYER_PHONE], "800-222-0000");
    }

    #[test]
    fn test_empty_values_never_written_or_overwrite() {
        let card = normalized(RawExtractionRecord::succeeded(
            structured(json!({"member_id": "W123", "subscriber_id": "", "group_number": ""})),
            vec![
                FormField::new("dob", ""),
                FormField::new("dob", "1970-01-01"),
                FormField::new("member_id", ""),
            ],
        ));
        assert_eq!(card.data[PATIENT_MEMBER_ID], "W123");
        assert!(!card.data.contains_key(GROUP_NUMBER));
        // an empty first occurrence does not block a later non-empty one
        assert_eq!(card.data[PATIENT_DOB], "1970-01-01");
    }

    #[test]
    fn test_whitespace_values_are_not_empty() {
        let card = normalized(RawExtractionRecord::succeeded(
            structured(json!({"group_number": " "})),
            vec![FormField::new("group_number", "G-1")],
        ));
        assert_eq!(card.data[GROUP_NUMBER], " ");
    }

    #[test]
    fn test_failure_is_passed_through_untouched() {
        let mut raw = RawExtractionRecord::failed("model timeout");
        raw.extra.insert("status".to_string(), json!(504));

        match normalize(raw.clone()) {
            CardAnalysis::Failed(returned) => assert_eq!(returned, raw),
            CardAnalysis::Normalized(_) => panic!("failure must not be normalised"),
        }

        let json = serde_json::to_value(CardAnalysis::Failed(raw)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["status"], 504);
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_payer_name_fills_insurance_name() {
        let card = normalized(RawExtractionRecord::succeeded(
            structured(json!({"insurance_company": "Acme Health"})),
            vec![],
        ));
        assert_eq!(card.data[PAYER_NAME], "Acme Health");
        assert_eq!(card.data[PRIMARY_INSURANCE_NAME], "Acme Health");

        let card = normalized(RawExtractionRecord::succeeded(
            structured(json!({"insurance_company": "Acme Health", "plan_name": "Acme Gold PPO"})),
            vec![],
        ));
        assert_eq!(card.data[PRIMARY_INSURANCE_NAME], "Acme Gold PPO");
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let card = normalized(RawExtractionRecord::succeeded(
            structured(json!({"rx_bin": "610014", "copay_pcp": 25})),
            vec![],
        ));
        assert_eq!(card.data["rx_bin"], "610014");
        assert_eq!(card.data["copay_pcp"], "25");
    }

    #[test]
    fn test_confidence_defaults_when_absent() {
        let raw = RawExtractionRecord::succeeded(Map::new(), vec![]);
        assert_eq!(normalized(raw.clone()).confidence, DEFAULT_CONFIDENCE);

        let mut raw = raw;
        raw.confidence = Some(0.97);
        assert_eq!(normalized(raw).confidence, 0.97);
    }

    #[test]
    fn test_success_record_parsed_from_provider_json() {
        let raw: RawExtractionRecord = serde_json::from_value(json!({
            "success": true,
            "structured_data": {"member_name": "A B", "patient_name": "C D"},
            "form_fields": [{"name": "group_number", "value": "G-1"}, {"name": "plan_name"}],
            "confidence": 0.9
        }))
        .unwrap();
        let card = normalized(raw);
        // source order is preserved, so patient_name (second) wins
        assert_eq!(card.data[PATIENT_NAME], "C D");
        assert_eq!(card.data[GROUP_NUMBER], "G-1");
        assert!(!card.data.contains_key(PRIMARY_INSURANCE_NAME));
    }

    #[test]
    fn test_translation_table() {
        assert_eq!(FIELD_TRANSLATIONS.len(), 18);
        assert!(table_is_consistent(FIELD_TRANSLATIONS));
        assert!(!table_is_consistent(&[("dob", "patient_dob"), ("dob", "x")]));
        assert!(!table_is_consistent(&[("a", "b"), ("b", "c")]));
        assert_eq!(translate_field("subscriber_id"), PATIENT_MEMBER_ID);
        assert_eq!(translate_field("rx_group"), "rx_group");
    }
}
