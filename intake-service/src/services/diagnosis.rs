//! Diagnosis code aggregation.
//!
//! Everything here works on reference rows that have already been fetched;
//! the store does the I/O and these functions do the grouping.

use crate::models::{
    Category, CodeEntry, DiagnosisCode, GroupedCodeResult, MappedDiagnosisCode, RequirementSlot,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use validator::{ValidationError, ValidationErrors};

const WOUND_TYPES_FIELD: &str = "wound_types";

/// Check a wound-type request against the reference table.
///
/// Returns the deduplicated code set, or a per-field error naming every
/// unknown code.
pub fn validate_wound_types(
    requested: &[String],
    known: &HashMap<String, String>,
) -> Result<BTreeSet<String>, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let codes: BTreeSet<String> = requested
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    if codes.is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("At least one wound type is required".into());
        errors.add(WOUND_TYPES_FIELD, err);
        return Err(errors);
    }

    for code in codes.iter().filter(|c| !known.contains_key(*c)) {
        let mut err = ValidationError::new("unknown_wound_type");
        err.message = Some(format!("The selected wound type '{}' is invalid", code).into());
        err.add_param("value".into(), code);
        errors.add(WOUND_TYPES_FIELD, err);
    }

    if errors.is_empty() {
        Ok(codes)
    } else {
        Err(errors)
    }
}

/// Category buckets that keep the first entry seen for each code.
struct Buckets {
    grouped: BTreeMap<Category, Vec<CodeEntry>>,
    seen: HashSet<(Category, String)>,
}

impl Buckets {
    fn new() -> Self {
        Self {
            grouped: Category::BASELINE
                .into_iter()
                .map(|category| (category, Vec::new()))
                .collect(),
            seen: HashSet::new(),
        }
    }

    fn push(&mut self, category: Category, entry: CodeEntry) -> bool {
        if !self.seen.insert((category.clone(), entry.code.clone())) {
            return false;
        }
        self.grouped.entry(category).or_default().push(entry);
        true
    }

    fn into_inner(self) -> BTreeMap<Category, Vec<CodeEntry>> {
        self.grouped
    }
}

/// Group the diagnosis codes mapped to `wound_types` by category and derive
/// the documentation requirement messages.
///
/// `display_names` maps wound-type code to display name; a missing entry
/// falls back to the code itself.
pub fn aggregate(
    wound_types: BTreeSet<String>,
    display_names: &HashMap<String, String>,
    mut rows: Vec<MappedDiagnosisCode>,
) -> GroupedCodeResult {
    rows.retain(|row| row.is_active && wound_types.contains(&row.wound_type_code));
    rows.sort_by_cached_key(|row| {
        (
            Category::parse(row.category.as_deref()).as_str().to_string(),
            row.diagnosis_code.clone(),
        )
    });

    let mut codes = Buckets::new();
    let mut satisfied: BTreeMap<String, BTreeSet<RequirementSlot>> = BTreeMap::new();

    for row in rows {
        let category = Category::parse(row.category.as_deref());

        if row.is_required {
            satisfied
                .entry(row.wound_type_code.clone())
                .or_default()
                .insert(RequirementSlot::from(&category));
        }

        let entry = CodeEntry {
            code: row.diagnosis_code,
            description: row.description,
            wound_type: Some(row.wound_type_code),
            specialty: row.specialty,
        };
        codes.push(category, entry);
    }

    let requirements = satisfied
        .iter()
        .filter_map(|(wound_type, slots)| {
            let name = display_names
                .get(wound_type)
                .map(String::as_str)
                .unwrap_or(wound_type);
            requirement_message(name, slots)
        })
        .collect();

    GroupedCodeResult {
        codes: codes.into_inner(),
        requirements,
        satisfied_requirements: satisfied,
        wound_types,
    }
}

fn requirement_message(display_name: &str, slots: &BTreeSet<RequirementSlot>) -> Option<String> {
    if slots.contains(&RequirementSlot::Yellow) && slots.contains(&RequirementSlot::Orange) {
        Some(format!(
            "{} requires 1 Yellow AND 1 Orange diagnosis code",
            display_name
        ))
    } else if slots.contains(&RequirementSlot::Any) {
        Some(format!(
            "{} requires at least 1 diagnosis code",
            display_name
        ))
    } else {
        None
    }
}

/// Every active diagnosis code grouped by category, ordered by category then
/// code. No wound-type join and no requirements.
pub fn list_all(mut codes: Vec<DiagnosisCode>) -> BTreeMap<Category, Vec<CodeEntry>> {
    codes.retain(|c| c.is_active);
    codes.sort_by(|a, b| a.code.cmp(&b.code));

    let mut grouped = Buckets::new();
    for code in codes {
        let category = Category::parse(code.category.as_deref());
        let entry = CodeEntry {
            code: code.code,
            description: code.description,
            wound_type: code.wound_type,
            specialty: code.specialty,
        };
        grouped.push(category, entry);
    }
    grouped.into_inner()
}
