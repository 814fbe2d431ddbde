//! Diagnosis code reference data and the grouped views built from it.

use serde::{Serialize, Serializer};
use sqlx::FromRow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Business-rule grouping of a diagnosis code.
///
/// Absent, empty and literal `none` values all map to [`Category::None`].
/// Any other unrecognised value is kept verbatim in [`Category::Other`] and
/// gets its own bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Yellow,
    Orange,
    None,
    Other(String),
}

impl Category {
    /// Buckets that are always present in a grouped result.
    pub const BASELINE: [Category; 3] = [Category::Yellow, Category::Orange, Category::None];

    pub fn parse(raw: Option<&str>) -> Self {
        let value = match raw.map(str::trim) {
            None | Some("") => return Self::None,
            Some(value) => value,
        };

        match value.to_ascii_lowercase().as_str() {
            "yellow" => Self::Yellow,
            "orange" => Self::Orange,
            "none" => Self::None,
            _ => Self::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::None => "none",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Category under which a required mapping counts toward a wound type's
/// documentation requirement. Uncategorised requirements land in `Any`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequirementSlot {
    Yellow,
    Orange,
    Any,
    Other(String),
}

impl RequirementSlot {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Any => "any",
            Self::Other(value) => value,
        }
    }
}

impl From<&Category> for RequirementSlot {
    fn from(category: &Category) -> Self {
        match category {
            Category::Yellow => Self::Yellow,
            Category::Orange => Self::Orange,
            Category::None => Self::Any,
            Category::Other(value) => Self::Other(value.clone()),
        }
    }
}

impl Serialize for RequirementSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Wound type reference row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct WoundType {
    pub code: String,
    pub display_name: String,
}

/// Diagnosis code catalog row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct DiagnosisCode {
    pub code: String,
    pub description: String,
    pub category: Option<String>,
    pub specialty: Option<String>,
    pub wound_type: Option<String>,
    pub is_active: bool,
}

/// A wound-type mapping joined with its diagnosis code.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MappedDiagnosisCode {
    pub wound_type_code: String,
    pub diagnosis_code: String,
    pub category: Option<String>,
    pub is_required: bool,
    pub description: String,
    pub specialty: Option<String>,
    pub is_active: bool,
}

/// One code inside a category bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeEntry {
    pub code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wound_type: Option<String>,
    pub specialty: Option<String>,
}

/// Diagnosis codes for a set of wound types, grouped by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedCodeResult {
    pub codes: BTreeMap<Category, Vec<CodeEntry>>,
    pub requirements: Vec<String>,
    pub satisfied_requirements: BTreeMap<String, BTreeSet<RequirementSlot>>,
    pub wound_types: BTreeSet<String>,
}

impl GroupedCodeResult {
    pub fn bucket(&self, category: &Category) -> &[CodeEntry] {
        self.codes.get(category).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalises_missing_and_case() {
        assert_eq!(Category::parse(None), Category::None);
        assert_eq!(Category::parse(Some("  ")), Category::None);
        assert_eq!(Category::parse(Some("NONE")), Category::None);
        assert_eq!(Category::parse(Some("Yellow")), Category::Yellow);
        assert_eq!(Category::parse(Some(" orange ")), Category::Orange);
        assert_eq!(
            Category::parse(Some("red")),
            Category::Other("red".to_string())
        );
    }

    #[test]
    fn uncategorised_requirement_is_any() {
        assert_eq!(RequirementSlot::from(&Category::None), RequirementSlot::Any);
        assert_eq!(
            RequirementSlot::from(&Category::Orange),
            RequirementSlot::Orange
        );
    }

    #[test]
    fn category_serializes_as_plain_string() {
        let mut codes = BTreeMap::new();
        codes.insert(Category::Other("red".to_string()), Vec::<CodeEntry>::new());
        codes.insert(Category::Yellow, Vec::new());
        let json = serde_json::to_string(&codes).unwrap();
        assert_eq!(json, r#"{"yellow":[],"red":[]}"#);
    }
}
