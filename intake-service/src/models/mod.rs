pub mod diagnosis;
pub mod insurance_card;
pub mod product;

pub use diagnosis::{
    Category, CodeEntry, DiagnosisCode, GroupedCodeResult, MappedDiagnosisCode, RequirementSlot,
    WoundType,
};
pub use insurance_card::{CardAnalysis, FormField, NormalizedCardData, RawExtractionRecord};
pub use product::{Product, ProductFilter};
