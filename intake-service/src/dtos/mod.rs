pub mod diagnosis;
pub mod insurance_card;
pub mod notifications;
pub mod products;

pub use diagnosis::{AllDiagnosisCodesResponse, WoundTypeCodesRequest, WoundTypeCodesResponse};
pub use insurance_card::AnalysisStatusResponse;
pub use notifications::{AdminEmailRequest, AdminEmailResponse, FailedRecipient};
pub use products::{ProductSearchParams, ProductSearchResponse, ProviderProductsResponse};
