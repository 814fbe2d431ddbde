pub mod card_normalizer;
pub mod diagnosis;
pub mod metrics;
pub mod providers;
pub mod store;

pub use metrics::{get_metrics, init_metrics};
pub use providers::{
    CardDocument, DocumentAnalysisProvider, EmailMessage, EmailProvider, HttpAnalysisProvider,
    MockAnalysisProvider, MockEmailProvider, ProviderError, SmtpProvider,
};
pub use store::{InMemoryReferenceStore, PgReferenceStore, ReferenceStore};
