//! Document analysis providers for insurance card extraction.

use super::{CardDocument, DocumentAnalysisProvider, ProviderError};
use crate::config::AnalysisConfig;
use crate::models::{FormField, RawExtractionRecord};
use async_trait::async_trait;
use reqwest::{multipart, Client};
use secrecy::ExposeSecret;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Client for the hosted document intelligence service.
#[derive(Clone)]
pub struct HttpAnalysisProvider {
    client: Client,
    config: AnalysisConfig,
}

impl HttpAnalysisProvider {
    pub fn new(config: AnalysisConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Configuration(format!("Failed to build client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn analyze_url(&self) -> String {
        format!("{}/analyze", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl DocumentAnalysisProvider for HttpAnalysisProvider {
    async fn analyze(
        &self,
        document: &CardDocument,
    ) -> Result<RawExtractionRecord, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(
                "Document analysis endpoint or key not set".to_string(),
            ));
        }

        let part = multipart::Part::bytes(document.bytes.clone())
            .file_name(document.file_name.clone())
            .mime_str(&document.content_type)
            .map_err(|e| ProviderError::Configuration(format!("Invalid content type: {}", e)))?;
        let form = multipart::Form::new()
            .text("document_type", "insurance_card")
            .part("document", part);

        let response = self
            .client
            .post(self.analyze_url())
            .header("api-key", self.config.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        tracing::debug!(status = %status, "Document analysis response");

        if !status.is_success() {
            tracing::error!(status = %status, "Document analysis request failed");
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    fn is_configured(&self) -> bool {
        self.config.enabled
            && !self.config.endpoint.is_empty()
            && !self.config.api_key.expose_secret().is_empty()
    }

    fn name(&self) -> &'static str {
        "document_intelligence"
    }
}

/// Mock analysis provider for testing and local runs.
pub struct MockAnalysisProvider {
    response: RawExtractionRecord,
    call_count: AtomicU64,
}

impl MockAnalysisProvider {
    pub fn new(response: RawExtractionRecord) -> Self {
        Self {
            response,
            call_count: AtomicU64::new(0),
        }
    }

    /// A typical commercial insurance card.
    pub fn sample() -> Self {
        let structured = json!({
            "member_name": "Jane Doe",
            "member_id": "XGH123456789",
            "insurance_company": "Blue Cross Blue Shield",
            "group_number": "GRP-0042",
        });
        let structured_data = match structured {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(RawExtractionRecord::succeeded(
            structured_data,
            vec![
                FormField::new("customer_service", "1-800-555-0199"),
                FormField::new("plan_name", "PPO Gold"),
            ],
        ))
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentAnalysisProvider for MockAnalysisProvider {
    async fn analyze(
        &self,
        document: &CardDocument,
    ) -> Result<RawExtractionRecord, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        tracing::info!(
            file_name = %document.file_name,
            size = document.bytes.len(),
            "[MOCK] Document would be analyzed"
        );

        Ok(self.response.clone())
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: &str) -> AnalysisConfig {
        AnalysisConfig {
            endpoint: endpoint.to_string(),
            api_key: Secret::new("test-key".to_string()),
            enabled: true,
            timeout_secs: 5,
        }
    }

    fn document() -> CardDocument {
        CardDocument {
            file_name: "card.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[tokio::test]
    async fn test_posts_document_with_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .and(header("api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "structured_data": {"member_id": "ABC123"},
                "confidence": 0.93
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = HttpAnalysisProvider::new(config(&server.uri())).unwrap();
        let record = provider.analyze(&document()).await.unwrap();

        assert!(record.success);
        assert_eq!(record.confidence, Some(0.93));
        assert_eq!(
            record.structured_data.unwrap().get("member_id"),
            Some(&json!("ABC123"))
        );
    }

    #[tokio::test]
    async fn test_provider_reported_failure_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "Image too blurry"
            })))
            .mount(&server)
            .await;

        let provider = HttpAnalysisProvider::new(config(&server.uri())).unwrap();
        let record = provider.analyze(&document()).await.unwrap();

        assert!(!record.success);
        assert_eq!(record.error.as_deref(), Some("Image too blurry"));
    }

    #[tokio::test]
    async fn test_http_error_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let provider = HttpAnalysisProvider::new(config(&server.uri())).unwrap();
        let err = provider.analyze(&document()).await.unwrap_err();

        assert!(matches!(err, ProviderError::Upstream { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_refuses() {
        let mut cfg = config("");
        cfg.enabled = false;
        let provider = HttpAnalysisProvider::new(cfg).unwrap();

        assert!(!provider.is_configured());
        assert!(matches!(
            provider.analyze(&document()).await,
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let provider = MockAnalysisProvider::sample();
        let record = provider.analyze(&document()).await.unwrap();

        assert!(record.success);
        assert_eq!(provider.call_count(), 1);
    }
}
