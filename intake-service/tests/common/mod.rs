#![allow(dead_code)]

use intake_service::config::IntakeConfig;
use intake_service::services::{
    DocumentAnalysisProvider, InMemoryReferenceStore, MockAnalysisProvider, MockEmailProvider,
};
use intake_service::startup::{AppState, Application};
use std::sync::Arc;

pub const ADMIN_EMAIL: &str = "admin@example.com";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub email_provider: Arc<MockEmailProvider>,
}

pub struct TestAppBuilder {
    config: IntakeConfig,
    store: InMemoryReferenceStore,
    analysis_provider: Arc<dyn DocumentAnalysisProvider>,
    email_provider: Arc<MockEmailProvider>,
}

impl TestAppBuilder {
    pub fn store(mut self, store: InMemoryReferenceStore) -> Self {
        self.store = store;
        self
    }

    pub fn analysis_provider(mut self, provider: Arc<dyn DocumentAnalysisProvider>) -> Self {
        self.analysis_provider = provider;
        self
    }

    pub fn email_provider(mut self, provider: MockEmailProvider) -> Self {
        self.email_provider = Arc::new(provider);
        self
    }

    pub fn admin_recipients(mut self, recipients: &[&str]) -> Self {
        self.config.notifications.admin_recipients =
            recipients.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub async fn spawn(self) -> TestApp {
        let state = AppState {
            config: self.config,
            store: Arc::new(self.store),
            analysis_provider: self.analysis_provider,
            email_provider: self.email_provider.clone(),
        };

        let app = Application::with_state(state)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            port,
            client: reqwest::Client::new(),
            email_provider: self.email_provider,
        }
    }
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        let mut config = IntakeConfig::local();
        config.common.port = 0; // Random port for testing
        config.notifications.admin_recipients = vec![ADMIN_EMAIL.to_string()];

        TestAppBuilder {
            config,
            store: InMemoryReferenceStore::seeded(),
            analysis_provider: Arc::new(MockAnalysisProvider::sample()),
            email_provider: Arc::new(MockEmailProvider::new(true)),
        }
    }

    pub async fn spawn() -> Self {
        Self::builder().spawn().await
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_form(&self, path: &str, form: reqwest::multipart::Form) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
