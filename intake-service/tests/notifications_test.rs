mod common;

use common::{TestApp, ADMIN_EMAIL};
use intake_service::services::MockEmailProvider;
use serde_json::{json, Value};

#[tokio::test]
async fn sends_to_configured_admins_by_default() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/admin/notifications/email",
            &json!({"subject": "New order", "message": "Order 1001 submitted"}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"sent": 1, "failed": []}));

    let sent = app.email_provider.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, ADMIN_EMAIL);
    assert_eq!(sent[0].body_text, "Order 1001 submitted");
}

#[tokio::test]
async fn one_failed_recipient_does_not_stop_the_rest() {
    let app = TestApp::builder()
        .email_provider(MockEmailProvider::new(true).rejecting("bounce@example.com"))
        .spawn()
        .await;

    let body: Value = app
        .post_json(
            "/admin/notifications/email",
            &json!({
                "subject": "New order",
                "message": "Order 1002 submitted",
                "recipients": ["bounce@example.com", "ops@example.com"]
            }),
        )
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["sent"], 1);
    assert_eq!(body["failed"][0]["recipient"], "bounce@example.com");
    assert_eq!(app.email_provider.send_count(), 1);
}

#[tokio::test]
async fn invalid_payload_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/admin/notifications/email",
            &json!({"subject": "", "message": "hi", "recipients": ["not-an-email"]}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert!(body["fields"]["subject"].is_array());
    assert!(body["fields"]["recipients"].is_array());
}

#[tokio::test]
async fn no_recipients_at_all_is_rejected() {
    let app = TestApp::builder().admin_recipients(&[]).spawn().await;

    let response = app
        .post_json(
            "/admin/notifications/email",
            &json!({"subject": "New order", "message": "hi"}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 422);
    assert_eq!(app.email_provider.send_count(), 0);
}

#[tokio::test]
async fn disabled_smtp_reports_every_recipient_as_failed() {
    use intake_service::config::IntakeConfig;
    use intake_service::startup::Application;

    let mut config = IntakeConfig::local();
    config.common.port = 0;
    config.notifications.admin_recipients = vec![ADMIN_EMAIL.to_string()];
    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    let address = format!("http://127.0.0.1:{}", app.port());
    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    let body: Value = reqwest::Client::new()
        .post(format!("{}/admin/notifications/email", address))
        .json(&json!({"subject": "New order", "message": "Order 1003 submitted"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["sent"], 0);
    assert_eq!(body["failed"][0]["recipient"], ADMIN_EMAIL);
}
