use dense::models::AccountRequestRecord;
use dense::notify::{Notifier, NotifyError, WebhookNotifier};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> AccountRequestRecord {
    AccountRequestRecord {
        at: "2024-05-01T00:00:00.000Z".into(),
        email: "a@b.c".into(),
        handle: "alice".into(),
        bio: String::new(),
        status: String::new(),
        links: vec![],
        invite: None,
    }
}

#[tokio::test]
async fn webhook_receives_text_and_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(json!({
            "text": "New dense account / invite request from @alice <a@b.c>",
            "request": {"email": "a@b.c", "handle": "alice"}
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(format!("{}/hook", server.uri())).unwrap();
    notifier.account_requested(&request()).await.unwrap();
}

#[tokio::test]
async fn webhook_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let notifier = WebhookNotifier::new(server.uri()).unwrap();
    assert!(matches!(notifier.account_requested(&request()).await, Err(NotifyError::Status(500))));
}
