use dense::classify::ClassifierPolicy;
use dense::config::RetryPolicy;
use dense::local_state::{FileBackend, LocalState};
use dense::outbox::{DeliveryStatus, HttpTransport, Outbox};
use dense::session::{ProfileForm, Session};
use dense::widgets::CommentWidget;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn optimistic_comment_is_delivered_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/dense/comment"))
        .and(body_partial_json(json!({"slug": "post-1", "handle": "@alice", "body": "p99 < 20ms"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dense/report"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "slug and reason required"})))
        .mount(&server)
        .await;

    let state = LocalState::in_memory();
    let mut session = Session::load(state.clone());
    session.login("alice@example.com");
    session.save_profile(&ProfileForm { handle: "alice".into(), ..Default::default() });

    let mut widget = CommentWidget::new("post-1", ClassifierPolicy::default());
    let mut outbox = Outbox::new(HttpTransport::new(server.uri()).unwrap(), RetryPolicy::no_delay(2));

    let (id, comment) = widget.submit("", "p99 < 20ms", &session, &mut outbox).unwrap();
    assert_eq!(widget.thread().get(id).unwrap().handle, "@alice");
    let report = widget.report(id, "", "/posts/1", &state, &mut outbox, chrono::Utc::now()).unwrap();

    let flushed = outbox.flush().await;
    assert_eq!(flushed.delivered, 1);
    assert_eq!(flushed.failed, 1);
    assert_eq!(outbox.status(comment), Some(&DeliveryStatus::Delivered));
    assert!(matches!(outbox.status(report), Some(DeliveryStatus::Failed { .. })));
    // the local copy stays regardless of delivery
    assert_eq!(widget.rows().len(), 1);
}

#[tokio::test]
async fn undelivered_mutations_survive_a_restart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/dense/comment"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dense/comment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("local.json");
    let session = Session::load(LocalState::in_memory());
    {
        let state = LocalState::new(Arc::new(FileBackend::open(&file)));
        let mut outbox = Outbox::persistent(HttpTransport::new(server.uri()).unwrap(), RetryPolicy::no_delay(2), state);
        let mut widget = CommentWidget::new("post-1", ClassifierPolicy::default());
        let (_, delivery) = widget.submit("bob", "see [1] for the numbers", &session, &mut outbox).unwrap();
        let flushed = outbox.flush().await;
        assert_eq!(flushed.remaining, 1);
        assert_eq!(outbox.status(delivery), Some(&DeliveryStatus::Retrying { attempts: 2 }));
    }

    let state = LocalState::new(Arc::new(FileBackend::open(&file)));
    let mut outbox = Outbox::persistent(HttpTransport::new(server.uri()).unwrap(), RetryPolicy::no_delay(2), state);
    assert_eq!(outbox.pending(), 1);
    let flushed = outbox.flush().await;
    assert_eq!(flushed.delivered, 1);
    assert_eq!(outbox.pending(), 0);
}

#[tokio::test]
async fn rate_limited_comment_stays_queued() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/dense/comment"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dense/comment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let session = Session::load(LocalState::in_memory());
    let mut widget = CommentWidget::new("post-1", ClassifierPolicy::default());
    let mut outbox = Outbox::new(HttpTransport::new(server.uri()).unwrap(), RetryPolicy::no_delay(2));
    let (_, delivery) = widget.submit("carol", "x = 2", &session, &mut outbox).unwrap();

    let flushed = outbox.flush().await;
    assert_eq!((flushed.failed, flushed.remaining), (0, 1));
    assert_eq!(outbox.status(delivery), Some(&DeliveryStatus::Retrying { attempts: 2 }));

    assert_eq!(outbox.flush().await.delivered, 1);
    assert_eq!(outbox.acknowledge(delivery), Some(DeliveryStatus::Delivered));
    assert_eq!(outbox.status(delivery), None);
}
