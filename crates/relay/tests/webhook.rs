use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relay::{
    DeliveryError, FileMarkerStore, MarkerStore, Notifier, Post, PostSource, Relay, RelayConfig,
    RelayError, RunOutcome, WebhookNotifier,
};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FixedSource(Vec<Post>);

#[async_trait]
impl PostSource for FixedSource {
    async fn fetch(&self, _account: &str) -> Result<Vec<Post>, RelayError> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn webhook_posts_content_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({ "content": "hello\nhttps://x.com/a/status/1" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(format!("{}/hook", server.uri())).unwrap();
    notifier
        .deliver("hello\nhttps://x.com/a/status/1")
        .await
        .expect("delivery ok");
}

#[tokio::test]
async fn webhook_reports_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(format!("{}/hook", server.uri())).unwrap();
    let err = notifier.deliver("hello").await.unwrap_err();

    match err {
        DeliveryError::Status { status, body } => {
            assert_eq!(status.as_u16(), 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn webhook_reports_transport_failure() {
    // Nothing listens on the discard port.
    let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook").unwrap();
    let err = notifier.deliver("hello").await.unwrap_err();
    assert!(matches!(err, DeliveryError::Http(_)));
}

#[tokio::test]
async fn relay_delivers_through_webhook_and_persists_marker() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let marker_path = temp_dir.path().join("last_id.txt");
    std::fs::write(&marker_path, "101\n").unwrap();

    let mut config = RelayConfig::new("someone", format!("{}/hook", server.uri()));
    config.marker_path = marker_path.clone();
    config.send_delay = Duration::ZERO;

    let posts = vec![
        Post::new("103", "https://x.com/someone/status/103", "third"),
        Post::new("102", "https://x.com/someone/status/102", "second"),
        Post::new("101", "https://x.com/someone/status/101", "first"),
    ];
    let notifier = WebhookNotifier::new(config.webhook_url.clone()).unwrap();
    let relay = Relay::new(config, Arc::new(FixedSource(posts)), Arc::new(notifier));
    let store = FileMarkerStore::new(&marker_path);

    let outcome = relay.run(&store).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Delivered(ref s) if s.sent == 2));
    assert_eq!(store.load().unwrap().as_deref(), Some("103"));

    let bodies: Vec<serde_json::Value> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(
        bodies,
        vec![
            serde_json::json!({ "content": "second\nhttps://x.com/someone/status/102" }),
            serde_json::json!({ "content": "third\nhttps://x.com/someone/status/103" }),
        ]
    );
}

#[tokio::test]
async fn relay_halts_on_webhook_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let store = FileMarkerStore::new(temp_dir.path().join("last_id.txt"));
    store.save("1").unwrap();

    let mut config = RelayConfig::new("someone", format!("{}/hook", server.uri()));
    config.send_delay = Duration::ZERO;

    let posts = vec![
        Post::new("3", "https://x.com/someone/status/3", "c"),
        Post::new("2", "https://x.com/someone/status/2", "b"),
        Post::new("1", "https://x.com/someone/status/1", "a"),
    ];
    let notifier = WebhookNotifier::new(config.webhook_url.clone()).unwrap();
    let relay = Relay::new(config, Arc::new(FixedSource(posts)), Arc::new(notifier));

    let outcome = relay.run(&store).await.unwrap();

    assert!(matches!(
        outcome,
        RunOutcome::Delivered(ref s) if s.sent == 0 && s.failed == 1 && s.pending == 1
    ));
    assert_eq!(store.load().unwrap().as_deref(), Some("1"));
}
