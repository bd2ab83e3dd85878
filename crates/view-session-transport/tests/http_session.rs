//! Session client over the HTTP transport against a mock view server.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use serde_json::json;
use view_session_client::{DispatchError, RequestSettings, SessionClient};
use view_session_core::{Response, SessionConfig, ViewIdentity};
use view_session_transport::{HttpTransport, HttpTransportConfig};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn http(server: &MockServer) -> Arc<HttpTransport> {
    Arc::new(
        HttpTransport::new(HttpTransportConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            ..HttpTransportConfig::default()
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn test_deferred_call_resolves_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Settings/BrowserHeartbeat"))
        .and(query_param("__ViewId", "v1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Settings/Save"))
        .and(query_param("__ViewId", "v1"))
        .and(query_param("name", "radar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Response::deferred("J1")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Settings/GetDeferredResponse"))
        .and(query_param("jobId", "J1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Response::deferred("J1")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Settings/GetDeferredResponse"))
        .and(query_param("jobId", "J1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Saved": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SessionClient::builder("Settings")
        .session_id("v1")
        .config(SessionConfig::default().with_deferred_polls(
            Duration::from_millis(20),
            Duration::from_millis(50),
            Duration::from_millis(100),
        ))
        .build(http(&server));

    let response = client
        .call("Save", RequestSettings::new().param("name", "radar"))
        .await
        .unwrap();

    assert_eq!(response.as_value(), &json!({ "Saved": true }));
    assert!(!client.is_lost_contact());
}

#[tokio::test]
async fn test_failing_heartbeats_lose_contact_over_http() {
    let server = MockServer::start().await;

    Mock::given(path("/Settings/BrowserHeartbeat"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let notified = Arc::new(AtomicUsize::new(0));
    let client = SessionClient::builder("Settings")
        .session_id("v1")
        .config(
            SessionConfig::default()
                .with_retry_interval(Duration::from_millis(10))
                .with_max_failures(3),
        )
        .notifier({
            let notified = Arc::clone(&notified);
            move |identity: &ViewIdentity| {
                assert_eq!(identity.session_id(), Some("v1"));
                notified.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build(http(&server));

    for _ in 0..200 {
        if client.is_lost_contact() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(client.is_lost_contact());
    assert_eq!(notified.load(Ordering::SeqCst), 1);

    let result = client.call("Save", RequestSettings::new()).await;
    assert!(matches!(result, Err(DispatchError::LostContact)));
}
