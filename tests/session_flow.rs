//! End-to-end session tests: orchestrator, client and Veo backend against a
//! mock server.

#![cfg(feature = "veo")]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use video_express::session::CREDENTIAL_EXPIRED_MESSAGE;
use video_express::{
    AspectRatio, CredentialGate, GenerationState, Orchestrator, Resolution,
    StaticCredentialProvider, VeoConnector, VideoConfig, VideoGenerationClient,
};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn session(server: &MockServer, key: &StaticCredentialProvider) -> Orchestrator {
    let connector = VeoConnector::builder()
        .base_url(format!("{}/v1beta", server.uri()))
        .build()
        .unwrap();
    let client = VideoGenerationClient::builder(Arc::new(key.clone()), Arc::new(connector))
        .poll_interval(Duration::from_millis(10))
        .build();
    let mut session = Orchestrator::new(client, CredentialGate::new(Arc::new(key.clone())));
    session.start().await;
    session
}

async fn mount_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path_regex(r":predictLongRunning$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "operations/op1"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1beta/operations/op1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op1",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [{
                "video": {"uri": format!("{}/files/op1:download?alt=media", server.uri())}
            }]}}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/op1:download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_session_completes_and_records_history() {
    let server = MockServer::start().await;
    mount_success(&server).await;

    let key = StaticCredentialProvider::new("test-key");
    let mut session = session(&server, &key).await;
    assert!(session.has_credential());

    let config = VideoConfig::new(AspectRatio::Landscape, Resolution::Hd);
    let state = session.submit("A cat on a skateboard", config).await.unwrap();

    let video = state.video().expect("completed video");
    assert_eq!(video.prompt, "A cat on a skateboard");
    assert_eq!(video.config, config);
    assert_eq!(video.asset.data, b"mp4-bytes".to_vec());
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history().latest().unwrap().id, video.id);

    // Saving the displayed video writes the fetched bytes
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join(video.download_file_name());
    video.asset.save(&out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), b"mp4-bytes".to_vec());
}

#[tokio::test]
async fn test_session_expired_key_closes_gate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r":predictLongRunning$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}
        })))
        .mount(&server)
        .await;

    let key = StaticCredentialProvider::new("stale-key");
    let mut session = session(&server, &key).await;

    let state = session
        .submit("Ocean waves", VideoConfig::default())
        .await
        .unwrap();

    assert_eq!(
        state,
        GenerationState::Idle {
            error: Some(CREDENTIAL_EXPIRED_MESSAGE.to_string())
        }
    );
    assert!(!session.has_credential());
    assert!(session.history().is_empty());

    // Selecting again reopens the gate without re-querying the host
    session.select_credential().await.unwrap();
    assert!(session.has_credential());
}

#[tokio::test]
async fn test_session_fetch_failure_shows_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r":predictLongRunning$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op2",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [{
                "video": {"uri": format!("{}/files/op2:download?alt=media", server.uri())}
            }]}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/op2:download"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let key = StaticCredentialProvider::new("test-key");
    let mut session = session(&server, &key).await;

    let state = session
        .submit("Ocean waves", VideoConfig::default())
        .await
        .unwrap();

    match state {
        GenerationState::Failed { error } => {
            assert!(error.contains("failed to fetch video content"), "got: {}", error);
            assert!(error.contains("500"), "got: {}", error);
        }
        other => panic!("Expected Failed state, got: {:?}", other),
    }
    assert!(session.has_credential());
    assert!(session.reset());
    assert_eq!(session.state(), GenerationState::Idle { error: None });
}

#[tokio::test]
async fn test_session_expired_key_on_download_closes_gate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r":predictLongRunning$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op3",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [{
                "video": {"uri": format!("{}/files/op3:download?alt=media", server.uri())}
            }]}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/op3:download"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}
        })))
        .mount(&server)
        .await;

    let key = StaticCredentialProvider::new("stale-key");
    let mut session = session(&server, &key).await;
    assert!(session.has_credential());

    let state = session
        .submit("Ocean waves", VideoConfig::default())
        .await
        .unwrap();

    assert_eq!(
        state,
        GenerationState::Idle {
            error: Some(CREDENTIAL_EXPIRED_MESSAGE.to_string())
        }
    );
    assert!(!session.has_credential());
    assert!(session.history().is_empty());
}
