use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpListener;

use quiz_chain_solver::orchestrator::{ChainRequest, SessionLauncher};
use quiz_chain_solver::server::{router, IntakeState};

#[derive(Default)]
struct RecordingLauncher {
    launched: Mutex<Vec<ChainRequest>>,
}

impl RecordingLauncher {
    fn launched(&self) -> Vec<ChainRequest> {
        self.launched.lock().unwrap().clone()
    }
}

impl SessionLauncher for RecordingLauncher {
    fn launch(&self, request: ChainRequest) {
        self.launched.lock().unwrap().push(request);
    }
}

async fn start_server() -> (String, Arc<RecordingLauncher>) {
    let launcher = Arc::new(RecordingLauncher::default());
    let state = IntakeState::new("s3cret", launcher.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    (format!("http://{addr}"), launcher)
}

async fn post_raw(base: &str, body: String) -> (StatusCode, JsonValue) {
    let response = reqwest::Client::new()
        .post(format!("{base}/"))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_accepts_valid_request() {
    let (base, launcher) = start_server().await;
    let body = json!({
        "email": "student@example.com",
        "secret": "s3cret",
        "url": "https://quiz.test/quiz/1",
    });

    let (status, reply) = post_raw(&base, body.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        reply,
        json!({
            "status": "received",
            "message": "Quiz processing started",
            "url": "https://quiz.test/quiz/1",
        })
    );
    assert_eq!(
        launcher.launched(),
        vec![ChainRequest {
            email: "student@example.com".to_string(),
            secret: "s3cret".to_string(),
            url: "https://quiz.test/quiz/1".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_wrong_secret_is_forbidden() {
    let (base, launcher) = start_server().await;
    let body = json!({
        "email": "student@example.com",
        "secret": "guess",
        "url": "https://quiz.test/quiz/1",
    });

    let (status, reply) = post_raw(&base, body.to_string()).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(reply, json!({ "detail": "Invalid secret" }));
    assert!(launcher.launched().is_empty());
}

#[tokio::test]
async fn test_malformed_payloads_are_bad_requests() {
    let (base, launcher) = start_server().await;

    let (status, reply) = post_raw(&base, "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply, json!({ "detail": "Invalid JSON payload" }));

    let missing_url = json!({ "email": "student@example.com", "secret": "s3cret" });
    let (status, _) = post_raw(&base, missing_url.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_email = json!({
        "email": "nobody",
        "secret": "s3cret",
        "url": "https://quiz.test/quiz/1",
    });
    let (status, _) = post_raw(&base, bad_email.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_scheme = json!({
        "email": "student@example.com",
        "secret": "s3cret",
        "url": "ftp://quiz.test/quiz/1",
    });
    let (status, _) = post_raw(&base, bad_scheme.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(launcher.launched().is_empty());
}

#[tokio::test]
async fn test_health() {
    let (base, _) = start_server().await;

    let reply: JsonValue = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        reply,
        json!({ "status": "healthy", "service": "llm-analysis-quiz" })
    );
}
