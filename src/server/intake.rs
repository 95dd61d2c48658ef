//! 入口服务
//!
//! `POST /` 接收 `{email, secret, url}`，校验通过后立即返回 200，
//! 题目链在后台会话中处理

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::orchestrator::{ChainLauncher, ChainRequest, SessionLauncher};

const SERVICE_NAME: &str = "llm-analysis-quiz";

/// 入站请求体
#[derive(Debug, Deserialize)]
pub struct QuizRequest {
    pub email: String,
    pub secret: String,
    pub url: String,
}

#[derive(Clone)]
pub struct IntakeState {
    secret: Arc<str>,
    launcher: Arc<dyn SessionLauncher>,
}

impl IntakeState {
    pub fn new(secret: impl Into<String>, launcher: Arc<dyn SessionLauncher>) -> Self {
        Self {
            secret: Arc::from(secret.into()),
            launcher,
        }
    }
}

pub fn router(state: IntakeState) -> Router {
    Router::new()
        .route("/", post(handle_quiz))
        .route("/health", get(health))
        .with_state(state)
}

/// 在 `bind_addr` 上启动入口服务，直到收到 Ctrl-C
pub async fn serve(config: Config) -> AppResult<()> {
    let addr = config.bind_addr.clone();
    let secret = config.student_secret.clone();
    let launcher = Arc::new(ChainLauncher::new(config));
    let state = IntakeState::new(secret, launcher.clone());

    let listener = TcpListener::bind(&addr).await?;
    info!("🚀 入口服务已启动: http://{}", listener.local_addr()?);
    serve_on_listener(listener, router(state)).await?;

    launcher.shutdown().await;
    info!("🧹 所有会话已结束");
    Ok(())
}

pub async fn serve_on_listener(listener: TcpListener, app: Router) -> AppResult<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;
    info!("👋 入口服务已停止");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("无法监听 Ctrl-C 信号: {}", e);
        std::future::pending::<()>().await;
    }
    info!("收到停止信号，正在关闭入口服务...");
}

async fn handle_quiz(
    State(state): State<IntakeState>,
    payload: Result<Json<QuizRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("⚠️ 无效的请求体: {}", rejection.body_text());
            return detail(StatusCode::BAD_REQUEST, "Invalid JSON payload");
        }
    };

    if let Err(reason) = validate_request(&request) {
        warn!("⚠️ 请求字段校验失败: {}", reason);
        return detail(StatusCode::BAD_REQUEST, reason);
    }

    if request.secret != *state.secret {
        warn!("🔒 密钥不匹配，拒绝请求: {}", request.email);
        return detail(StatusCode::FORBIDDEN, "Invalid secret");
    }

    info!("📨 收到解题请求: {} ({})", request.url, request.email);
    let url = request.url.clone();
    state.launcher.launch(ChainRequest {
        email: request.email,
        secret: request.secret,
        url: url.clone(),
    });

    (
        StatusCode::OK,
        Json(json!({
            "status": "received",
            "message": "Quiz processing started",
            "url": url,
        })),
    )
        .into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

fn validate_request(request: &QuizRequest) -> Result<(), &'static str> {
    if !request.email.contains('@') {
        return Err("Invalid email address");
    }
    if !(request.url.starts_with("http://") || request.url.starts_with("https://")) {
        return Err("URL must start with http:// or https://");
    }
    Ok(())
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}
