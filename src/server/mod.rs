//! 入口层（Intake）
//!
//! 基于 axum 的 HTTP 入口，只做校验与转交，不参与解题

pub mod intake;

pub use intake::{router, serve, serve_on_listener, IntakeState, QuizRequest};
