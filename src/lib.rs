//! # Quiz Chain Solver
//!
//! 自动解答链式数据分析题目的服务
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器、HTTP 客户端），只暴露能力
//! - `PageFetcher` / `Completer` / `Submitter` - 三种外部能力的 trait
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单道题
//! - `LlmService` - LLM 补全能力
//! - `interpret` - 把 LLM 输出解析为解答
//! - `SubmissionService` - 载荷编码与响应解码
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `StepCtx` - 上下文封装（session_id + step_index + deadline）
//! - `QuizStep` - 流程编排（fetch → LLM → interpret → submit）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/chain_driver` - 按时间预算推进题目链
//! - `orchestrator/launcher` - 会话启动器，管理资源和并发
//!
//! ### ⑤ 入口层（Intake）
//! - `server/` - axum HTTP 入口，校验密钥后启动会话
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod server;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, FailureKind, StepError, TransportError};
pub use models::{Answer, Credentials, ProposedSolution, StepOutcome};
pub use orchestrator::{ChainDriver, ChainLauncher, ChainPolicy, ChainReport, ChainTermination};
pub use workflow::{Capabilities, QuizStep, StepCtx, StepLimits};
