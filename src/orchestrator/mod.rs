//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责会话调度与题目链推进，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `launcher` - 会话启动器
//! - 为每个被接受的请求创建独立的后台任务
//! - 控制并发数量（Semaphore）
//! - 管理会话资源（浏览器、LLM 客户端、HTTP 客户端）
//!
//! ### `chain_driver` - 链路驱动器
//! - 按时间预算逐题推进
//! - 决定重试、前进、跳题或结束
//! - 输出单个会话的统计信息
//!
//! ### `budget` / `session` - 预算与会话状态
//!
//! ## 层次关系
//!
//! ```text
//! launcher (处理多个会话)
//!     ↓
//! chain_driver (处理一条题目链)
//!     ↓
//! workflow::QuizStep (处理单道题)
//!     ↓
//! services (能力层：llm / interpret / submission)
//!     ↓
//! infrastructure (基础设施：PageFetcher / Submitter)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：launcher 管并发与资源，chain_driver 管单条链
//! 2. **资源隔离**：会话之间不共享任何可变状态
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **不向上抛错**：驱动器只记录失败，不返回错误

pub mod budget;
pub mod chain_driver;
pub mod launcher;
pub mod session;

// 重新导出主要类型
pub use budget::BudgetTracker;
pub use chain_driver::{ChainDriver, ChainPolicy, ChainReport, ChainTermination};
pub use launcher::{build_capabilities, ChainLauncher, ChainRequest, SessionLauncher};
pub use session::ChainSession;
