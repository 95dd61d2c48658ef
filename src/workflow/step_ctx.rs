//! 单步处理上下文
//!
//! 封装"我正在处理哪个会话的第几步，截止时间是什么时候"这一信息

use std::fmt::Display;

use tokio::time::Instant;

/// 单步处理上下文
#[derive(Debug, Clone)]
pub struct StepCtx {
    /// 会话ID（仅用于日志显示）
    pub session_id: String,

    /// 会话内的尝试序号（从1开始，重试也计数）
    pub step_index: usize,

    /// 本步要处理的题目 URL
    pub url: String,

    /// 会话截止时间，任何外部调用都不能越过它
    pub deadline: Instant,
}

impl StepCtx {
    pub fn new(session_id: String, step_index: usize, url: String, deadline: Instant) -> Self {
        Self {
            session_id,
            step_index,
            url,
            deadline,
        }
    }
}

impl Display for StepCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[会话 {} 第 {} 步]", self.session_id, self.step_index)
    }
}
