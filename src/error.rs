use std::time::Duration;

use thiserror::Error;

/// 失败分类
///
/// 链路上的所有失败最终都会归入以下五类之一，便于日志统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 抓取 / LLM / 提交 的网络或协议失败
    Transport,
    /// 两种解析策略都无法得到有效解答
    Parse,
    /// 载荷超限，或解析结果缺少必填字段
    Validation,
    /// 会话时间预算耗尽
    BudgetExhausted,
    /// 失败后没有可继续的 URL
    ChainExhausted,
}

/// 外部能力（抓取 / LLM / 提交）的调用错误
#[derive(Debug, Error)]
pub enum TransportError {
    /// 调用超时
    #[error("请求超时 ({0:?})")]
    Timeout(Duration),
    /// 网络请求失败
    #[error("网络请求失败: {0}")]
    Network(String),
    /// 浏览器渲染或脚本执行失败
    #[error("页面渲染失败: {0}")]
    Render(String),
    /// 服务端返回了无法使用的内容
    #[error("响应内容无效: {0}")]
    InvalidResponse(String),
}

/// LLM 输出解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    /// JSON 解析成功但缺少 submit_url / answer
    #[error("解析结果缺少必填字段: {}", .missing.join(", "))]
    MissingFields { missing: Vec<&'static str> },
    /// 严格解析与正则兜底均失败
    #[error("无法从 LLM 输出中提取解答")]
    Unparseable,
}

/// 单步执行错误
///
/// 每一种外部调用失败都在步骤执行器边界被转换为此类型，驱动器统一按"失败"处理
#[derive(Debug, Error)]
pub enum StepError {
    #[error("抓取题目页面失败: {0}")]
    FetchFailed(#[source] TransportError),

    #[error("LLM 调用失败: {0}")]
    CompletionFailed(#[source] TransportError),

    #[error("无法解析 LLM 解答: {0}")]
    SolutionUnparseable(#[from] InterpretError),

    #[error("提交载荷过大: {size} 字节 (上限 {limit} 字节)")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("提交答案失败: {0}")]
    SubmissionFailed(#[source] TransportError),
}

impl StepError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StepError::FetchFailed(_)
            | StepError::CompletionFailed(_)
            | StepError::SubmissionFailed(_) => FailureKind::Transport,
            StepError::SolutionUnparseable(InterpretError::MissingFields { .. }) => {
                FailureKind::Validation
            }
            StepError::SolutionUnparseable(InterpretError::Unparseable) => FailureKind::Parse,
            StepError::PayloadTooLarge { .. } => FailureKind::Validation,
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必填配置为空
    #[error("配置项 {0} 不能为空")]
    Missing(&'static str),
    /// 配置值不合法
    #[error("配置项 {name} 不合法: {reason}")]
    Invalid { name: &'static str, reason: String },
    /// 配置文件读取或解析失败
    #[error("配置文件 {path} 加载失败: {reason}")]
    File { path: String, reason: String },
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("服务启动失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("客户端初始化失败: {0}")]
    Client(String),
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
