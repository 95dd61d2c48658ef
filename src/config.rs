use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 学生凭据 ---
    pub student_email: String,
    pub student_secret: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 时间预算 ---
    /// 整条链路的时间预算（秒）
    pub quiz_timeout_secs: u64,
    /// 剩余时间超过该值才允许重试（秒）
    pub retry_margin_secs: u64,
    pub fetch_timeout_secs: u64,
    pub llm_timeout_secs: u64,
    pub http_timeout_secs: u64,
    // --- 提交 ---
    /// 提交载荷序列化后的最大字节数
    pub max_payload_bytes: usize,
    // --- 浏览器 ---
    /// 页面导航完成后等待脚本渲染的时间（毫秒）
    pub page_settle_ms: u64,
    pub headless: bool,
    pub chrome_executable: Option<String>,
    // --- 服务 ---
    /// 同时运行的会话数量
    pub max_concurrent_sessions: usize,
    pub bind_addr: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            student_email: String::new(),
            student_secret: String::new(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4-turbo-preview".to_string(),
            quiz_timeout_secs: 170,
            retry_margin_secs: 30,
            fetch_timeout_secs: 30,
            llm_timeout_secs: 60,
            http_timeout_secs: 30,
            max_payload_bytes: 1024 * 1024,
            page_settle_ms: 2000,
            headless: true,
            chrome_executable: None,
            max_concurrent_sessions: 4,
            bind_addr: "0.0.0.0:8000".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 按 默认值 → TOML 文件 → 环境变量 的顺序加载配置
    ///
    /// 配置文件路径取自 `QUIZ_CONFIG`，未设置时尝试当前目录下的 `config.toml`
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var("QUIZ_CONFIG") {
            Ok(path) => Self::from_toml_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(DEFAULT_CONFIG_FILE)?
            }
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::File { reason, .. } => ConfigError::File {
                path: path.to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::File {
            path: String::new(),
            reason: e.to_string(),
        })
    }

    /// 只从环境变量加载
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 用环境变量覆盖已有配置；无法解析的值被忽略
    pub fn with_env_overrides(self) -> Self {
        Self::overlay(self, |name| std::env::var(name).ok())
    }

    fn overlay(base: Self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            student_email: lookup("STUDENT_EMAIL").unwrap_or(base.student_email),
            student_secret: lookup("STUDENT_SECRET").unwrap_or(base.student_secret),
            llm_api_key: lookup("LLM_API_KEY")
                .or_else(|| lookup("OPENAI_API_KEY"))
                .unwrap_or(base.llm_api_key),
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(base.llm_api_base_url),
            llm_model_name: lookup("LLM_MODEL_NAME").unwrap_or(base.llm_model_name),
            quiz_timeout_secs: parse_env(&lookup, "QUIZ_TIMEOUT").unwrap_or(base.quiz_timeout_secs),
            retry_margin_secs: parse_env(&lookup, "RETRY_MARGIN").unwrap_or(base.retry_margin_secs),
            fetch_timeout_secs: parse_env(&lookup, "FETCH_TIMEOUT")
                .unwrap_or(base.fetch_timeout_secs),
            llm_timeout_secs: parse_env(&lookup, "LLM_TIMEOUT").unwrap_or(base.llm_timeout_secs),
            http_timeout_secs: parse_env(&lookup, "HTTP_TIMEOUT").unwrap_or(base.http_timeout_secs),
            max_payload_bytes: parse_env(&lookup, "MAX_PAYLOAD_BYTES")
                .unwrap_or(base.max_payload_bytes),
            page_settle_ms: parse_env(&lookup, "PAGE_SETTLE_MS").unwrap_or(base.page_settle_ms),
            headless: lookup("HEADLESS")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(base.headless),
            chrome_executable: lookup("CHROME_EXECUTABLE").or(base.chrome_executable),
            max_concurrent_sessions: parse_env(&lookup, "MAX_CONCURRENT_SESSIONS")
                .unwrap_or(base.max_concurrent_sessions),
            bind_addr: lookup("BIND_ADDR").unwrap_or(base.bind_addr),
            verbose_logging: parse_env(&lookup, "VERBOSE_LOGGING").unwrap_or(base.verbose_logging),
        }
    }

    /// 校验启动所需的配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.student_secret.trim().is_empty() {
            return Err(ConfigError::Missing("student_secret"));
        }
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::Missing("llm_api_key"));
        }
        if self.quiz_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "quiz_timeout_secs",
                reason: "时间预算必须大于 0".to_string(),
            });
        }
        if self.retry_margin_secs >= self.quiz_timeout_secs {
            return Err(ConfigError::Invalid {
                name: "retry_margin_secs",
                reason: format!(
                    "重试余量 {}s 必须小于时间预算 {}s",
                    self.retry_margin_secs, self.quiz_timeout_secs
                ),
            });
        }
        if self.max_concurrent_sessions == 0 {
            return Err(ConfigError::Invalid {
                name: "max_concurrent_sessions",
                reason: "并发数必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn quiz_budget(&self) -> Duration {
        Duration::from_secs(self.quiz_timeout_secs)
    }

    pub fn retry_margin(&self) -> Duration {
        Duration::from_secs(self.retry_margin_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }
}

/// 读取并解析一个环境变量，缺失或无法解析时返回 None
fn parse_env<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|v| v.trim().parse().ok())
}
