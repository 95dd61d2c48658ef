//! 会话启动器 - 编排层
//!
//! 入口服务器只负责把请求交给启动器，启动器在后台任务里跑完整个题目链。
//!
//! - 每个会话独占自己的浏览器、LLM 客户端和 HTTP 客户端
//! - 使用 Semaphore 限制同时运行的会话数量
//! - 驱动器运行在内层任务中，即使 panic 也会在释放资源之前被记录
//! - 服务停止时通知所有会话中断，并等待它们释放资源

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{BrowserPageFetcher, HttpSubmitter};
use crate::models::Credentials;
use crate::orchestrator::budget::BudgetTracker;
use crate::orchestrator::chain_driver::{ChainDriver, ChainPolicy};
use crate::orchestrator::session::ChainSession;
use crate::services::LlmService;
use crate::workflow::{Capabilities, QuizStep, StepLimits};

/// 一次已通过校验的解题请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRequest {
    pub email: String,
    pub secret: String,
    pub url: String,
}

/// 会话启动能力
///
/// `launch` 必须立即返回，会话在后台运行
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    fn launch(&self, request: ChainRequest);

    /// 中断仍在运行的会话并等待它们释放资源
    async fn shutdown(&self) {}
}

/// 按配置为每个会话创建外部能力
pub type CapabilityFactory = Arc<dyn Fn(&Config) -> AppResult<Capabilities> + Send + Sync>;

/// 生产环境的能力：chromiumoxide 抓取 + async-openai 补全 + reqwest 提交
pub fn build_capabilities(config: &Config) -> AppResult<Capabilities> {
    Ok(Capabilities {
        fetcher: Arc::new(BrowserPageFetcher::new(config)),
        completer: Arc::new(LlmService::new(config)),
        submitter: Arc::new(HttpSubmitter::new(config.http_timeout())?),
    })
}

pub struct ChainLauncher {
    config: Arc<Config>,
    permits: Arc<Semaphore>,
    factory: CapabilityFactory,
    sessions: Mutex<JoinSet<()>>,
    stop: watch::Sender<bool>,
}

impl ChainLauncher {
    pub fn new(config: Config) -> Self {
        Self::with_factory(config, Arc::new(build_capabilities))
    }

    pub fn with_factory(config: Config, factory: CapabilityFactory) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_sessions));
        let (stop, _) = watch::channel(false);
        Self {
            config: Arc::new(config),
            permits,
            factory,
            sessions: Mutex::new(JoinSet::new()),
            stop,
        }
    }

    /// 当前仍在运行（含排队）的会话数
    pub fn running_sessions(&self) -> usize {
        let mut sessions = self.lock_sessions();
        while sessions.try_join_next().is_some() {}
        sessions.len()
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, JoinSet<()>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionLauncher for ChainLauncher {
    fn launch(&self, request: ChainRequest) {
        // 预算从请求被接受时开始计时，排队等待也计入
        let tracker = BudgetTracker::new(self.config.quiz_budget());
        let session = ChainSession::with_tracker(request.url, tracker);
        let credentials = Credentials::new(request.email, request.secret);

        let config = self.config.clone();
        let permits = self.permits.clone();
        let factory = self.factory.clone();
        let stop = self.stop.subscribe();

        info!("[会话 {}] 📥 已接受请求，等待执行", session.id);
        let mut sessions = self.lock_sessions();
        // 回收已结束的会话
        while sessions.try_join_next().is_some() {}
        sessions.spawn(async move {
            let _permit = tokio::select! {
                permit = permits.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(e) => {
                        error!("[会话 {}] 无法获取执行许可: {}", session.id, e);
                        return;
                    }
                },
                _ = stop_requested(stop.clone()) => {
                    warn!("[会话 {}] 🛑 服务停止，放弃排队中的会话", session.id);
                    return;
                }
            };
            run_session(&config, factory, session, credentials, stop).await;
        });
    }

    async fn shutdown(&self) {
        self.stop.send_replace(true);
        let mut sessions = std::mem::take(&mut *self.lock_sessions());
        if !sessions.is_empty() {
            info!("⏳ 等待 {} 个会话释放资源...", sessions.len());
        }
        while let Some(joined) = sessions.join_next().await {
            if let Err(e) = joined {
                error!("会话任务异常结束: {}", e);
            }
        }
    }
}

/// 等待停止信号；发送端已释放时永不返回
async fn stop_requested(mut stop: watch::Receiver<bool>) {
    if stop.wait_for(|stopped| *stopped).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn run_session(
    config: &Config,
    factory: CapabilityFactory,
    session: ChainSession,
    credentials: Credentials,
    stop: watch::Receiver<bool>,
) {
    let session_id = session.id.clone();

    let capabilities = match factory(config) {
        Ok(capabilities) => capabilities,
        Err(e) => {
            error!("[会话 {}] ❌ 初始化失败: {}", session_id, e);
            return;
        }
    };
    let fetcher = capabilities.fetcher.clone();

    let driver = ChainDriver::new(
        QuizStep::new(capabilities, StepLimits::from_config(config)),
        ChainPolicy::from_config(config),
    );
    let mut handle = tokio::spawn(async move { driver.run(session, &credentials).await });

    tokio::select! {
        joined = &mut handle => match joined {
            Ok(report) => info!(
                "[会话 {}] 结束: {:?}（答对 {}，跳过 {}）",
                session_id, report.termination, report.solved, report.skipped
            ),
            Err(e) => error!("[会话 {}] 任务执行失败: {}", session_id, e),
        },
        _ = stop_requested(stop) => {
            warn!("[会话 {}] 🛑 服务停止，中断会话", session_id);
            handle.abort();
            let _ = handle.await;
        }
    }

    fetcher.shutdown().await;
    info!("[会话 {}] 🧹 资源已释放", session_id);
}
