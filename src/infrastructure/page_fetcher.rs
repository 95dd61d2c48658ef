//! 浏览器页面抓取
//!
//! 题目页面由脚本动态渲染，必须经过真实浏览器才能拿到可见文本

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::{launch_headless_browser, BrowserHandle, BrowserOptions};
use crate::config::Config;
use crate::error::TransportError;
use crate::infrastructure::{JsExecutor, PageFetcher};

const BODY_TEXT_SCRIPT: &str = "document.body ? document.body.innerText : ''";

/// 基于 chromiumoxide 的页面抓取器
///
/// 浏览器在第一次抓取时才启动，整个会话复用同一个浏览器进程，
/// 每次抓取单独开一个 page，抓取完成后立即关闭
pub struct BrowserPageFetcher {
    options: BrowserOptions,
    settle: Duration,
    browser: Mutex<Option<BrowserHandle>>,
}

impl BrowserPageFetcher {
    pub fn new(config: &Config) -> Self {
        Self {
            options: BrowserOptions {
                headless: config.headless,
                chrome_executable: config.chrome_executable.clone(),
                request_timeout: config.fetch_timeout(),
            },
            settle: config.page_settle(),
            browser: Mutex::new(None),
        }
    }

    async fn read_page(&self, executor: &JsExecutor, url: &str) -> Result<String, TransportError> {
        executor.goto(url).await?;

        // 等待页面脚本执行完成
        sleep(self.settle).await;

        let text: String = executor.eval_as(BODY_TEXT_SCRIPT).await?;
        if text.trim().is_empty() {
            return Err(TransportError::Render(format!("页面没有可见文本: {}", url)));
        }
        Ok(text)
    }
}

#[async_trait]
impl PageFetcher for BrowserPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let mut guard = self.browser.lock().await;
        if guard.is_none() {
            let handle = launch_headless_browser(&self.options)
                .await
                .map_err(|e| TransportError::Render(e.to_string()))?;
            *guard = Some(handle);
        }
        let Some(handle) = guard.as_ref() else {
            return Err(TransportError::Render("浏览器未启动".to_string()));
        };

        debug!("打开新页面: {}", url);
        let page = handle
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| TransportError::Render(format!("创建页面失败: {}", e)))?;
        let executor = JsExecutor::new(page);

        let result = self.read_page(&executor, url).await;

        if let Err(e) = executor.close().await {
            warn!("{}", e);
        }

        if let Ok(text) = &result {
            info!("✓ 页面抓取成功: {} ({} 字符)", url, text.chars().count());
        }
        result
    }

    async fn shutdown(&self) {
        if let Some(handle) = self.browser.lock().await.take() {
            handle.close().await;
        }
    }
}
