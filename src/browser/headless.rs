use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// 无头浏览器启动参数
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chrome_executable: Option<String>,
    /// CDP 单个请求的超时
    pub request_timeout: Duration,
}

/// 已启动的浏览器及其事件循环任务
pub struct BrowserHandle {
    pub browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserHandle {
    /// 关闭浏览器进程并结束事件循环
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            error!("关闭浏览器失败: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("等待浏览器进程退出失败: {}", e);
        }
        self.handler_task.abort();
        info!("🧹 浏览器已关闭");
    }
}

/// 启动无头浏览器
pub async fn launch_headless_browser(options: &BrowserOptions) -> Result<BrowserHandle> {
    info!("🚀 启动无头浏览器...");

    let mut builder = BrowserConfig::builder();
    builder = if options.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(executable) = &options.chrome_executable {
        debug!("使用指定的浏览器: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }

    let config = builder
        .request_timeout(options.request_timeout)
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ])
        .build()
        .map_err(|e| {
            error!("配置无头浏览器失败: {}", e);
            anyhow::anyhow!("配置无头浏览器失败: {}", e)
        })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        anyhow::anyhow!("启动无头浏览器失败: {}", e)
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    Ok(BrowserHandle {
        browser,
        handler_task,
    })
}
