//! JS 执行器 - 基础设施层
//!
//! 持有单个 page，只暴露"导航"和"执行 JS"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;

use crate::error::TransportError;

/// JS 执行器
///
/// 职责：
/// - 持有一个 Page 资源，用完后由 `close()` 释放
/// - 不认识题目 / 解答
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 导航到指定 URL 并等待页面加载
    pub async fn goto(&self, url: &str) -> Result<(), TransportError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| TransportError::Network(format!("导航到 {} 失败: {}", url, e)))?;
        Ok(())
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<T, TransportError> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(|e| TransportError::Render(format!("执行脚本失败: {}", e)))?;
        result
            .into_value()
            .map_err(|e| TransportError::Render(format!("脚本返回值无法解析: {}", e)))
    }

    /// 关闭 page
    pub async fn close(self) -> Result<(), TransportError> {
        self.page
            .close()
            .await
            .map_err(|e| TransportError::Render(format!("关闭页面失败: {}", e)))
    }
}
