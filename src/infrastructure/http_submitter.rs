//! HTTP 答案提交

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::error::{AppError, TransportError};
use crate::infrastructure::{SubmissionResponse, Submitter};

/// 基于 reqwest 的提交客户端
pub struct HttpSubmitter {
    client: Client,
    timeout: Duration,
}

impl HttpSubmitter {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Client(format!("HTTP 客户端创建失败: {}", e)))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Submitter for HttpSubmitter {
    async fn submit(&self, url: &str, body: Vec<u8>) -> Result<SubmissionResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.timeout)
                } else {
                    TransportError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        debug!("提交响应状态码: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(format!("读取响应失败: {}", e)))?;

        Ok(SubmissionResponse { status, body })
    }
}
