//! Progress Client - 阅读端调用进度服务
//!
//! 所有请求带 `X-Student-Id` 头，响应为 `{errno, error, data}` 信封

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::domain::reading::{MaterialId, StudentId};
use crate::infrastructure::http::dto::{
    ApiResponse, CommitPageTimeRequest, DownloadDto, InitializeReadingRequest, SessionDto,
    SetCurrentPageRequest,
};
use crate::infrastructure::http::extract::STUDENT_ID_HEADER;

/// 客户端错误
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// 连接失败、超时等传输层错误
    #[error("Network error: {0}")]
    Network(String),

    /// 服务端按规则拒绝
    #[error("{message} (errno {errno})")]
    Api { errno: i32, message: String },

    /// 响应无法解析
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }
}

/// 进度服务 API
#[async_trait]
pub trait ProgressApi: Send + Sync {
    async fn initialize(
        &self,
        material_id: &MaterialId,
        total_pages: Option<i64>,
        course_id: Option<String>,
    ) -> Result<SessionDto, ClientError>;

    async fn start_page(&self, material_id: &MaterialId, page: u32)
        -> Result<SessionDto, ClientError>;

    async fn commit_page_time(
        &self,
        material_id: &MaterialId,
        page: u32,
        time_spent: u64,
    ) -> Result<SessionDto, ClientError>;

    async fn complete_page(
        &self,
        material_id: &MaterialId,
        page: u32,
    ) -> Result<SessionDto, ClientError>;

    async fn set_current_page(
        &self,
        material_id: &MaterialId,
        page: u32,
    ) -> Result<SessionDto, ClientError>;

    async fn progress(&self, material_id: &MaterialId) -> Result<SessionDto, ClientError>;

    async fn can_download(&self, material_id: &MaterialId) -> Result<DownloadDto, ClientError>;
}

/// 进度客户端配置
#[derive(Debug, Clone)]
pub struct ProgressClientConfig {
    /// 服务基础 URL
    pub base_url: String,
    /// 当前学生
    pub student_id: StudentId,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl ProgressClientConfig {
    pub fn new(base_url: impl Into<String>, student_id: StudentId) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            student_id,
            timeout_secs: 10,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// 基于 reqwest 的进度客户端
pub struct ProgressClient {
    client: Client,
    config: ProgressClientConfig,
}

impl ProgressClient {
    pub fn new(config: ProgressClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, material_id: &MaterialId, suffix: &str) -> String {
        format!(
            "{}/api/material-progress/{}{}",
            self.config.base_url, material_id, suffix
        )
    }

    fn page_url(&self, material_id: &MaterialId, page: u32, action: &str) -> String {
        self.url(material_id, &format!("/pages/{}/{}", page, action))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request
            .header(STUDENT_ID_HEADER, self.config.student_id.as_str())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Network(format!("Request timed out: {}", e))
                } else if e.is_connect() {
                    ClientError::Network(format!("Cannot connect to progress service: {}", e))
                } else {
                    ClientError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let envelope: ApiResponse<T> = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api {
                    errno: status.as_u16() as i32,
                    message: String::from_utf8_lossy(&body).into_owned(),
                });
            }
            Err(e) => return Err(ClientError::Decode(e.to_string())),
        };

        if envelope.errno != 0 {
            return Err(ClientError::Api {
                errno: envelope.errno,
                message: envelope.error,
            });
        }

        envelope
            .data
            .ok_or_else(|| ClientError::Decode("response has no data".to_string()))
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(request.json(body)).await
    }
}

#[async_trait]
impl ProgressApi for ProgressClient {
    async fn initialize(
        &self,
        material_id: &MaterialId,
        total_pages: Option<i64>,
        course_id: Option<String>,
    ) -> Result<SessionDto, ClientError> {
        let body = InitializeReadingRequest {
            total_pages,
            course_id,
        };
        self.send_json(self.client.post(self.url(material_id, "/initialize")), &body)
            .await
    }

    async fn start_page(
        &self,
        material_id: &MaterialId,
        page: u32,
    ) -> Result<SessionDto, ClientError> {
        self.send(self.client.post(self.page_url(material_id, page, "start")))
            .await
    }

    async fn commit_page_time(
        &self,
        material_id: &MaterialId,
        page: u32,
        time_spent: u64,
    ) -> Result<SessionDto, ClientError> {
        tracing::debug!(
            material_id = %material_id,
            page = page,
            time_spent = time_spent,
            "Committing page time"
        );
        let body = CommitPageTimeRequest { time_spent };
        self.send_json(self.client.put(self.page_url(material_id, page, "time")), &body)
            .await
    }

    async fn complete_page(
        &self,
        material_id: &MaterialId,
        page: u32,
    ) -> Result<SessionDto, ClientError> {
        self.send(self.client.post(self.page_url(material_id, page, "complete")))
            .await
    }

    async fn set_current_page(
        &self,
        material_id: &MaterialId,
        page: u32,
    ) -> Result<SessionDto, ClientError> {
        let body = SetCurrentPageRequest { page };
        self.send_json(self.client.put(self.url(material_id, "/current-page")), &body)
            .await
    }

    async fn progress(&self, material_id: &MaterialId) -> Result<SessionDto, ClientError> {
        self.send(self.client.get(self.url(material_id, "/progress")))
            .await
    }

    async fn can_download(&self, material_id: &MaterialId) -> Result<DownloadDto, ClientError> {
        self.send(self.client.get(self.url(material_id, "/can-download")))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::http::error::errno;
    use crate::infrastructure::http::{create_routes, AppState};
    use crate::infrastructure::memory::{
        InMemoryMaterialRepository, InMemoryReadingSessionRepository,
    };

    async fn spawn_server() -> String {
        let state = AppState::new(
            Arc::new(InMemoryReadingSessionRepository::new()),
            Arc::new(InMemoryMaterialRepository::new()),
            Arc::new(EventPublisher::new()),
        );
        let router = create_routes().with_state(Arc::new(state));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> ProgressClient {
        ProgressClient::new(ProgressClientConfig::new(
            base_url,
            StudentId::new("stu-1").unwrap(),
        ))
        .unwrap()
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let config =
            ProgressClientConfig::new("http://lms.local/", StudentId::new("s").unwrap())
                .with_timeout(3);
        assert_eq!(config.base_url, "http://lms.local");
        assert_eq!(config.timeout_secs, 3);
    }

    #[tokio::test]
    async fn test_round_trip_against_server() {
        let base_url = spawn_server().await;
        let client = client(&base_url);
        let material = MaterialId::new("doc").unwrap();

        let session = client.initialize(&material, Some(2), None).await.unwrap();
        assert_eq!(session.total_pages, 2);

        let session = client.start_page(&material, 1).await.unwrap();
        assert_eq!(session.current_page, 1);

        let session = client.commit_page_time(&material, 1, 365).await.unwrap();
        assert_eq!(session.pages[0].state.time_spent(), 365);

        let session = client.complete_page(&material, 1).await.unwrap();
        assert_eq!(session.completed_pages, 1);

        let session = client.progress(&material).await.unwrap();
        assert_eq!(session.progress.progress_percentage, 50);
        assert_eq!(session.pages.len(), 2);

        let download = client.can_download(&material).await.unwrap();
        assert!(!download.decision.can_download);
    }

    #[tokio::test]
    async fn test_rule_rejection_surfaces_errno() {
        let base_url = spawn_server().await;
        let client = client(&base_url);
        let material = MaterialId::new("doc").unwrap();
        client.initialize(&material, Some(2), None).await.unwrap();

        let err = client.set_current_page(&material, 2).await.unwrap_err();
        match err {
            ClientError::Api { errno: code, .. } => assert_eq!(code, errno::SEQUENCE_VIOLATION),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // 绑定后立即释放端口，连接必然失败
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(&format!("http://{}", addr));
        let err = client
            .progress(&MaterialId::new("doc").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_network());
    }
}
