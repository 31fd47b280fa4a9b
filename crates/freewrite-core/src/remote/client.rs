//! HTTP client for the journal service.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;

use super::error::{ApiError, ApiResult};
use super::types::{AnalysisRequest, AnalysisResponse, EntryContent, PromptResponse, RemoteEntry};
use crate::config::ClientConfig;
use crate::util::compact_text;

/// Request/response boundary to the journal service used by the sync engine.
#[async_trait]
pub trait JournalApi: Send + Sync {
    /// Connectivity as of the last health check. Never performs I/O.
    fn is_connected(&self) -> bool;

    /// Call the health endpoint and record the outcome.
    async fn check_connectivity(&self) -> bool;

    async fn create_entry(&self, content: &str) -> ApiResult<RemoteEntry>;

    /// Fetch one record. A missing record is an `ApiError::Server` with status 404.
    async fn get_entry(&self, id: &str) -> ApiResult<RemoteEntry>;

    async fn update_entry(&self, id: &str, content: &str) -> ApiResult<RemoteEntry>;

    async fn delete_entry(&self, id: &str) -> ApiResult<()>;

    async fn list_entries(&self, limit: usize, offset: usize) -> ApiResult<Vec<RemoteEntry>>;
}

/// `reqwest`-backed journal service client.
pub struct HttpJournalClient {
    base_url: String,
    health_url: Url,
    client: Client,
    connected: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl HttpJournalClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let base_url = config.api_base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|error| ApiError::InvalidUrl(format!("{base_url}: {error}")))?;

        let health_url = health_url_for(&base_url);
        let health_url = Url::parse(&health_url)
            .map_err(|error| ApiError::InvalidUrl(format!("{health_url}: {error}")))?;

        let client = Client::builder()
            .connect_timeout(config.request_timeout)
            .timeout(config.transfer_timeout)
            .build()?;

        Ok(Self {
            base_url,
            health_url,
            client,
            connected: AtomicBool::new(false),
            last_error: RwLock::new(None),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Human-readable reason for the last failed health check, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    /// Ask the service for an AI analysis of an entry.
    pub async fn analyze(&self, entry_id: &str, analysis_type: &str) -> ApiResult<AnalysisResponse> {
        let body = AnalysisRequest {
            entry_id: entry_id.to_string(),
            analysis_type: analysis_type.to_string(),
        };
        self.send_json(Method::POST, "/analysis/analyze", &body).await
    }

    /// Fetch an AI-generated writing prompt.
    pub async fn writing_prompt(&self) -> ApiResult<String> {
        let response: PromptResponse = self.get_json("/analysis/prompt").await?;
        Ok(response.prompt)
    }

    fn endpoint_url(&self, path: &str) -> ApiResult<Url> {
        let raw = format!("{}{path}", self.base_url);
        Url::parse(&raw).map_err(|error| ApiError::InvalidUrl(format!("{raw}: {error}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.client.get(self.endpoint_url(path)?);
        self.execute(Method::GET, path, request).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body).map_err(ApiError::EncodingFailed)?;
        let request = self
            .client
            .request(method.clone(), self.endpoint_url(path)?)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        self.execute(method, path, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> ApiResult<T> {
        tracing::debug!("{} {}", method, path);

        let response = request.header(ACCEPT, "application/json").send().await?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|error| ApiError::InvalidResponse(error.to_string()))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            tracing::debug!("{} {} failed with {}", method, path, status.as_u16());
            return Err(ApiError::Server {
                status: status.as_u16(),
                body: compact_text(&body),
            });
        }

        serde_json::from_slice(&bytes).map_err(|error| ApiError::DecodingFailed(error.to_string()))
    }

    async fn record_health(&self, connected: bool, error: Option<String>) {
        self.connected.store(connected, Ordering::SeqCst);
        *self.last_error.write().await = error;
    }
}

#[async_trait]
impl JournalApi for HttpJournalClient {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn check_connectivity(&self) -> bool {
        match self.client.get(self.health_url.clone()).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                self.record_health(true, None).await;
                true
            }
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::warn!("Journal service health check returned {}", status);
                self.record_health(false, Some(format!("Server returned status {status}")))
                    .await;
                false
            }
            Err(error) => {
                tracing::warn!("Journal service unreachable: {}", error);
                self.record_health(false, Some(format!("Connection failed: {error}")))
                    .await;
                false
            }
        }
    }

    async fn create_entry(&self, content: &str) -> ApiResult<RemoteEntry> {
        let body = EntryContent {
            content: content.to_string(),
        };
        self.send_json(Method::POST, "/journals/", &body).await
    }

    async fn get_entry(&self, id: &str) -> ApiResult<RemoteEntry> {
        self.get_json(&journal_path(id)).await
    }

    async fn update_entry(&self, id: &str, content: &str) -> ApiResult<RemoteEntry> {
        let body = EntryContent {
            content: content.to_string(),
        };
        self.send_json(Method::PUT, &journal_path(id), &body).await
    }

    async fn delete_entry(&self, id: &str) -> ApiResult<()> {
        let path = journal_path(id);
        let request = self.client.delete(self.endpoint_url(&path)?);
        let _status: BTreeMap<String, String> = self.execute(Method::DELETE, &path, request).await?;
        Ok(())
    }

    async fn list_entries(&self, limit: usize, offset: usize) -> ApiResult<Vec<RemoteEntry>> {
        self.get_json(&format!("/journals/?limit={limit}&offset={offset}"))
            .await
    }
}

fn journal_path(id: &str) -> String {
    format!("/journals/{}", urlencoding::encode(id))
}

/// The health endpoint lives beside the API root rather than under it.
fn health_url_for(base_url: &str) -> String {
    base_url.strip_suffix("/api").map_or_else(
        || base_url.replace("/api", "/health"),
        |root| format!("{root}/health"),
    )
}
