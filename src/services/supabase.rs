use crate::models::RemoteObjectEntry;
use crate::services::storage::{
    ListOptions, ObjectStore, StoreError, StoreResult, UploadOptions, supabase_public_url,
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Talks to the Supabase Storage REST API with the project's anonymous key.
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    anon_key: String,
    bucket: String,
}

#[derive(Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
}

#[derive(Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "statusCode")]
    status_code: Option<String>,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, anon_key: String, bucket: String, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            bucket,
        })
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}/storage/v1{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn error_from(key: &str, response: Response) -> StoreError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = body
            .message
            .or(body.error)
            .unwrap_or_else(|| text.clone());

        // The storage API reports duplicates as 400 with statusCode "409".
        let duplicate = status == StatusCode::CONFLICT
            || body.status_code.as_deref() == Some("409")
            || message.to_lowercase().contains("duplicate")
            || message.to_lowercase().contains("already exists");

        if duplicate {
            return StoreError::Conflict(key.to_string());
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(message),
            StatusCode::PAYLOAD_TOO_LARGE => StoreError::PayloadTooLarge(message),
            _ => StoreError::Rejected {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(&self, key: &str, data: Bytes, options: &UploadOptions) -> StoreResult<()> {
        let url = self.build_url(&format!("/object/{}/{}", self.bucket, key));
        let response = self
            .authorized(self.client.post(&url))
            .header(reqwest::header::CONTENT_TYPE, &options.content_type)
            .header("x-upsert", options.upsert.to_string())
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .body(data)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(key, response).await);
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        supabase_public_url(&self.base_url, &self.bucket, key)
    }

    async fn list(&self, prefix: &str, options: &ListOptions) -> StoreResult<Vec<RemoteObjectEntry>> {
        let url = self.build_url(&format!("/object/list/{}", self.bucket));
        let body = ListRequest {
            prefix,
            limit: options.limit,
            offset: options.offset,
            sort_by: SortBy {
                column: "name",
                order: options.order.as_str(),
            },
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(prefix, response).await);
        }

        response
            .json::<Vec<RemoteObjectEntry>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}
