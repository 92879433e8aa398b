use crate::models::{ObjectMetadata, RemoteObjectEntry};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;

/// Bucket the screen uploads into
pub const DEFAULT_BUCKET: &str = "uploads";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Object already exists: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed store response: {0}")]
    Decode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    /// Overwrite an existing key instead of failing
    pub upsert: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: usize,
    pub offset: usize,
    /// Sorting is always by object name
    pub order: SortOrder,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
            order: SortOrder::Desc,
        }
    }
}

/// Remote object storage as the screen consumes it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, key: &str, data: Bytes, options: &UploadOptions) -> StoreResult<()>;

    /// Deterministic: the same key always resolves to the same URL.
    fn public_url(&self, key: &str) -> String;

    async fn list(&self, prefix: &str, options: &ListOptions) -> StoreResult<Vec<RemoteObjectEntry>>;
}

/// `<base>/storage/v1/object/public/<bucket>/<key>`, the template public objects are served under.
pub fn supabase_public_url(base_url: &str, bucket: &str, key: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        base_url.trim_end_matches('/'),
        bucket,
        key.trim_start_matches('/')
    )
}

/// Orders by name and applies offset/limit, for backends that cannot sort server side.
pub fn sort_and_page(mut entries: Vec<RemoteObjectEntry>, options: &ListOptions) -> Vec<RemoteObjectEntry> {
    entries.sort_by(|a, b| match options.order {
        SortOrder::Asc => a.name.cmp(&b.name),
        SortOrder::Desc => b.name.cmp(&a.name),
    });
    entries
        .into_iter()
        .skip(options.offset)
        .take(options.limit)
        .collect()
}

/// S3-compatible backend (MinIO, Supabase's S3 endpoint, AWS).
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn head_content_type(&self, key: &str) -> Option<String> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(res) => res.content_type,
            Err(e) => {
                tracing::debug!("S3 head_object failed for {}: {:?}", key, e);
                None
            }
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, key: &str, data: Bytes, options: &UploadOptions) -> StoreResult<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(&options.content_type)
            .body(ByteStream::from(data));

        if !options.upsert {
            request = request.if_none_match("*");
        }

        request.send().await.map_err(|e| {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, error={:?}",
                self.bucket,
                key,
                e
            );
            match e.raw_response().map(|r| r.status().as_u16()) {
                Some(409) | Some(412) => StoreError::Conflict(key.to_string()),
                Some(401) | Some(403) => StoreError::Unauthorized(e.to_string()),
                Some(413) => StoreError::PayloadTooLarge(key.to_string()),
                Some(status) => StoreError::Rejected {
                    status,
                    message: e.to_string(),
                },
                None => StoreError::Transport(e.to_string()),
            }
        })?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key.trim_start_matches('/'))
    }

    async fn list(&self, prefix: &str, options: &ListOptions) -> StoreResult<Vec<RemoteObjectEntry>> {
        // S3 only lists ascending, so collect every page before ordering.
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let res = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .map_err(|e| StoreError::Transport(e.to_string()))?;

            for object in res.contents.unwrap_or_default() {
                if let Some(key) = object.key {
                    let name = key.strip_prefix(prefix).unwrap_or(&key).to_string();
                    objects.push(RemoteObjectEntry {
                        id: object.e_tag.map(|t| t.trim_matches('"').to_string()),
                        metadata: Some(ObjectMetadata {
                            mimetype: None,
                            size: object.size.and_then(|s| u64::try_from(s).ok()),
                        }),
                        name,
                    });
                }
            }

            if res.is_truncated.unwrap_or(false) {
                continuation_token = res.next_continuation_token;
            } else {
                break;
            }
        }

        let mut page = sort_and_page(objects, options);
        for entry in &mut page {
            let key = format!("{}{}", prefix, entry.name);
            let mimetype = self.head_content_type(&key).await;
            if let Some(metadata) = entry.metadata.as_mut() {
                metadata.mimetype = mimetype;
            }
        }
        Ok(page)
    }
}
