use crate::services::listing::DEFAULT_LIST_LIMIT;
use crate::services::storage::DEFAULT_BUCKET;
use crate::utils::validation::ValidationPolicy;
use anyhow::{Result, bail};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Supabase Storage REST API
    Supabase,
    /// Any S3-compatible endpoint
    S3,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "supabase" => Ok(StoreBackend::Supabase),
            "s3" | "minio" => Ok(StoreBackend::S3),
            other => bail!("Unknown STORAGE_BACKEND '{}' (expected 'supabase' or 's3')", other),
        }
    }
}

/// Object store connection settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend type: "supabase" or "s3" (default: "supabase")
    pub backend: StoreBackend,

    /// Bucket name (default: "uploads")
    pub bucket: String,

    /// Project URL, e.g. https://<project>.supabase.co
    pub supabase_url: Option<String>,

    /// Anonymous API key
    pub supabase_anon_key: Option<String>,

    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,

    /// S3 region (default: "us-east-1")
    pub s3_region: String,

    /// Base URL public object links are built from, when not the Supabase template
    pub public_base_url: Option<String>,

    /// HTTP client timeout in seconds (default: 30)
    pub http_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Supabase,
            bucket: DEFAULT_BUCKET.to_string(),
            supabase_url: None,
            supabase_anon_key: None,
            s3_endpoint: None,
            s3_access_key: None,
            s3_secret_key: None,
            s3_region: "us-east-1".to_string(),
            public_base_url: None,
            http_timeout_secs: 30,
        }
    }
}

/// Everything the upload screen needs at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,

    /// Allowed types and size limit (default: PNG/JPEG/PDF up to 5 MB)
    pub policy: ValidationPolicy,

    /// Scratch directory picked files are copied into
    pub staging_dir: PathBuf,

    /// Objects fetched per listing (default: 100)
    pub list_limit: usize,

    /// Append a random suffix to object keys (default: false)
    pub unique_object_keys: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            policy: ValidationPolicy::default(),
            staging_dir: env::temp_dir().join("bucket-uploader-cache"),
            list_limit: DEFAULT_LIST_LIMIT,
            unique_object_keys: false,
        }
    }
}

fn parse_bool(v: &str) -> bool {
    let v = v.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes"
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup. Missing connection settings for the
    /// selected backend are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("STORAGE_BACKEND") {
            Some(v) => v.parse()?,
            None => default.store.backend,
        };

        let store = StoreConfig {
            backend,
            bucket: get("STORAGE_BUCKET").unwrap_or(default.store.bucket),
            supabase_url: get("SUPABASE_URL"),
            supabase_anon_key: get("SUPABASE_ANON_KEY").or_else(|| get("SUPABASE_ANNON_KEY")),
            s3_endpoint: get("S3_ENDPOINT"),
            s3_access_key: get("S3_ACCESS_KEY"),
            s3_secret_key: get("S3_SECRET_KEY"),
            s3_region: get("S3_REGION").unwrap_or(default.store.s3_region),
            public_base_url: get("S3_PUBLIC_BASE_URL"),
            http_timeout_secs: get("HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.store.http_timeout_secs),
        };

        match store.backend {
            StoreBackend::Supabase => {
                if store.supabase_url.is_none() {
                    bail!("SUPABASE_URL must be set");
                }
                if store.supabase_anon_key.is_none() {
                    bail!("SUPABASE_ANON_KEY must be set");
                }
            }
            StoreBackend::S3 => {
                for (key, value) in [
                    ("S3_ENDPOINT", &store.s3_endpoint),
                    ("S3_ACCESS_KEY", &store.s3_access_key),
                    ("S3_SECRET_KEY", &store.s3_secret_key),
                ] {
                    if value.is_none() {
                        bail!("{} must be set when STORAGE_BACKEND=s3", key);
                    }
                }
            }
        }

        let policy = ValidationPolicy {
            allowed_mime_types: get("ALLOWED_MIME_TYPES")
                .map(|v| {
                    v.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect()
                })
                .unwrap_or(default.policy.allowed_mime_types),
            max_size_bytes: get("MAX_FILE_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.policy.max_size_bytes),
        };

        Ok(Self {
            store,
            policy,
            staging_dir: get("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),
            list_limit: get("LIST_LIMIT")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(default.list_limit),
            unique_object_keys: get("UNIQUE_OBJECT_KEYS")
                .map(|v| parse_bool(&v))
                .unwrap_or(default.unique_object_keys),
        })
    }
}
