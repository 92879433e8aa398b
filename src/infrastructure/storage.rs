use crate::config::{StoreBackend, StoreConfig};
use crate::services::storage::{ObjectStore, S3ObjectStore};
use crate::services::supabase::SupabaseStorage;
use anyhow::{Context, Result};
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builds the configured object store. Constructed once at startup and handed to the
/// services that need it.
pub async fn setup_storage(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>> {
    match config.backend {
        StoreBackend::Supabase => {
            let url = config
                .supabase_url
                .as_deref()
                .context("SUPABASE_URL must be set")?;
            let anon_key = config
                .supabase_anon_key
                .clone()
                .context("SUPABASE_ANON_KEY must be set")?;

            info!("☁️  Supabase Storage: {} (Bucket: {})", url, config.bucket);

            let store = SupabaseStorage::new(
                url,
                anon_key,
                config.bucket.clone(),
                Duration::from_secs(config.http_timeout_secs),
            )?;
            Ok(Arc::new(store))
        }
        StoreBackend::S3 => {
            let endpoint_url = config.s3_endpoint.as_deref().context("S3_ENDPOINT must be set")?;
            let access_key = config.s3_access_key.clone().context("S3_ACCESS_KEY must be set")?;
            let secret_key = config.s3_secret_key.clone().context("S3_SECRET_KEY must be set")?;

            info!("☁️  S3 Storage: {} (Bucket: {})", endpoint_url, config.bucket);

            let aws_config = aws_config::from_env()
                .endpoint_url(endpoint_url)
                .region(Region::new(config.s3_region.clone()))
                .credentials_provider(aws_sdk_s3::config::Credentials::new(
                    access_key, secret_key, None, None, "static",
                ))
                .load()
                .await;

            let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(true)
                .build();

            let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
            let public_base_url = public_base_url(config, endpoint_url);
            info!("🔗 Public objects served from {}", public_base_url);

            Ok(Arc::new(S3ObjectStore::new(
                s3_client,
                config.bucket.clone(),
                public_base_url,
            )))
        }
    }
}

fn public_base_url(config: &StoreConfig, endpoint_url: &str) -> String {
    if let Some(base) = &config.public_base_url {
        return base.trim_end_matches('/').to_string();
    }
    match &config.supabase_url {
        Some(url) => format!(
            "{}/storage/v1/object/public/{}",
            url.trim_end_matches('/'),
            config.bucket
        ),
        None => format!("{}/{}", endpoint_url.trim_end_matches('/'), config.bucket),
    }
}
