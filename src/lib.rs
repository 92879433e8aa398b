pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::keys::KeyGenerator;
use crate::services::listing::ListingService;
use crate::services::staging::{FileSystem, StagingEncoder, TokioFileSystem};
use crate::services::storage::ObjectStore;
use crate::services::upload_service::UploadService;
use crate::services::upload_view::UploadView;
use std::sync::Arc;

/// Wires the upload screen together around an injected store.
pub fn create_view(config: &AppConfig, store: Arc<dyn ObjectStore>) -> UploadView {
    create_view_with(
        config,
        store,
        Arc::new(TokioFileSystem),
        KeyGenerator::new(config.unique_object_keys),
    )
}

pub fn create_view_with(
    config: &AppConfig,
    store: Arc<dyn ObjectStore>,
    fs: Arc<dyn FileSystem>,
    keys: KeyGenerator,
) -> UploadView {
    let staging = StagingEncoder::new(fs, config.staging_dir.clone());
    let uploader = UploadService::new(store.clone(), staging, config.policy.clone(), keys);
    let listing = ListingService::new(store, config.list_limit);
    UploadView::new(uploader, listing)
}
