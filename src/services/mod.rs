pub mod keys;
pub mod listing;
pub mod picker;
pub mod staging;
pub mod storage;
pub mod supabase;
pub mod upload_service;
pub mod upload_view;
