use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use bucket_uploader::config::AppConfig;
use bucket_uploader::create_view_with;
use bucket_uploader::error::UploadError;
use bucket_uploader::models::PickedFile;
use bucket_uploader::services::keys::KeyGenerator;
use bucket_uploader::services::staging::TokioFileSystem;
use bucket_uploader::services::storage::{
    ListOptions, ObjectStore, SortOrder, StoreError, UploadOptions,
};
use bucket_uploader::services::supabase::SupabaseStorage;
use bucket_uploader::services::upload_view::PickOutcome;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ANON_KEY: &str = "test-anon-key";

#[derive(Default)]
struct FakeBucket {
    objects: BTreeMap<String, (Vec<u8>, String)>,
    last_list_body: Option<Value>,
    last_upsert_header: Option<String>,
}

type Shared = Arc<Mutex<FakeBucket>>;

fn authorized(headers: &HeaderMap) -> bool {
    let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
    let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
    apikey == Some(ANON_KEY) && bearer == Some(&format!("Bearer {}", ANON_KEY))
}

async fn upload_object(
    State(bucket): State<Shared>,
    Path((name, key)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "statusCode": "401", "error": "Unauthorized", "message": "Invalid JWT" })),
        )
            .into_response();
    }
    if name != "uploads" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "statusCode": "404", "error": "Bucket not found", "message": "Bucket not found" })),
        )
            .into_response();
    }

    let upsert = headers
        .get("x-upsert")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut bucket = bucket.lock().unwrap();
    bucket.last_upsert_header = upsert.clone();
    if upsert.as_deref() != Some("true") && bucket.objects.contains_key(&key) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "statusCode": "409",
                "error": "Duplicate",
                "message": "The resource already exists"
            })),
        )
            .into_response();
    }
    bucket.objects.insert(key.clone(), (body.to_vec(), content_type));
    Json(json!({ "Key": format!("uploads/{}", key) })).into_response()
}

async fn list_objects(
    State(bucket): State<Shared>,
    Path(_name): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid JWT" }))).into_response();
    }
    let mut bucket = bucket.lock().unwrap();
    bucket.last_list_body = Some(body.clone());

    let limit = body["limit"].as_u64().unwrap_or(100) as usize;
    let descending = body["sortBy"]["order"] == "desc";
    let mut rows: Vec<Value> = bucket
        .objects
        .iter()
        .map(|(name, (data, mimetype))| {
            json!({
                "name": name,
                "id": format!("id-{}", name),
                "updated_at": "2024-01-01T00:00:00.000Z",
                "metadata": { "mimetype": mimetype, "size": data.len(), "eTag": "\"x\"" }
            })
        })
        .collect();
    if descending {
        rows.reverse();
    }
    rows.truncate(limit);
    Json(Value::Array(rows)).into_response()
}

async fn spawn_fake_storage() -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(FakeBucket::default()));
    let app = Router::new()
        .route("/storage/v1/object/list/:bucket", post(list_objects))
        .route("/storage/v1/object/:bucket/*key", post(upload_object))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

fn store(base_url: &str, key: &str) -> SupabaseStorage {
    SupabaseStorage::new(
        base_url,
        key.to_string(),
        "uploads".to_string(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn png_options() -> UploadOptions {
    UploadOptions {
        content_type: "image/png".to_string(),
        upsert: false,
    }
}

#[tokio::test]
async fn test_upload_sends_bytes_and_headers() {
    let (base_url, state) = spawn_fake_storage().await;
    let store = store(&base_url, ANON_KEY);

    store
        .upload("1700000000000.png", bytes::Bytes::from_static(b"\x89PNG-data"), &png_options())
        .await
        .unwrap();

    let bucket = state.lock().unwrap();
    let (data, content_type) = bucket.objects.get("1700000000000.png").unwrap();
    assert_eq!(data, b"\x89PNG-data");
    assert_eq!(content_type, "image/png");
    assert_eq!(bucket.last_upsert_header.as_deref(), Some("false"));
}

#[tokio::test]
async fn test_duplicate_key_maps_to_conflict() {
    let (base_url, _state) = spawn_fake_storage().await;
    let store = store(&base_url, ANON_KEY);
    let body = bytes::Bytes::from_static(b"data");

    store.upload("1.png", body.clone(), &png_options()).await.unwrap();
    let err = store.upload("1.png", body, &png_options()).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(key) if key == "1.png"));
}

#[tokio::test]
async fn test_bad_key_maps_to_unauthorized() {
    let (base_url, _state) = spawn_fake_storage().await;
    let store = store(&base_url, "wrong-key");

    let err = store
        .upload("1.png", bytes::Bytes::from_static(b"data"), &png_options())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized(_)));

    let err = store.list("", &ListOptions::default()).await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized(_)));
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = store(&format!("http://{}", addr), ANON_KEY);
    let err = store
        .upload("1.png", bytes::Bytes::from_static(b"data"), &png_options())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)));
}

#[tokio::test]
async fn test_list_request_and_response() {
    let (base_url, state) = spawn_fake_storage().await;
    let store = store(&base_url, ANON_KEY);
    for name in ["b.png", "a.pdf", "c.jpg"] {
        store
            .upload(name, bytes::Bytes::from_static(b"x"), &png_options())
            .await
            .unwrap();
    }

    let options = ListOptions {
        limit: 100,
        offset: 0,
        order: SortOrder::Desc,
    };
    let entries = store.list("", &options).await.unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["c.jpg", "b.png", "a.pdf"]);
    assert_eq!(entries[0].id.as_deref(), Some("id-c.jpg"));
    assert_eq!(entries[0].mimetype(), Some("image/png"));

    let body = state.lock().unwrap().last_list_body.clone().unwrap();
    assert_eq!(
        body,
        json!({ "prefix": "", "limit": 100, "offset": 0, "sortBy": { "column": "name", "order": "desc" } })
    );
}

#[tokio::test]
async fn test_view_end_to_end_against_http_store() {
    let (base_url, state) = spawn_fake_storage().await;
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        staging_dir: dir.path().join("cache"),
        ..AppConfig::default()
    };
    let view = create_view_with(
        &config,
        Arc::new(store(&base_url, ANON_KEY)),
        Arc::new(TokioFileSystem),
        KeyGenerator::with_clock(Arc::new(|| 1_700_000_000_000), false),
    );

    view.mount().await;
    assert!(view.snapshot().files.is_empty());

    let path = dir.path().join("report.pdf");
    std::fs::write(&path, b"%PDF-1.7 body").unwrap();
    let file = PickedFile::new("report.pdf", path.to_str().unwrap())
        .with_mime_type("application/pdf")
        .with_size(13);

    let result = match view.submit(Some(file)).await {
        PickOutcome::Completed(Ok(result)) => result,
        other => panic!("expected success, got {:?}", other),
    };
    assert_eq!(
        result.public_url,
        format!("{}/storage/v1/object/public/uploads/1700000000000.pdf", base_url)
    );

    let snapshot = view.snapshot();
    assert_eq!(snapshot.files.len(), 1);
    assert_eq!(snapshot.files[0].name, "1700000000000.pdf");
    assert_eq!(view.listing().public_url(&snapshot.files[0]), result.public_url);
    assert!(state.lock().unwrap().objects.contains_key("1700000000000.pdf"));

    // Same millisecond again: refused by the store, grid unchanged.
    let again = dir.path().join("again.pdf");
    std::fs::write(&again, b"%PDF-1.7 other").unwrap();
    let file = PickedFile::new("again.pdf", again.to_str().unwrap())
        .with_mime_type("application/pdf")
        .with_size(14);
    assert!(matches!(
        view.submit(Some(file)).await,
        PickOutcome::Completed(Err(UploadError::UploadFailure(StoreError::Conflict(_))))
    ));
    assert_eq!(view.snapshot().files, snapshot.files);
}
