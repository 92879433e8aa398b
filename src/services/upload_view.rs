use crate::error::UploadError;
use crate::models::{PickedFile, RemoteObjectEntry, UploadResult};
use crate::services::listing::ListingService;
use crate::services::upload_service::UploadService;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Uploading,
    Success(UploadResult),
    /// User-facing message
    Error(String),
}

/// What the screen renders from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub state: ViewState,
    pub files: Vec<RemoteObjectEntry>,
}

impl ViewSnapshot {
    /// The pick button is disabled while an upload is in flight.
    pub fn trigger_enabled(&self) -> bool {
        !matches!(self.state, ViewState::Uploading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn last_upload(&self) -> Option<&UploadResult> {
        match &self.state {
            ViewState::Success(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum PickOutcome {
    /// Another upload was still running; the picker was never opened.
    Ignored,
    Completed(Result<UploadResult, UploadError>),
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Long-lived state machine behind the upload screen:
/// `Idle -> Uploading -> {Success, Error}`, and any later pick goes straight back to
/// `Uploading`.
///
/// Only this type writes the displayed collection. Listing results are tagged with a
/// generation so a slow, older refresh can never overwrite a newer one.
pub struct UploadView {
    uploader: UploadService,
    listing: ListingService,
    in_flight: AtomicBool,
    refresh_issued: AtomicU64,
    refresh_applied: Mutex<u64>,
    snapshot: watch::Sender<ViewSnapshot>,
}

impl UploadView {
    pub fn new(uploader: UploadService, listing: ListingService) -> Self {
        let (snapshot, _) = watch::channel(ViewSnapshot {
            state: ViewState::Idle,
            files: Vec::new(),
        });
        Self {
            uploader,
            listing,
            in_flight: AtomicBool::new(false),
            refresh_issued: AtomicU64::new(0),
            refresh_applied: Mutex::new(0),
            snapshot,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn listing(&self) -> &ListingService {
        &self.listing
    }

    /// Initial load of the grid.
    pub async fn mount(&self) {
        tracing::info!("📱 Upload view mounted");
        self.refresh().await;
    }

    /// Reloads the grid. Failures are logged and leave the grid as it was.
    pub async fn refresh(&self) {
        let generation = self.refresh_issued.fetch_add(1, Ordering::AcqRel) + 1;

        match self.listing.refresh().await {
            Ok(files) => {
                let mut applied = self.refresh_applied.lock().await;
                if generation < *applied {
                    tracing::debug!(
                        "Discarding stale listing (generation {} < {})",
                        generation,
                        *applied
                    );
                    return;
                }
                *applied = generation;
                self.snapshot.send_modify(|s| s.files = files);
            }
            Err(e) => {
                tracing::warn!("⚠️  Could not refresh uploaded files: {}", e);
            }
        }
    }

    /// Opens the picker and uploads whatever it returns.
    ///
    /// While an upload is running the trigger is disabled: the call returns
    /// [`PickOutcome::Ignored`] without invoking `picker`.
    pub async fn pick<F, Fut>(&self, picker: F) -> PickOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<PickedFile>>,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Pick ignored, an upload is already in flight");
            return PickOutcome::Ignored;
        }
        let guard = InFlight(&self.in_flight);

        self.snapshot.send_modify(|s| s.state = ViewState::Uploading);

        let picked = picker().await;
        let result = self.uploader.upload(picked).await;

        match &result {
            Ok(uploaded) => {
                self.snapshot
                    .send_modify(|s| s.state = ViewState::Success(uploaded.clone()));
            }
            Err(e) => {
                let message = e.user_message(self.uploader.policy());
                self.snapshot.send_modify(|s| s.state = ViewState::Error(message));
            }
        }
        drop(guard);

        if result.is_ok() {
            self.refresh().await;
        }

        PickOutcome::Completed(result)
    }

    /// Uploads an already chosen file (or a cancelled pick when `None`).
    pub async fn submit(&self, picked: Option<PickedFile>) -> PickOutcome {
        self.pick(|| async move { picked }).await
    }
}
