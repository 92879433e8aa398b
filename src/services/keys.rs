use crate::utils::validation::file_extension;
use rand::Rng;
use std::sync::Arc;

pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Assigns remote keys of the form `<millis>.<ext>`.
///
/// Two uploads inside the same millisecond get the same key and the second one is
/// refused by the store. With `unique` set, an 8 hex digit suffix is added:
/// `<millis>-<suffix>.<ext>`.
#[derive(Clone)]
pub struct KeyGenerator {
    clock: Clock,
    unique: bool,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new(false)
    }
}

impl KeyGenerator {
    pub fn new(unique: bool) -> Self {
        Self {
            clock: Arc::new(|| chrono::Utc::now().timestamp_millis()),
            unique,
        }
    }

    pub fn with_clock(clock: Clock, unique: bool) -> Self {
        Self { clock, unique }
    }

    pub fn generate(&self, original_name: &str, mime_type: Option<&str>) -> String {
        let millis = (self.clock)();
        let ext = file_extension(original_name, mime_type);
        if self.unique {
            let suffix: u32 = rand::thread_rng().r#gen();
            format!("{}-{:08x}.{}", millis, suffix, ext)
        } else {
            format!("{}.{}", millis, ext)
        }
    }
}
