use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One time-bounded cached value.
///
/// Reads inside the TTL window return the cached value; reads past it run
/// the loader again. A background refresher can call
/// [`TtlCell::refresh_with`] ahead of expiry so foreground reads stay warm.
#[derive(Debug)]
pub struct TtlCell<T> {
    ttl: Duration,
    slot: Mutex<Option<(T, Instant)>>,
}

impl<T: Clone> TtlCell<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slot: Mutex::new(None) }
    }

    /// Returns the cached value, reloading through `load` when the cache is
    /// empty or stale.
    pub fn get_with<F>(&self, load: F) -> T
    where
        F: FnOnce() -> T,
    {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.as_ref() {
            Some((value, loaded_at)) if loaded_at.elapsed() < self.ttl => value.clone(),
            _ => {
                let value = load();
                *slot = Some((value.clone(), Instant::now()));
                value
            }
        }
    }

    /// Reloads unconditionally and returns the fresh value.
    pub fn refresh_with<F>(&self, load: F) -> T
    where
        F: FnOnce() -> T,
    {
        let value = load();
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some((value.clone(), Instant::now()));
        value
    }

    /// The cached value, if any, regardless of staleness.
    pub fn peek(&self) -> Option<T> {
        let slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.as_ref().map(|(value, _)| value.clone())
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }
}
