//! Named loading operations.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use sea_domain::{DomainResult, LoadingItem, LoadingKind, LoadingUpdate};
use tokio::sync::broadcast;

use super::NotificationEvent;

#[derive(Debug)]
struct Entry {
    item: LoadingItem,
    /// Distinguishes restarts of the same id.
    generation: u64,
}

/// Tracks running operations by caller-supplied id.
///
/// Starting an id that is already running replaces it; items keep the
/// order in which their ids were first started.
#[derive(Debug, Clone)]
pub struct LoadingTracker {
    entries: Arc<Mutex<Vec<Entry>>>,
    next_generation: Arc<AtomicU64>,
    events: broadcast::Sender<NotificationEvent>,
}

impl LoadingTracker {
    pub(crate) fn with_events(events: broadcast::Sender<NotificationEvent>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_generation: Arc::new(AtomicU64::new(0)),
            events,
        }
    }

    /// Starts (or restarts) an operation.
    ///
    /// # Errors
    /// Returns an error if `id` is blank or `progress` exceeds 100.
    pub fn start(
        &self,
        id: &str,
        kind: LoadingKind,
        message: Option<String>,
        progress: Option<u8>,
    ) -> DomainResult<()> {
        self.start_generation(id, kind, message, progress).map(drop)
    }

    /// Like `start`, returning the generation a later
    /// [`stop_generation`](Self::stop_generation) must match.
    pub(crate) fn start_generation(
        &self,
        id: &str,
        kind: LoadingKind,
        message: Option<String>,
        progress: Option<u8>,
    ) -> DomainResult<u64> {
        let item = LoadingItem::new(id, kind, message, progress)?;
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        {
            let mut entries = self.entries.lock();
            match entries.iter_mut().find(|entry| entry.item.id == id) {
                Some(existing) => *existing = Entry { item, generation },
                None => entries.push(Entry { item, generation }),
            }
        }
        self.emit(id, true);
        Ok(generation)
    }

    /// Applies a partial update. Returns false if `id` is not running.
    ///
    /// # Errors
    /// Returns an error if the new progress exceeds 100.
    pub fn update(&self, id: &str, update: LoadingUpdate) -> DomainResult<bool> {
        let mut entries = self.entries.lock();
        match entries.iter_mut().find(|entry| entry.item.id == id) {
            Some(entry) => entry.item.apply(update).map(|()| true),
            None => Ok(false),
        }
    }

    /// Stops an operation. Returns false if it was not running.
    pub fn stop(&self, id: &str) -> bool {
        self.remove_where(id, |entry| entry.item.id == id)
    }

    /// Stops `id` only if it was not restarted since `generation` began.
    pub(crate) fn stop_generation(&self, id: &str, generation: u64) -> bool {
        self.remove_where(id, |entry| {
            entry.item.id == id && entry.generation == generation
        })
    }

    /// The running operation with this id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<LoadingItem> {
        self.entries
            .lock()
            .iter()
            .find(|entry| entry.item.id == id)
            .map(|entry| entry.item.clone())
    }

    /// All running operations.
    #[must_use]
    pub fn items(&self) -> Vec<LoadingItem> {
        self.entries.lock().iter().map(|entry| entry.item.clone()).collect()
    }

    /// Whether `id` is running.
    #[must_use]
    pub fn is_loading(&self, id: &str) -> bool {
        self.entries.lock().iter().any(|entry| entry.item.id == id)
    }

    /// True iff at least one `Global` operation is running.
    #[must_use]
    pub fn is_global_loading(&self) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|entry| entry.item.kind == LoadingKind::Global)
    }

    /// Stops everything.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.entries.lock());
        for entry in removed {
            self.emit(&entry.item.id, false);
        }
    }

    fn remove_where(&self, id: &str, matches: impl Fn(&Entry) -> bool) -> bool {
        let removed = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|entry| !matches(entry));
            entries.len() != before
        };
        if removed {
            self.emit(id, false);
        }
        removed
    }

    fn emit(&self, id: &str, active: bool) {
        let _ = self.events.send(NotificationEvent::LoadingChanged {
            id: id.to_string(),
            active,
        });
    }
}

impl Default for LoadingTracker {
    fn default() -> Self {
        Self::with_events(broadcast::channel(64).0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sea_domain::DomainError;

    #[test]
    fn test_restart_overwrites_instead_of_stacking() {
        let tracker = LoadingTracker::default();
        tracker
            .start("x", LoadingKind::Global, Some("first".into()), None)
            .unwrap();
        tracker
            .start("x", LoadingKind::Global, Some("second".into()), None)
            .unwrap();

        let items = tracker.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].message.as_deref(), Some("second"));
    }

    #[test]
    fn test_global_flag_follows_global_items() {
        let tracker = LoadingTracker::default();
        tracker.start("table", LoadingKind::Component, None, None).unwrap();
        assert!(!tracker.is_global_loading());

        tracker.start("auth", LoadingKind::Global, None, None).unwrap();
        assert!(tracker.is_global_loading());

        assert!(tracker.stop("auth"));
        assert!(!tracker.is_global_loading());
        assert!(tracker.is_loading("table"));
    }

    #[test]
    fn test_stale_generation_leaves_restart_running() {
        let tracker = LoadingTracker::default();
        let first = tracker
            .start_generation("auth", LoadingKind::Global, None, None)
            .unwrap();
        let second = tracker
            .start_generation("auth", LoadingKind::Global, None, None)
            .unwrap();

        assert!(!tracker.stop_generation("auth", first));
        assert!(tracker.is_global_loading());
        assert!(tracker.stop_generation("auth", second));
        assert!(!tracker.is_loading("auth"));
    }

    #[test]
    fn test_update_and_stop_missing_are_noops() {
        let tracker = LoadingTracker::default();
        assert!(!tracker.update("ghost", LoadingUpdate::progress(10)).unwrap());
        assert!(!tracker.stop("ghost"));
    }

    #[test]
    fn test_partial_update() {
        let tracker = LoadingTracker::default();
        tracker
            .start("upload", LoadingKind::Api, Some("Uploading".into()), Some(0))
            .unwrap();

        assert!(tracker.update("upload", LoadingUpdate::progress(40)).unwrap());
        let item = tracker.get("upload").unwrap();
        assert_eq!(item.progress, Some(40));
        assert_eq!(item.message.as_deref(), Some("Uploading"));

        assert_eq!(
            tracker.update("upload", LoadingUpdate::progress(140)),
            Err(DomainError::InvalidProgress(140))
        );
        assert_eq!(tracker.get("upload").unwrap().progress, Some(40));
    }

    #[test]
    fn test_events_and_clear() {
        let tracker = LoadingTracker::default();
        let mut events = tracker.events.subscribe();
        tracker.start("a", LoadingKind::Page, None, None).unwrap();
        tracker.start("b", LoadingKind::Page, None, None).unwrap();
        tracker.clear();

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(seen.len(), 4);
        assert_eq!(
            seen[3],
            NotificationEvent::LoadingChanged {
                id: "b".into(),
                active: false
            }
        );
        assert!(tracker.items().is_empty());
    }

    #[test]
    fn test_blank_id_rejected() {
        let tracker = LoadingTracker::default();
        assert!(tracker.start(" ", LoadingKind::Api, None, None).is_err());
    }
}
