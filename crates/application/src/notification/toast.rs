//! Toast queue with auto-dismiss timers.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use sea_domain::{
    NotificationSettings, Toast, ToastKind, ToastRemoval, ToastRequest, generate_id,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::NotificationEvent;

#[derive(Default)]
struct ToastState {
    /// Creation order.
    toasts: Vec<Toast>,
    /// One pending timer per non-persistent toast.
    timers: HashMap<String, JoinHandle<()>>,
}

struct ToastInner {
    settings: NotificationSettings,
    state: Mutex<ToastState>,
    events: broadcast::Sender<NotificationEvent>,
}

/// Active toasts and their timers.
#[derive(Clone)]
pub struct ToastManager {
    inner: Arc<ToastInner>,
}

impl std::fmt::Debug for ToastManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToastManager")
            .field("settings", &self.inner.settings)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl ToastManager {
    /// Creates a manager with its own event channel.
    #[must_use]
    pub fn new(settings: NotificationSettings) -> Self {
        Self::with_events(settings, broadcast::channel(64).0)
    }

    pub(crate) fn with_events(
        settings: NotificationSettings,
        events: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(ToastInner {
                settings,
                state: Mutex::new(ToastState::default()),
                events,
            }),
        }
    }

    /// Shows a toast and returns its id.
    ///
    /// Non-persistent toasts schedule exactly one removal timer. Outside a
    /// tokio runtime no timer can be scheduled and the toast stays until
    /// dismissed.
    pub fn show(&self, request: ToastRequest) -> String {
        let toast = Toast::from_request(generate_id(), request, &self.inner.settings);
        let id = toast.id.clone();
        let kind = toast.kind;
        let duration = toast.duration;

        {
            let mut state = self.inner.state.lock();
            state.toasts.push(toast);
            if let Some(duration) = duration {
                match self.schedule_expiry(id.clone(), duration) {
                    Some(timer) => {
                        state.timers.insert(id.clone(), timer);
                    }
                    None => {
                        tracing::debug!(toast_id = %id, "No runtime for toast timer, toast stays until dismissed");
                    }
                }
            }
        }

        let _ = self.inner.events.send(NotificationEvent::ToastShown {
            id: id.clone(),
            kind,
        });
        id
    }

    /// Shows a success toast.
    pub fn success(&self, title: impl Into<String>, message: Option<String>) -> String {
        self.show(with_message(ToastRequest::new(ToastKind::Success, title), message))
    }

    /// Shows an error toast.
    pub fn error(&self, title: impl Into<String>, message: Option<String>) -> String {
        self.show(with_message(ToastRequest::new(ToastKind::Error, title), message))
    }

    /// Shows a warning toast.
    pub fn warning(&self, title: impl Into<String>, message: Option<String>) -> String {
        self.show(with_message(ToastRequest::new(ToastKind::Warning, title), message))
    }

    /// Shows an info toast.
    pub fn info(&self, title: impl Into<String>, message: Option<String>) -> String {
        self.show(with_message(ToastRequest::new(ToastKind::Info, title), message))
    }

    /// Removes a toast early and cancels its timer. Returns false if the
    /// toast is already gone.
    pub fn dismiss(&self, id: &str) -> bool {
        self.inner.remove(id, ToastRemoval::Dismissed)
    }

    /// Removes every toast and cancels all timers. Returns how many were
    /// removed.
    pub fn clear(&self) -> usize {
        let (toasts, timers) = {
            let mut state = self.inner.state.lock();
            (
                std::mem::take(&mut state.toasts),
                std::mem::take(&mut state.timers),
            )
        };
        for timer in timers.into_values() {
            timer.abort();
        }
        for toast in &toasts {
            self.inner.emit_removed(&toast.id, ToastRemoval::Cleared);
        }
        toasts.len()
    }

    /// All active toasts in creation order.
    #[must_use]
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner.state.lock().toasts.clone()
    }

    /// The toasts to render: newest first, at most `max_visible_toasts`.
    #[must_use]
    pub fn visible(&self) -> Vec<Toast> {
        self.inner
            .state
            .lock()
            .toasts
            .iter()
            .rev()
            .take(self.inner.settings.max_visible_toasts)
            .cloned()
            .collect()
    }

    /// Active toasts beyond the visible cap.
    #[must_use]
    pub fn overflow_count(&self) -> usize {
        self.len()
            .saturating_sub(self.inner.settings.max_visible_toasts)
    }

    /// Number of active toasts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().toasts.len()
    }

    /// Returns true if no toast is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The active toast with this id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Toast> {
        self.inner
            .state
            .lock()
            .toasts
            .iter()
            .find(|toast| toast.id == id)
            .cloned()
    }

    fn schedule_expiry(&self, id: String, duration: Duration) -> Option<JoinHandle<()>> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let inner: Weak<ToastInner> = Arc::downgrade(&self.inner);
        Some(handle.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = inner.upgrade() {
                inner.remove(&id, ToastRemoval::Expired);
            }
        }))
    }
}

impl ToastInner {
    fn remove(&self, id: &str, reason: ToastRemoval) -> bool {
        let (removed, timer) = {
            let mut state = self.state.lock();
            let removed = state
                .toasts
                .iter()
                .position(|toast| toast.id == id)
                .map(|index| state.toasts.remove(index));
            (removed, state.timers.remove(id))
        };
        if reason != ToastRemoval::Expired
            && let Some(timer) = timer
        {
            timer.abort();
        }
        if removed.is_none() {
            return false;
        }
        if reason == ToastRemoval::Expired {
            tracing::debug!(toast_id = %id, "Toast expired");
        }
        self.emit_removed(id, reason);
        true
    }

    fn emit_removed(&self, id: &str, reason: ToastRemoval) {
        let _ = self.events.send(NotificationEvent::ToastRemoved {
            id: id.to_string(),
            reason,
        });
    }
}

fn with_message(request: ToastRequest, message: Option<String>) -> ToastRequest {
    match message {
        Some(message) => request.with_message(message),
        None => request,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn manager() -> ToastManager {
        ToastManager::new(NotificationSettings::default())
    }

    fn removals(events: &mut broadcast::Receiver<NotificationEvent>) -> Vec<ToastRemoval> {
        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let NotificationEvent::ToastRemoved { reason, .. } = event {
                seen.push(reason);
            }
        }
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_dismiss_at_duration() {
        let toasts = manager();
        let id = toasts.show(
            ToastRequest::new(ToastKind::Info, "Saved").with_duration(Duration::from_millis(2000)),
        );

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(toasts.get(&id).is_some());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(toasts.get(&id).is_none());
        assert!(toasts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_early_dismiss_cancels_timer() {
        let toasts = manager();
        let mut events = toasts.inner.events.subscribe();
        let id = toasts.show(
            ToastRequest::new(ToastKind::Info, "Saved").with_duration(Duration::from_millis(2000)),
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(toasts.dismiss(&id));
        assert!(!toasts.dismiss(&id));

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(removals(&mut events), vec![ToastRemoval::Dismissed]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_kind_default_durations() {
        let toasts = manager();
        let error = toasts.error("Failed", None);
        let info = toasts.info("Heads up", Some("details".into()));

        tokio::time::sleep(Duration::from_millis(5001)).await;
        assert!(toasts.get(&info).is_none());
        assert!(toasts.get(&error).is_some());

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert!(toasts.get(&error).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_and_zero_duration_stay() {
        let toasts = manager();
        let sticky = toasts.show(ToastRequest::new(ToastKind::Error, "Offline").persistent());
        let zero =
            toasts.show(ToastRequest::new(ToastKind::Info, "Zero").with_duration(Duration::ZERO));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(toasts.get(&sticky).unwrap().is_persistent());
        assert!(toasts.get(&zero).is_some());
        assert_eq!(toasts.clear(), 2);
    }

    #[tokio::test]
    async fn test_visible_newest_first_with_overflow() {
        let toasts = manager();
        let ids: Vec<_> = (0..7)
            .map(|i| toasts.show(ToastRequest::new(ToastKind::Info, format!("t{i}")).persistent()))
            .collect();

        let visible = toasts.visible();
        assert_eq!(visible.len(), 5);
        assert_eq!(visible[0].id, ids[6]);
        assert_eq!(visible[4].id, ids[2]);
        assert_eq!(toasts.overflow_count(), 2);
        assert_eq!(toasts.toasts()[0].id, ids[0]);

        toasts.dismiss(&ids[6]);
        toasts.dismiss(&ids[5]);
        assert_eq!(toasts.overflow_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_cancels_everything() {
        let toasts = manager();
        let mut events = toasts.inner.events.subscribe();
        toasts.success("a", None);
        toasts.warning("b", None);

        assert_eq!(toasts.clear(), 2);
        assert!(toasts.inner.state.lock().timers.is_empty());
        assert_eq!(
            removals(&mut events),
            vec![ToastRemoval::Cleared, ToastRemoval::Cleared]
        );
    }

    #[test]
    fn test_without_runtime_toast_stays() {
        let toasts = manager();
        let id = toasts.success("Saved", None);
        assert!(toasts.get(&id).is_some());
        assert!(toasts.inner.state.lock().timers.is_empty());
    }
}
