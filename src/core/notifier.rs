//! Toast-style notifications.
//!
//! The overlay is created on first use and lives until [`Notifier::shutdown`].
//! Every notification schedules its own expiry on the current tokio runtime;
//! `notify` itself never waits.

use crate::domain::model::{Notification, NotificationId, Severity, DEFAULT_NOTIFICATION_TTL};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Overlay {
    entries: Mutex<Vec<Notification>>,
    timers: Mutex<HashMap<NotificationId, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl Overlay {
    fn remove(&self, id: NotificationId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|n| n.id != id);
        before != entries.len()
    }

    fn clear(&self) {
        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        for (_, handle) in timers.drain() {
            handle.abort();
        }
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

pub struct Notifier {
    default_ttl: Duration,
    overlay: Mutex<Option<Arc<Overlay>>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}

impl Notifier {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            overlay: Mutex::new(None),
        }
    }

    fn overlay(&self) -> Arc<Overlay> {
        let mut slot = self.overlay.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(slot.get_or_insert_with(|| {
            tracing::debug!("Creating notification overlay");
            Arc::new(Overlay::default())
        }))
    }

    pub fn is_initialized(&self) -> bool {
        self.overlay
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn notify(&self, severity: Severity, message: impl Into<String>) -> NotificationId {
        self.notify_for(severity, message, self.default_ttl)
    }

    pub fn notify_for(
        &self,
        severity: Severity,
        message: impl Into<String>,
        ttl: Duration,
    ) -> NotificationId {
        let overlay = self.overlay();
        let id = overlay.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let notification = Notification {
            id,
            severity,
            message: message.into(),
            ttl,
            created_at: Utc::now(),
        };

        match severity {
            Severity::Error => tracing::warn!("🔔 [{}] {}", severity.css_class(), notification.message),
            _ => tracing::info!("🔔 [{}] {}", severity.css_class(), notification.message),
        }

        overlay
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let weak: Weak<Overlay> = Arc::downgrade(&overlay);
                // The expiry task removes its own timer, so the handle must be
                // registered before that task can reach the map.
                let mut timers = overlay.timers.lock().unwrap_or_else(|e| e.into_inner());
                let handle = runtime.spawn(async move {
                    tokio::time::sleep(ttl).await;
                    if let Some(overlay) = weak.upgrade() {
                        overlay.remove(id);
                        overlay
                            .timers
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .remove(&id);
                    }
                });
                timers.insert(id, handle);
            }
            Err(_) => {
                tracing::warn!("No async runtime, notification {} will not expire", id);
            }
        }

        id
    }

    /// Severity given by name; unknown names display as info.
    pub fn notify_named(&self, severity: &str, message: impl Into<String>) -> NotificationId {
        self.notify(Severity::parse_lossy(severity), message)
    }

    /// Removes a notification before its ttl elapses. Returns whether it was
    /// still visible; dismissing twice is harmless.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        let overlay = match self
            .overlay
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            Some(overlay) => overlay,
            None => return false,
        };

        if let Some(handle) = overlay
            .timers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
        {
            handle.abort();
        }
        overlay.remove(id)
    }

    /// Snapshot of the overlay in display order.
    pub fn visible(&self) -> Vec<Notification> {
        match self
            .overlay
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            Some(overlay) => overlay
                .entries
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            None => Vec::new(),
        }
    }

    /// Expiry tasks still registered with the overlay.
    pub fn pending_timers(&self) -> usize {
        match self
            .overlay
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            Some(overlay) => overlay.timers.lock().unwrap_or_else(|e| e.into_inner()).len(),
            None => 0,
        }
    }

    /// Tears the overlay down. The next `notify` creates a fresh one.
    pub fn shutdown(&self) {
        if let Some(overlay) = self
            .overlay
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            tracing::debug!("Tearing down notification overlay");
            overlay.clear();
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn advance(duration: Duration) {
        tokio::time::sleep(duration).await;
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlay_created_lazily() {
        let notifier = Notifier::default();
        assert!(!notifier.is_initialized());
        assert!(notifier.visible().is_empty());

        notifier.notify(Severity::Info, "Bienvenido");
        assert!(notifier.is_initialized());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_expires_after_ttl() {
        let notifier = Notifier::default();
        let ttl = Duration::from_millis(1500);
        let id = notifier.notify_for(Severity::Success, "Libro agregado", ttl);

        let visible = notifier.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, id);
        assert_eq!(visible[0].ttl, ttl);

        advance(Duration::from_millis(1400)).await;
        assert_eq!(notifier.visible().len(), 1);

        advance(Duration::from_millis(200)).await;
        assert!(notifier.visible().is_empty());
        assert_eq!(notifier.pending_timers(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_immediate_expiry_leaves_no_timer_behind() {
        let notifier = Notifier::default();
        for i in 0..200 {
            notifier.notify_for(Severity::Info, format!("aviso {}", i), Duration::ZERO);
        }

        for _ in 0..100 {
            if notifier.visible().is_empty() && notifier.pending_timers() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(notifier.visible().is_empty());
        assert_eq!(notifier.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_is_five_seconds() {
        let notifier = Notifier::default();
        notifier.notify(Severity::Warning, "Stock bajo");

        advance(Duration::from_millis(4999)).await;
        assert_eq!(notifier.visible().len(), 1);
        advance(Duration::from_millis(2)).await;
        assert!(notifier.visible().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_order_is_insertion_order() {
        let notifier = Notifier::default();
        notifier.notify(Severity::Info, "uno");
        notifier.notify(Severity::Error, "dos");
        notifier.notify(Severity::Success, "tres");

        let messages: Vec<String> = notifier.visible().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["uno", "dos", "tres"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_dismiss_is_idempotent() {
        let notifier = Notifier::default();
        let id = notifier.notify(Severity::Error, "Error al actualizar el carrito");

        assert!(notifier.dismiss(id));
        assert!(!notifier.dismiss(id));
        assert!(notifier.visible().is_empty());
        assert_eq!(notifier.pending_timers(), 0);

        // expiry of an already dismissed entry is a no-op
        advance(Duration::from_millis(6000)).await;
        assert!(!notifier.dismiss(id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_severity_name_shows_as_info() {
        let notifier = Notifier::default();
        notifier.notify_named("critical", "algo pasó");
        assert_eq!(notifier.visible()[0].severity, Severity::Info);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_clears_and_reinitializes() {
        let notifier = Notifier::default();
        notifier.notify(Severity::Info, "uno");
        notifier.shutdown();
        assert!(!notifier.is_initialized());
        assert!(notifier.visible().is_empty());

        notifier.notify(Severity::Info, "dos");
        assert_eq!(notifier.visible().len(), 1);
    }

    #[test]
    fn test_notify_without_runtime_does_not_panic() {
        let notifier = Notifier::default();
        let id = notifier.notify(Severity::Info, "sin runtime");
        assert_eq!(notifier.visible().len(), 1);
        assert!(notifier.dismiss(id));
    }
}
