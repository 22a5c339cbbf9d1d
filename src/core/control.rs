use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Idle,
    Busy,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSnapshot {
    pub state: ControlState,
    pub label: String,
    pub enabled: bool,
}

struct ControlInner {
    state: ControlState,
    label: String,
    idle_label: String,
    enabled: bool,
    revert: Option<JoinHandle<()>>,
}

impl ControlInner {
    fn cancel_revert(&mut self) {
        if let Some(handle) = self.revert.take() {
            handle.abort();
        }
    }

    fn reset(&mut self) {
        self.state = ControlState::Idle;
        self.label = self.idle_label.clone();
        self.enabled = true;
    }
}

/// A clickable control (add-to-cart button, quantity input, remove link).
///
/// Lifecycle: `Idle -> Busy -> (Succeeded | Failed) -> Idle`. A failed
/// control is reset right away; a succeeded one either resets right away or
/// after a scheduled revert.
#[derive(Clone)]
pub struct Control {
    inner: Arc<Mutex<ControlInner>>,
}

impl Control {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            inner: Arc::new(Mutex::new(ControlInner {
                state: ControlState::Idle,
                idle_label: label.clone(),
                label,
                enabled: true,
                revert: None,
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControlInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        let inner = self.lock();
        ControlSnapshot {
            state: inner.state,
            label: inner.label.clone(),
            enabled: inner.enabled,
        }
    }

    pub fn label(&self) -> String {
        self.lock().label.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    pub fn state(&self) -> ControlState {
        self.lock().state
    }

    /// Captures the current label as the idle label, disables the control
    /// and shows the busy label. A pending success revert is cancelled and
    /// the label it would have restored is kept.
    pub fn begin(&self, busy_label: &str) {
        let mut inner = self.lock();
        if inner.revert.is_some() {
            inner.cancel_revert();
        } else if inner.state == ControlState::Idle {
            inner.idle_label = inner.label.clone();
        }
        inner.state = ControlState::Busy;
        inner.label = busy_label.to_string();
        inner.enabled = false;
    }

    /// Success with no lingering affordance.
    pub fn settle(&self) {
        let mut inner = self.lock();
        inner.cancel_revert();
        inner.reset();
    }

    /// Shows `label` while disabled, then reverts to the idle label after
    /// `revert_after`. Needs a tokio runtime; without one the control
    /// resets immediately.
    pub fn succeed_for(&self, label: &str, revert_after: Duration) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                self.settle();
                return;
            }
        };

        let mut inner = self.lock();
        inner.cancel_revert();
        inner.state = ControlState::Succeeded;
        inner.label = label.to_string();
        inner.enabled = false;

        let weak = Arc::downgrade(&self.inner);
        inner.revert = Some(runtime.spawn(async move {
            tokio::time::sleep(revert_after).await;
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
                if inner.state == ControlState::Succeeded {
                    inner.revert = None;
                    inner.reset();
                }
            }
        }));
    }

    /// Passes through `Failed` and lands back on `Idle`.
    pub fn fail(&self) {
        let mut inner = self.lock();
        inner.cancel_revert();
        inner.state = ControlState::Failed;
        tracing::trace!("Control {:?} failed, restoring", inner.idle_label);
        inner.reset();
    }

    pub fn cancel_revert(&self) -> bool {
        let mut inner = self.lock();
        let pending = inner.revert.is_some();
        if pending {
            inner.cancel_revert();
            inner.reset();
        }
        pending
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
    async fn test_success_reverts_after_delay() {
        let control = Control::new("Agregar al carrito");
        control.begin("Agregando...");
        assert_eq!(
            control.snapshot(),
            ControlSnapshot {
                state: ControlState::Busy,
                label: "Agregando...".to_string(),
                enabled: false,
            }
        );

        control.succeed_for("Agregado", Duration::from_millis(2000));
        assert_eq!(control.state(), ControlState::Succeeded);
        assert_eq!(control.label(), "Agregado");

        advance(Duration::from_millis(1999)).await;
        assert_eq!(control.label(), "Agregado");

        advance(Duration::from_millis(2)).await;
        assert_eq!(control.label(), "Agregar al carrito");
        assert!(control.is_enabled());
        assert_eq!(control.state(), ControlState::Idle);
    }

    #[tokio::test]
    async fn test_fail_restores_label() {
        let control = Control::new("Eliminar");
        control.begin("Eliminando...");
        control.fail();
        assert_eq!(control.label(), "Eliminar");
        assert!(control.is_enabled());
        assert_eq!(control.state(), ControlState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_during_revert_keeps_original_label() {
        let control = Control::new("Agregar");
        control.begin("Agregando...");
        control.succeed_for("Agregado", Duration::from_millis(2000));

        control.begin("Agregando...");
        advance(Duration::from_millis(2500)).await;
        assert_eq!(control.label(), "Agregando...");

        control.fail();
        assert_eq!(control.label(), "Agregar");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_revert_resets_now() {
        let control = Control::new("Agregar");
        control.begin("Agregando...");
        control.succeed_for("Agregado", Duration::from_millis(2000));

        assert!(control.cancel_revert());
        assert_eq!(control.label(), "Agregar");
        assert!(!control.cancel_revert());
    }
}
