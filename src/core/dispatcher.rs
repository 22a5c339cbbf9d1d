use crate::core::cart_view::CartView;
use crate::core::control::Control;
use crate::core::notifier::Notifier;
use crate::domain::model::{
    ActionOutcome, CartLine, CartReply, CartSummary, OperationKind, Severity,
    DEFAULT_SUCCESS_REVERT,
};
use crate::domain::ports::{CartApi, CartRenderer, Confirmer};
use crate::utils::currency::format_currency;
use crate::utils::error::{CartError, Result};
use crate::utils::validation::validate_item_id;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ADDED_LABEL: &str = "Agregado";
pub const REMOVE_PROMPT: &str = "¿Estás seguro de que quieres eliminar este libro del carrito?";
const ADDED_FALLBACK_MESSAGE: &str = "Libro agregado al carrito";

#[derive(Debug, Default)]
struct CartState {
    badge: Option<u32>,
    lines: Vec<CartLine>,
}

impl CartState {
    fn set_line(&mut self, item_id: &str, subtotal: f64) {
        match self.lines.iter_mut().find(|line| line.item_id == item_id) {
            Some(line) => line.subtotal = subtotal,
            None => self.lines.push(CartLine {
                item_id: item_id.to_string(),
                subtotal,
            }),
        }
    }

    fn remove_line(&mut self, item_id: &str) {
        self.lines.retain(|line| line.item_id != item_id);
    }

    fn summary(&self) -> CartSummary {
        CartSummary::from_lines(&self.lines)
    }
}

type InFlightKey = (String, OperationKind);

/// Held for the duration of one request; releases its key on drop.
struct InFlightTicket<'a> {
    registry: &'a Mutex<HashSet<InFlightKey>>,
    key: InFlightKey,
}

impl Drop for InFlightTicket<'_> {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

/// Runs cart mutations against the server and keeps the cart state, the
/// renderer and the triggering control in step with the outcome.
pub struct CartDispatcher<A: CartApi, R: CartRenderer, C: Confirmer> {
    api: A,
    renderer: R,
    confirmer: C,
    notifier: Arc<Notifier>,
    success_revert: Duration,
    state: Mutex<CartState>,
    in_flight: Mutex<HashSet<InFlightKey>>,
}

impl<A: CartApi, R: CartRenderer, C: Confirmer> CartDispatcher<A, R, C> {
    pub fn new(api: A, renderer: R, confirmer: C, notifier: Arc<Notifier>) -> Self {
        Self {
            api,
            renderer,
            confirmer,
            notifier,
            success_revert: DEFAULT_SUCCESS_REVERT,
            state: Mutex::new(CartState::default()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_success_revert(mut self, success_revert: Duration) -> Self {
        self.success_revert = success_revert;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    pub fn badge_count(&self) -> Option<u32> {
        self.lock_state().badge
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.lock_state().lines.clone()
    }

    pub fn summary(&self) -> CartSummary {
        self.lock_state().summary()
    }

    /// Replaces the local cart state with the given lines and badge count
    /// and renders it.
    pub fn seed(&self, lines: Vec<CartLine>, badge: Option<u32>) {
        let summary = {
            let mut state = self.lock_state();
            state.lines = lines;
            state.badge = badge;
            state.summary()
        };
        if let Some(count) = badge {
            self.renderer.render_badge(count);
        }
        self.renderer.render_summary(&summary);
    }

    /// Fetches the cart page and seeds the local state from it.
    pub async fn load_cart_view(&self) -> Result<CartView> {
        let html = self.api.cart_view().await?;
        let view = CartView::parse(&html);
        tracing::debug!(
            "Loaded cart view: {} lines, badge {:?}",
            view.lines.len(),
            view.badge_count
        );
        self.seed(view.lines.clone(), view.badge_count);
        Ok(view)
    }

    pub async fn add(&self, item_id: &str, quantity: u32, control: &Control) -> Result<ActionOutcome> {
        validate_item_id(item_id)?;
        if quantity == 0 {
            return Err(CartError::ValidationError {
                message: "La cantidad debe ser mayor a 0".to_string(),
            });
        }

        let _ticket = self.acquire(item_id, OperationKind::Add)?;
        control.begin(OperationKind::Add.busy_label());
        tracing::debug!("Adding {} x{} to cart", item_id, quantity);

        let reply = self.api.add_item(item_id, quantity).await;
        match self.check_reply(OperationKind::Add, item_id, reply) {
            Ok(reply) => {
                self.apply_badge(reply.cantidad_carrito).await;
                let message = reply
                    .mensaje
                    .unwrap_or_else(|| ADDED_FALLBACK_MESSAGE.to_string());
                self.notifier.notify(Severity::Success, message);
                control.succeed_for(ADDED_LABEL, self.success_revert);
                Ok(ActionOutcome::Added {
                    cart_count: self.badge_count(),
                })
            }
            Err(e) => {
                control.fail();
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Quantities below one are routed to [`Self::remove`].
    pub async fn update(
        &self,
        item_id: &str,
        new_quantity: i64,
        control: &Control,
    ) -> Result<ActionOutcome> {
        if new_quantity < 1 {
            tracing::debug!(
                "Quantity {} for {} below minimum, removing instead",
                new_quantity,
                item_id
            );
            return self.remove(item_id, control).await;
        }
        validate_item_id(item_id)?;
        let quantity = u32::try_from(new_quantity).map_err(|_| CartError::ValidationError {
            message: format!("Quantity out of range: {}", new_quantity),
        })?;

        let _ticket = self.acquire(item_id, OperationKind::Update)?;
        control.begin(OperationKind::Update.busy_label());
        tracing::debug!("Updating {} to quantity {}", item_id, quantity);

        let reply = self.api.update_item(item_id, quantity).await;
        match self.check_reply(OperationKind::Update, item_id, reply) {
            Ok(reply) => {
                let summary = {
                    let mut state = self.lock_state();
                    if let Some(subtotal) = reply.subtotal {
                        state.set_line(item_id, subtotal);
                    }
                    state.summary()
                };
                if let Some(subtotal) = reply.subtotal {
                    self.renderer
                        .render_line_subtotal(item_id, &format_currency(subtotal));
                } else {
                    tracing::debug!("Update reply for {} carried no subtotal", item_id);
                }
                self.renderer.render_summary(&summary);
                self.apply_badge(reply.cantidad_carrito).await;
                control.settle();
                Ok(ActionOutcome::Updated { summary })
            }
            Err(e) => {
                control.fail();
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Asks for confirmation first; a declined prompt leaves everything
    /// untouched and sends nothing.
    pub async fn remove(&self, item_id: &str, control: &Control) -> Result<ActionOutcome> {
        validate_item_id(item_id)?;
        let _ticket = self.acquire(item_id, OperationKind::Remove)?;

        if !self.confirmer.confirm(REMOVE_PROMPT).await {
            tracing::debug!("Removal of {} declined", item_id);
            return Ok(ActionOutcome::Declined);
        }

        control.begin(OperationKind::Remove.busy_label());
        tracing::debug!("Removing {} from cart", item_id);

        let reply = self.api.remove_item(item_id).await;
        match self.check_reply(OperationKind::Remove, item_id, reply) {
            Ok(reply) => {
                let (summary, emptied) = {
                    let mut state = self.lock_state();
                    state.remove_line(item_id);
                    (state.summary(), state.lines.is_empty())
                };
                self.renderer.remove_line(item_id);
                self.renderer.render_summary(&summary);
                self.apply_badge(reply.cantidad_carrito).await;
                control.settle();

                if emptied {
                    tracing::info!("Cart is empty, reloading");
                    self.renderer.reload();
                }
                Ok(ActionOutcome::Removed {
                    summary,
                    reloaded: emptied,
                })
            }
            Err(e) => {
                control.fail();
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Re-reads the badge count from the cart page. Failures are logged and
    /// yield `None`.
    pub async fn refresh_badge_count(&self) -> Option<u32> {
        match self.api.cart_view().await {
            Ok(html) => CartView::parse(&html).badge_count,
            Err(e) => {
                tracing::error!("Error al actualizar badge: {}", e);
                None
            }
        }
    }

    /// Direct when the server sent a count, refresh otherwise.
    async fn apply_badge(&self, count: Option<u32>) {
        let count = match count {
            Some(count) => Some(count),
            None => self.refresh_badge_count().await,
        };

        let current = {
            let mut state = self.lock_state();
            if count.is_some() {
                state.badge = count;
            }
            state.badge
        };

        if let Some(count) = count {
            self.renderer.render_badge(count);
        }
        if current.unwrap_or(0) > 0 {
            self.renderer.pulse_badge();
        }
    }

    fn check_reply(
        &self,
        operation: OperationKind,
        item_id: &str,
        reply: Result<CartReply>,
    ) -> Result<CartReply> {
        match reply {
            Ok(reply) if reply.success => Ok(reply),
            Ok(reply) => {
                let message = reply.server_message();
                tracing::warn!("Server rejected {} for {}: {}", operation, item_id, message);
                Err(CartError::ServerError { message })
            }
            Err(e) => {
                tracing::error!("❌ {} request for {} failed: {}", operation, item_id, e);
                Err(CartError::TransportError {
                    operation,
                    message: e.to_string(),
                })
            }
        }
    }

    fn report(&self, error: &CartError) {
        self.notifier
            .notify(Severity::Error, error.user_friendly_message());
    }

    fn acquire(&self, item_id: &str, operation: OperationKind) -> Result<InFlightTicket<'_>> {
        let key = (item_id.to_string(), operation);
        let mut registry = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !registry.insert(key.clone()) {
            tracing::warn!("Rejecting duplicate {} for {}", operation, item_id);
            return Err(CartError::AlreadyInFlight {
                item_id: item_id.to_string(),
                operation,
            });
        }
        Ok(InFlightTicket {
            registry: &self.in_flight,
            key,
        })
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock::{MockCartApi, RecordingRenderer, RenderEvent, ScriptedConfirmer};

    fn dispatcher(
        api: MockCartApi,
        confirm: bool,
    ) -> (
        CartDispatcher<MockCartApi, RecordingRenderer, ScriptedConfirmer>,
        RecordingRenderer,
    ) {
        let renderer = RecordingRenderer::default();
        let dispatcher = CartDispatcher::new(
            api,
            renderer.clone(),
            ScriptedConfirmer::new(confirm),
            Arc::new(Notifier::default()),
        );
        (dispatcher, renderer)
    }

    #[tokio::test]
    async fn test_update_keeps_other_lines_in_summary() {
        let api = MockCartApi::new();
        api.push_update(Ok(CartReply {
            success: true,
            subtotal: Some(90_000.0),
            cantidad_carrito: Some(4),
            ..Default::default()
        }));
        let (dispatcher, renderer) = dispatcher(api, true);
        dispatcher.seed(
            vec![
                CartLine {
                    item_id: "9".to_string(),
                    subtotal: 45_000.0,
                },
                CartLine {
                    item_id: "11".to_string(),
                    subtotal: 10_000.0,
                },
            ],
            Some(3),
        );

        let outcome = dispatcher
            .update("9", 2, &Control::new("2"))
            .await
            .unwrap();

        let expected = CartSummary::from_lines(&[
            CartLine {
                item_id: "9".to_string(),
                subtotal: 90_000.0,
            },
            CartLine {
                item_id: "11".to_string(),
                subtotal: 10_000.0,
            },
        ]);
        assert_eq!(outcome, ActionOutcome::Updated { summary: expected });
        assert!(renderer
            .events()
            .contains(&RenderEvent::LineSubtotal("9".to_string(), "$ 90.000".to_string())));
        assert_eq!(dispatcher.badge_count(), Some(4));
    }

    #[tokio::test]
    async fn test_missing_count_refreshes_badge_from_cart_view() {
        let api = MockCartApi::new();
        api.push_update(Ok(CartReply {
            success: true,
            subtotal: Some(20_000.0),
            ..Default::default()
        }));
        api.set_cart_view(r#"<span id="carrito-badge">6</span>"#);
        let (dispatcher, renderer) = dispatcher(api.clone(), true);

        dispatcher.update("3", 2, &Control::new("2")).await.unwrap();

        assert_eq!(api.cart_view_calls(), 1);
        assert_eq!(dispatcher.badge_count(), Some(6));
        let events = renderer.events();
        assert!(events.contains(&RenderEvent::Badge(6)));
        assert!(events.contains(&RenderEvent::Pulse));
    }

    #[tokio::test]
    async fn test_zero_badge_does_not_pulse() {
        let api = MockCartApi::new();
        api.push_remove(Ok(CartReply {
            success: true,
            cantidad_carrito: Some(0),
            ..Default::default()
        }));
        let (dispatcher, renderer) = dispatcher(api, true);

        dispatcher.remove("5", &Control::new("Eliminar")).await.unwrap();

        let events = renderer.events();
        assert!(events.contains(&RenderEvent::Badge(0)));
        assert!(!events.contains(&RenderEvent::Pulse));
    }

    #[tokio::test]
    async fn test_server_failure_is_reported_verbatim() {
        let api = MockCartApi::new();
        api.push_add(Ok(CartReply {
            success: false,
            error: Some("No hay suficiente stock disponible".to_string()),
            ..Default::default()
        }));
        let (dispatcher, _renderer) = dispatcher(api, true);
        let control = Control::new("Agregar");

        let err = dispatcher.add("42", 10, &control).await.unwrap_err();

        assert!(matches!(err, CartError::ServerError { .. }));
        let visible = dispatcher.notifier().visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].severity, Severity::Error);
        assert_eq!(visible[0].message, "No hay suficiente stock disponible");
        assert_eq!(control.label(), "Agregar");
        assert!(control.is_enabled());
    }

    #[tokio::test]
    async fn test_zero_quantity_add_is_rejected_before_request() {
        let api = MockCartApi::new();
        let (dispatcher, _renderer) = dispatcher(api.clone(), true);
        let control = Control::new("Agregar");

        let err = dispatcher.add("42", 0, &control).await.unwrap_err();

        assert!(matches!(err, CartError::ValidationError { .. }));
        assert_eq!(api.add_calls(), 0);
        assert_eq!(control.label(), "Agregar");
    }

    #[tokio::test]
    async fn test_duplicate_trigger_is_rejected_while_in_flight() {
        let api = MockCartApi::new();
        let gate = api.hold_requests();
        api.push_add(Ok(CartReply {
            success: true,
            cantidad_carrito: Some(1),
            ..Default::default()
        }));
        let (dispatcher, _renderer) = dispatcher(api.clone(), true);
        let dispatcher = Arc::new(dispatcher);
        let control = Control::new("Agregar");

        let first = {
            let dispatcher = Arc::clone(&dispatcher);
            let control = control.clone();
            tokio::spawn(async move { dispatcher.add("42", 1, &control).await })
        };
        while api.add_calls() == 0 {
            tokio::task::yield_now().await;
        }

        let second = dispatcher.add("42", 1, &Control::new("Agregar")).await;
        assert!(matches!(second, Err(CartError::AlreadyInFlight { .. })));

        gate.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert_eq!(api.add_calls(), 1);

        // key released once the first request settled
        api.push_add(Ok(CartReply {
            success: true,
            cantidad_carrito: Some(2),
            ..Default::default()
        }));
        api.release_requests();
        assert!(dispatcher.add("42", 1, &Control::new("Agregar")).await.is_ok());
    }
}
