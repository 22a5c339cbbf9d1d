//! # In-memory test doubles
//!
//! `MockCartApi` replays scripted server replies and records every call,
//! `RecordingRenderer` records what would have been drawn and
//! `ScriptedConfirmer` answers the removal prompt with a fixed answer.
//! All three are cheap to clone and share state between clones, so a test
//! can hand one clone to the dispatcher and inspect the other.
//!
//! ```rust
//! use std::sync::Arc;
//! use venta_cart::core::control::Control;
//! use venta_cart::core::dispatcher::CartDispatcher;
//! use venta_cart::core::mock::{MockCartApi, RecordingRenderer, ScriptedConfirmer};
//! use venta_cart::core::notifier::Notifier;
//! use venta_cart::domain::model::CartReply;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let api = MockCartApi::new();
//! api.push_add(Ok(CartReply {
//!     success: true,
//!     cantidad_carrito: Some(1),
//!     ..Default::default()
//! }));
//! let dispatcher = CartDispatcher::new(
//!     api.clone(),
//!     RecordingRenderer::default(),
//!     ScriptedConfirmer::new(true),
//!     Arc::new(Notifier::default()),
//! );
//! dispatcher.add("42", 1, &Control::new("Agregar")).await.unwrap();
//! assert_eq!(api.add_calls(), 1);
//! # }
//! ```

use crate::domain::model::{CartReply, CartSummary, OperationKind};
use crate::domain::ports::{CartApi, CartRenderer, Confirmer};
use crate::utils::error::{CartError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Add { item_id: String, quantity: u32 },
    Update { item_id: String, quantity: u32 },
    Remove { item_id: String },
    CartView,
}

#[derive(Default)]
struct MockState {
    add: Mutex<VecDeque<Result<CartReply>>>,
    update: Mutex<VecDeque<Result<CartReply>>>,
    remove: Mutex<VecDeque<Result<CartReply>>>,
    cart_view: Mutex<Option<String>>,
    calls: Mutex<Vec<MockCall>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

#[derive(Clone, Default)]
pub struct MockCartApi {
    state: Arc<MockState>,
}

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockCartApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_add(&self, reply: Result<CartReply>) {
        locked(&self.state.add).push_back(reply);
    }

    pub fn push_update(&self, reply: Result<CartReply>) {
        locked(&self.state.update).push_back(reply);
    }

    pub fn push_remove(&self, reply: Result<CartReply>) {
        locked(&self.state.remove).push_back(reply);
    }

    pub fn set_cart_view(&self, html: &str) {
        *locked(&self.state.cart_view) = Some(html.to_string());
    }

    /// Requests recorded from now on wait until the returned `Notify` is
    /// signalled.
    pub fn hold_requests(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *locked(&self.state.gate) = Some(Arc::clone(&gate));
        gate
    }

    pub fn release_requests(&self) {
        if let Some(gate) = locked(&self.state.gate).take() {
            gate.notify_waiters();
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        locked(&self.state.calls).clone()
    }

    pub fn add_calls(&self) -> usize {
        self.count(|c| matches!(c, MockCall::Add { .. }))
    }

    pub fn update_calls(&self) -> usize {
        self.count(|c| matches!(c, MockCall::Update { .. }))
    }

    pub fn remove_calls(&self) -> usize {
        self.count(|c| matches!(c, MockCall::Remove { .. }))
    }

    pub fn cart_view_calls(&self) -> usize {
        self.count(|c| matches!(c, MockCall::CartView))
    }

    fn count(&self, predicate: impl Fn(&MockCall) -> bool) -> usize {
        locked(&self.state.calls).iter().filter(|c| predicate(c)).count()
    }

    async fn record(&self, call: MockCall) {
        locked(&self.state.calls).push(call);
        let gate = locked(&self.state.gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn next(queue: &Mutex<VecDeque<Result<CartReply>>>, operation: OperationKind) -> Result<CartReply> {
        locked(queue).pop_front().unwrap_or_else(|| {
            Err(CartError::TransportError {
                operation,
                message: "no scripted reply".to_string(),
            })
        })
    }
}

#[async_trait]
impl CartApi for MockCartApi {
    async fn add_item(&self, item_id: &str, quantity: u32) -> Result<CartReply> {
        self.record(MockCall::Add {
            item_id: item_id.to_string(),
            quantity,
        })
        .await;
        Self::next(&self.state.add, OperationKind::Add)
    }

    async fn update_item(&self, item_id: &str, quantity: u32) -> Result<CartReply> {
        self.record(MockCall::Update {
            item_id: item_id.to_string(),
            quantity,
        })
        .await;
        Self::next(&self.state.update, OperationKind::Update)
    }

    async fn remove_item(&self, item_id: &str) -> Result<CartReply> {
        self.record(MockCall::Remove {
            item_id: item_id.to_string(),
        })
        .await;
        Self::next(&self.state.remove, OperationKind::Remove)
    }

    async fn cart_view(&self) -> Result<String> {
        self.record(MockCall::CartView).await;
        locked(&self.state.cart_view)
            .clone()
            .ok_or_else(|| CartError::ConfigError {
                message: "no cart view scripted".to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Badge(u32),
    Pulse,
    LineSubtotal(String, String),
    RemoveLine(String),
    Summary(CartSummary),
    Reload,
}

#[derive(Clone, Default)]
pub struct RecordingRenderer {
    events: Arc<Mutex<Vec<RenderEvent>>>,
}

impl RecordingRenderer {
    pub fn events(&self) -> Vec<RenderEvent> {
        locked(&self.events).clone()
    }

    pub fn reloads(&self) -> usize {
        locked(&self.events)
            .iter()
            .filter(|e| **e == RenderEvent::Reload)
            .count()
    }

    pub fn last_badge(&self) -> Option<u32> {
        locked(&self.events).iter().rev().find_map(|e| match e {
            RenderEvent::Badge(count) => Some(*count),
            _ => None,
        })
    }

    pub fn last_summary(&self) -> Option<CartSummary> {
        locked(&self.events).iter().rev().find_map(|e| match e {
            RenderEvent::Summary(summary) => Some(*summary),
            _ => None,
        })
    }

    fn push(&self, event: RenderEvent) {
        locked(&self.events).push(event);
    }
}

impl CartRenderer for RecordingRenderer {
    fn render_badge(&self, count: u32) {
        self.push(RenderEvent::Badge(count));
    }

    fn pulse_badge(&self) {
        self.push(RenderEvent::Pulse);
    }

    fn render_line_subtotal(&self, item_id: &str, formatted: &str) {
        self.push(RenderEvent::LineSubtotal(
            item_id.to_string(),
            formatted.to_string(),
        ));
    }

    fn remove_line(&self, item_id: &str) {
        self.push(RenderEvent::RemoveLine(item_id.to_string()));
    }

    fn render_summary(&self, summary: &CartSummary) {
        self.push(RenderEvent::Summary(*summary));
    }

    fn reload(&self) {
        self.push(RenderEvent::Reload);
    }
}

#[derive(Clone)]
pub struct ScriptedConfirmer {
    answer: bool,
    prompts: Arc<AtomicUsize>,
}

impl ScriptedConfirmer {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            prompts: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}
