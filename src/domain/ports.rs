use crate::domain::model::{CartReply, CartSummary};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Remote cart endpoints.
#[async_trait]
pub trait CartApi: Send + Sync {
    async fn add_item(&self, item_id: &str, quantity: u32) -> Result<CartReply>;
    async fn update_item(&self, item_id: &str, quantity: u32) -> Result<CartReply>;
    async fn remove_item(&self, item_id: &str) -> Result<CartReply>;
    /// Raw HTML of the cart page.
    async fn cart_view(&self) -> Result<String>;
}

/// Projection of the cart state onto whatever displays it.
pub trait CartRenderer: Send + Sync {
    fn render_badge(&self, count: u32);
    fn pulse_badge(&self);
    fn render_line_subtotal(&self, item_id: &str, formatted: &str);
    fn remove_line(&self, item_id: &str);
    fn render_summary(&self, summary: &CartSummary);
    fn reload(&self);
}

#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn csrf_token(&self) -> Option<&str>;
    fn notification_ttl(&self) -> Duration;
    fn success_revert(&self) -> Duration;
}
