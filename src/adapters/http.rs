use crate::domain::model::CartReply;
use crate::domain::ports::{CartApi, ConfigProvider};
use crate::utils::csrf::CSRF_HEADER;
use crate::utils::error::{CartError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use url::Url;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Endpoint paths; `{id}` is replaced by the item id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub add: String,
    pub update: String,
    pub remove: String,
    pub cart_view: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            add: "/agregar-carrito/{id}/".to_string(),
            update: "/actualizar-carrito/{id}/".to_string(),
            remove: "/eliminar-carrito/{id}/".to_string(),
            cart_view: "/carrito/".to_string(),
        }
    }
}

pub struct HttpCartApi {
    client: Client,
    base_url: Url,
    endpoints: Endpoints,
    csrf_token: RwLock<String>,
}

impl HttpCartApi {
    pub fn new(base_url: &str, endpoints: Endpoints) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| CartError::InvalidConfigValueError {
            field: "base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        // session and csrftoken cookies must travel with the form posts
        let client = Client::builder().cookie_store(true).build()?;

        Ok(Self {
            client,
            base_url,
            endpoints,
            csrf_token: RwLock::new(String::new()),
        })
    }

    /// Builds the client from resolved settings, carrying the configured
    /// CSRF token when there is one.
    pub fn from_config(config: &dyn ConfigProvider, endpoints: Endpoints) -> Result<Self> {
        let api = Self::new(config.base_url(), endpoints)?;
        if let Some(token) = config.csrf_token() {
            api.set_csrf_token(token);
        }
        Ok(api)
    }

    pub fn with_csrf_token(self, token: impl Into<String>) -> Self {
        self.set_csrf_token(token);
        self
    }

    pub fn set_csrf_token(&self, token: impl Into<String>) {
        *self.csrf_token.write().unwrap_or_else(|e| e.into_inner()) = token.into();
    }

    pub fn csrf_token(&self) -> String {
        self.csrf_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn url_for(&self, template: &str, item_id: &str) -> Result<Url> {
        let path = template.replace("{id}", item_id);
        self.base_url
            .join(&path)
            .map_err(|e| CartError::ConfigError {
                message: format!("Cannot build URL from {}: {}", path, e),
            })
    }

    async fn post(&self, url: Url, quantity: Option<u32>) -> Result<CartReply> {
        tracing::debug!("POST {}", url);
        let mut request = self
            .client
            .post(url)
            .header(CSRF_HEADER, self.csrf_token())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE);

        if let Some(quantity) = quantity {
            request = request.body(format!("cantidad={}", quantity));
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Cart API response status: {}", status);

        // error replies (400) still carry a JSON body with the message
        let body = response.text().await?;
        let reply: CartReply = serde_json::from_str(&body)?;
        if !status.is_success() && reply.success {
            return Err(CartError::ServerError {
                message: format!("Unexpected status {}", status),
            });
        }
        Ok(reply)
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    async fn add_item(&self, item_id: &str, quantity: u32) -> Result<CartReply> {
        let url = self.url_for(&self.endpoints.add, item_id)?;
        self.post(url, Some(quantity)).await
    }

    async fn update_item(&self, item_id: &str, quantity: u32) -> Result<CartReply> {
        let url = self.url_for(&self.endpoints.update, item_id)?;
        self.post(url, Some(quantity)).await
    }

    async fn remove_item(&self, item_id: &str) -> Result<CartReply> {
        let url = self.url_for(&self.endpoints.remove, item_id)?;
        self.post(url, None).await
    }

    async fn cart_view(&self) -> Result<String> {
        let url = self.url_for(&self.endpoints.cart_view, "")?;
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
