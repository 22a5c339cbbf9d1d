use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const TAX_RATE: f64 = 0.19;
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(5000);
pub const DEFAULT_SUCCESS_REVERT: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Update,
    Remove,
}

impl OperationKind {
    pub fn generic_error_message(&self) -> &'static str {
        match self {
            OperationKind::Add => "Error al agregar el libro al carrito",
            OperationKind::Update => "Error al actualizar el carrito",
            OperationKind::Remove => "Error al eliminar el libro del carrito",
        }
    }

    pub fn busy_label(&self) -> &'static str {
        match self {
            OperationKind::Add => "Agregando...",
            OperationKind::Update => "Actualizando...",
            OperationKind::Remove => "Eliminando...",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Add => "add",
            OperationKind::Update => "update",
            OperationKind::Remove => "remove",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Unknown names degrade to `Info`.
    pub fn parse_lossy(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "success" => Severity::Success,
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            _ => Severity::Info,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Success => "alert-success",
            Severity::Error => "alert-danger",
            Severity::Warning => "alert-warning",
            Severity::Info => "alert-info",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Success => "fas fa-check-circle",
            Severity::Error => "fas fa-exclamation-circle",
            Severity::Warning => "fas fa-exclamation-triangle",
            Severity::Info => "fas fa-info-circle",
        }
    }
}

pub type NotificationId = u64;

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub severity: Severity,
    pub message: String,
    #[serde(with = "duration_millis")]
    pub ttl: Duration,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: String,
    pub subtotal: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CartSummary {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

impl CartSummary {
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let subtotal: f64 = lines.iter().map(|line| line.subtotal).sum();
        let tax = subtotal * TAX_RATE;
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

/// JSON body returned by every cart endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub mensaje: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub subtotal: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub cantidad_carrito: Option<u32>,
}

impl CartReply {
    pub fn server_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.mensaje.clone())
            .unwrap_or_else(|| "El servidor rechazó la operación".to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Added { cart_count: Option<u32> },
    Updated { summary: CartSummary },
    Removed { summary: CartSummary, reloaded: bool },
    Declined,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }
}
