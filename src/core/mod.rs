pub mod cart_view;
pub mod control;
pub mod dispatcher;
pub mod mock;
pub mod notifier;

pub use crate::domain::model::{ActionOutcome, CartLine, CartReply, CartSummary, OperationKind, Severity};
pub use crate::domain::ports::{CartApi, CartRenderer, ConfigProvider, Confirmer};
pub use crate::utils::error::Result;
