pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ClientSettings;

pub use adapters::{HttpCartApi, TerminalConfirmer, TerminalRenderer};
pub use core::{control::Control, dispatcher::CartDispatcher, notifier::Notifier};
pub use utils::error::{CartError, Result};
