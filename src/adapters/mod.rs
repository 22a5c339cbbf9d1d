// Adapters layer: concrete implementations of the domain ports (HTTP server, terminal).

pub mod http;
pub mod terminal;

pub use http::{Endpoints, HttpCartApi};
pub use terminal::{StdinConfirmer, TerminalConfirmer, TerminalRenderer};
