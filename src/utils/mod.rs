pub mod csrf;
pub mod currency;
pub mod debounce;
pub mod error;
pub mod forms;
pub mod logger;
pub mod validation;
