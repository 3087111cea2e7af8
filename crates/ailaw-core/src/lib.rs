pub mod auth;
pub mod codes;
pub mod config;
pub mod error;
pub mod types;

pub use auth::TokenStore;
pub use codes::ErrorInfo;
pub use config::AilawConfig;
pub use error::{AilawError, Result};
