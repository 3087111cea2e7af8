//! REST client for the AiLaw backend.
//!
//! Every authenticated call goes through [`ApiClient`], which attaches the
//! bearer token and follows the backend's `refresh` / `logout` actions the
//! same way for all endpoints.

pub mod auth;
pub mod client;
pub mod messages;
pub mod sessions;

pub use client::ApiClient;
