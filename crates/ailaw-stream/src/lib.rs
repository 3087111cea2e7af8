//! Streaming-reconnect client for the chat socket.
//!
//! One supervisor task owns the only socket. It connects while a token is
//! present, turns inbound frames into [`StreamEvent`]s, pings on a fixed
//! heartbeat and reconnects with capped exponential backoff after abnormal
//! closes. Callers talk to it through a cloneable [`StreamHandle`].

pub mod backoff;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod types;

pub use backoff::ReconnectPolicy;
pub use client::{StreamClient, StreamHandle};
pub use error::StreamError;
pub use types::{ConnectionStatus, StreamEvent};
