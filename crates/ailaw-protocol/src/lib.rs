//! Wire formats spoken with the AiLaw backend: socket frames, the REST
//! response envelope and route paths.

pub mod envelope;
pub mod frames;
pub mod routes;

pub use envelope::{Action, Envelope};
pub use frames::{ClientFrame, ServerFrame, WsError};
