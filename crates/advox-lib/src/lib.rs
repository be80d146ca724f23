//! advox-lib — Service engine for the advox TTS server.
//!
//! Edge engine client, per-request synthesis sessions, breadcrumb trail, and
//! the HTTP API. Depends on advox-core for pure types and bookkeeping.

pub mod breadcrumb;
pub mod edge;
pub mod engine;
pub mod error;
pub mod server;
pub mod session;

// Re-export advox-core for convenience
pub use advox_core;
