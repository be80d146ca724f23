//! advox-core — Pure types and synthesis bookkeeping.
//!
//! No async runtime, no I/O, no platform dependencies.

pub mod admission;
pub mod boundary;
pub mod voices;
