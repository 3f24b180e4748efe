//! Floodgate - Per-Key Fixed-Window Rate Limiting
//!
//! This crate implements an in-process rate limiter that tracks request
//! counts per opaque key within a fixed time window and periodically evicts
//! keys that have gone idle. Admission checks for different keys do not
//! contend with each other; checks for the same key are serialized through
//! the entry map, and a background task bounds memory by sweeping entries
//! that have stopped being used.

pub mod clock;
pub mod config;
pub mod error;
pub mod ratelimit;
