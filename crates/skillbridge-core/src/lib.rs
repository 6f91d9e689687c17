//! Core types and trait definitions for the skillbridge analytics engine.
//!
//! This crate holds the activity fact types, the pure functions that derive
//! their computed fields, and the store traits the engine reads through. It
//! is deliberately free of HTTP and database dependencies.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attendance;
pub mod engagement;
pub mod error;
pub mod performance;
pub mod profile;
pub mod range;
pub mod store;

pub use error::{Error, Result};
pub use range::DateRange;
