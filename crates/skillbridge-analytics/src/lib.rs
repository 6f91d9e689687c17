//! Analytics and matching engine for skillbridge.
//!
//! Every aggregator here is a pure function over a slice of activity facts:
//!
//! - [`heatmap`] — day-of-week × hour-of-day activity grid
//! - [`distribution`] — score histogram, statistics, outliers
//! - [`consistency`] — attendance consistency, streaks, weekly rollups
//! - [`matching`] — weighted tutor/learner fit and skill recommendations
//! - [`insight`] — the rule engine that turns figures into insights
//!
//! [`Analytics`] wires those functions to any
//! [`FactStore`](skillbridge_core::store::FactStore) /
//! [`ProfileStore`](skillbridge_core::store::ProfileStore).

pub mod consistency;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod heatmap;
pub mod insight;
pub mod matching;

pub use engine::Analytics;
pub use error::{Error, Result};

/// Round to two decimal places for presentation.
pub(crate) fn round2(value: f64) -> f64 { (value * 100.0).round() / 100.0 }
