//! # Cost Allocator
//!
//! Splits a court rental across the attendees of an event. Every attendee
//! starts from an equal share of the booked cost, discount-card usage is
//! subtracted per use, negative balances are redistributed to the people
//! still paying, and an optional negotiated ("fame") total caps the result.
//!
//! The engine is pure: it reads a roster, a pricing configuration and a usage
//! map, and returns per-attendee amounts plus display statistics. Persisting
//! and rendering the result is the caller's job.

pub mod breakdown;
pub mod config;
pub mod engine;
pub mod error;
pub mod money;
pub mod pricing;
pub mod reconcile;
pub mod redistribution;
pub mod roster;
pub mod statistics;
pub mod types;

#[cfg(test)]
mod tests;

pub use breakdown::{calculate_breakdown, classic_factor, CardTypeBreakdown, CardTypeInput};
pub use config::EngineConfig;
pub use engine::{recalculate_after_usage_change, Allocation, CostAllocator};
pub use error::{AllocationError, Result};
pub use pricing::PricingConfig;
pub use reconcile::OverrideMode;
pub use redistribution::{CascadeRule, CascadeRules, Redistribution};
pub use statistics::{Statistics, StatisticsDisplay};
pub use types::{Attendee, AttendeeId, CardType, UsageMap};

/// Current version of the engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Discount granted per recorded card usage, in currency units
pub const DISCOUNT_PER_USAGE: i64 = 15;

/// Players sharing one court when the court count is derived
pub const PLAYERS_PER_COURT: u32 = 4;

/// Default session length in hours
pub const DEFAULT_HOURS: i64 = 2;

/// Default court price per hour
pub const DEFAULT_PRICE_PER_HOUR: i64 = 77;

/// Default bound on redistribution passes
pub const DEFAULT_MAX_ITERATIONS: u32 = 32;
