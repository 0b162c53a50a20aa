//! Configuration for the cost allocator

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AllocationError, Result};
use crate::reconcile::OverrideMode;
use crate::redistribution::Redistribution;
use crate::{DEFAULT_MAX_ITERATIONS, DISCOUNT_PER_USAGE};

/// Engine policy knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Discount per recorded card usage
    pub discount_per_usage: Decimal,

    /// How a negotiated total is applied
    pub override_mode: OverrideMode,

    /// Bound on proportional redistribution passes
    pub max_iterations: u32,

    /// How negative balances are passed on. Kept last: it serializes as a
    /// TOML table.
    pub redistribution: Redistribution,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            discount_per_usage: Decimal::from(DISCOUNT_PER_USAGE),
            override_mode: OverrideMode::ScaleCap,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            redistribution: Redistribution::Proportional,
        }
    }
}

impl EngineConfig {
    /// Even split plus subtractive override, the combination the per-attendee
    /// calculator shipped with before proportional redistribution.
    pub fn legacy_even_split() -> Self {
        Self {
            redistribution: Redistribution::EvenSplit,
            override_mode: OverrideMode::SubtractEvenly,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(rate) = std::env::var("COST_DISCOUNT_PER_USAGE") {
            config.discount_per_usage = rate
                .trim()
                .parse::<Decimal>()
                .map_err(|_| AllocationError::config(format!("Invalid COST_DISCOUNT_PER_USAGE: {}", rate)))?;
        }

        if let Ok(name) = std::env::var("COST_REDISTRIBUTION") {
            config.redistribution = Redistribution::from_name(&name)
                .ok_or_else(|| AllocationError::config(format!("Invalid COST_REDISTRIBUTION: {}", name)))?;
        }

        if let Ok(name) = std::env::var("COST_OVERRIDE_MODE") {
            config.override_mode = OverrideMode::from_name(&name)
                .ok_or_else(|| AllocationError::config(format!("Invalid COST_OVERRIDE_MODE: {}", name)))?;
        }

        if let Ok(iterations) = std::env::var("COST_MAX_ITERATIONS") {
            config.max_iterations = iterations
                .trim()
                .parse::<u32>()
                .map_err(|_| AllocationError::config(format!("Invalid COST_MAX_ITERATIONS: {}", iterations)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.discount_per_usage < Decimal::ZERO {
            return Err(AllocationError::config("discount per usage cannot be negative"));
        }
        if self.max_iterations == 0 {
            return Err(AllocationError::config("max_iterations must be at least 1"));
        }
        Ok(())
    }
}
