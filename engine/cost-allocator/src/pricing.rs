//! Facility cost basis for one event

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AllocationError, Result};
use crate::{DEFAULT_HOURS, DEFAULT_PRICE_PER_HOUR, PLAYERS_PER_COURT};

/// Cost basis of an event: courts, hourly price, session length and an
/// optional negotiated total that caps the organic split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub courts_booked: u32,
    pub price_per_hour: Decimal,
    pub hours_booked: Decimal,
    /// Negotiated ("fame") total; zero or absent means no override
    #[serde(default)]
    pub external_override_total: Option<Decimal>,
}

impl PricingConfig {
    pub fn new(courts_booked: u32, price_per_hour: Decimal, hours_booked: Decimal) -> Self {
        Self { courts_booked, price_per_hour, hours_booked, external_override_total: None }
    }

    pub fn with_override(mut self, total: Decimal) -> Self {
        self.external_override_total = Some(total);
        self
    }

    /// Build from stored event fields, falling back to the documented
    /// defaults. Courts are derived from the player count when not stored.
    pub fn from_stored(
        player_count: usize,
        courts: Option<u32>,
        hours: Option<Decimal>,
        price_per_hour: Option<Decimal>,
        fame_total: Option<Decimal>,
    ) -> Self {
        Self {
            courts_booked: courts.unwrap_or_else(|| courts_for_players(player_count)),
            price_per_hour: price_per_hour.unwrap_or_else(|| Decimal::from(DEFAULT_PRICE_PER_HOUR)),
            hours_booked: hours.unwrap_or_else(|| Decimal::from(DEFAULT_HOURS)),
            external_override_total: fame_total,
        }
    }

    /// `courts × price per hour × hours`
    pub fn base_total(&self) -> Decimal {
        Decimal::from(self.courts_booked) * self.price_per_hour * self.hours_booked
    }

    /// The override total when it is set and positive
    pub fn override_total(&self) -> Option<Decimal> {
        self.external_override_total.filter(|total| *total > Decimal::ZERO)
    }

    /// Boundary validation; the engine assumes a config that passed this.
    pub fn validate(&self) -> Result<()> {
        if self.courts_booked == 0 {
            return Err(AllocationError::pricing("at least one court must be booked"));
        }
        if self.price_per_hour < Decimal::ZERO {
            return Err(AllocationError::pricing(format!(
                "price per hour cannot be negative: {}",
                self.price_per_hour
            )));
        }
        if self.hours_booked <= Decimal::ZERO {
            return Err(AllocationError::pricing(format!(
                "hours booked must be positive: {}",
                self.hours_booked
            )));
        }
        if let Some(total) = self.external_override_total {
            if total < Decimal::ZERO {
                return Err(AllocationError::pricing(format!(
                    "override total cannot be negative: {}",
                    total
                )));
            }
        }
        Ok(())
    }
}

/// Courts needed for a player count, four players per court.
pub fn courts_for_players(player_count: usize) -> u32 {
    let per_court = PLAYERS_PER_COURT as usize;
    player_count.div_ceil(per_court) as u32
}
