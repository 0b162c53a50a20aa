//! Aggregate statistics of an allocation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::format_statistic;

/// Derived totals of one allocation. Recomputed on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Statistics {
    /// Booked cost, `courts × price × hours`
    pub total_price: Decimal,
    /// Nominal usage discount before redistribution effects
    pub discount: Decimal,
    /// What the attendees pay in total. Carries the negative net when the
    /// discounts exceed the booked cost.
    pub price_after_discount: Decimal,
    /// Reduction granted by the negotiated total
    pub fame_discount: Decimal,
}

/// Statistics rendered for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsDisplay {
    pub total_price: String,
    pub discount: String,
    pub price_after_discount: String,
    pub fame_discount: String,
}

impl Statistics {
    pub fn display(&self) -> StatisticsDisplay {
        StatisticsDisplay {
            total_price: format_statistic(self.total_price),
            discount: format_statistic(self.discount),
            price_after_discount: format_statistic(self.price_after_discount),
            fame_discount: format_statistic(self.fame_discount),
        }
    }
}
