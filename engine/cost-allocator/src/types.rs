//! Roster types consumed by the engine

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::AllocationError;

/// Opaque attendee identifier supplied by the roster provider
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendeeId(pub String);

impl AttendeeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AttendeeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AttendeeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for AttendeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Discount card held by an attendee.
///
/// Declaration order is the canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    /// Medicover
    #[serde(alias = "Medicover", alias = "MD")]
    FullCoverage,
    /// Medicover Light
    #[serde(alias = "Medicover Light", alias = "ML")]
    LightCoverage,
    /// Multisport
    #[serde(alias = "Multisport", alias = "MS")]
    SecondProviderStandard,
    /// Multisport Classic
    #[serde(alias = "Classic", alias = "CL")]
    SecondProviderClassic,
    #[serde(alias = "No card", alias = "NC")]
    NoCard,
}

impl CardType {
    pub const ALL: [CardType; 5] = [
        CardType::FullCoverage,
        CardType::LightCoverage,
        CardType::SecondProviderStandard,
        CardType::SecondProviderClassic,
        CardType::NoCard,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            CardType::FullCoverage => "Medicover",
            CardType::LightCoverage => "Medicover Light",
            CardType::SecondProviderStandard => "Multisport",
            CardType::SecondProviderClassic => "Classic",
            CardType::NoCard => "No card",
        }
    }

    /// Short badge label
    pub fn short_label(self) -> &'static str {
        match self {
            CardType::FullCoverage => "MD",
            CardType::LightCoverage => "ML",
            CardType::SecondProviderStandard => "MS",
            CardType::SecondProviderClassic => "CL",
            CardType::NoCard => "NC",
        }
    }

    fn snake_name(self) -> &'static str {
        match self {
            CardType::FullCoverage => "full_coverage",
            CardType::LightCoverage => "light_coverage",
            CardType::SecondProviderStandard => "second_provider_standard",
            CardType::SecondProviderClassic => "second_provider_classic",
            CardType::NoCard => "no_card",
        }
    }

    /// Whether usage of this card is drawn from the second provider's pool
    pub fn is_second_provider(self) -> bool {
        matches!(self, CardType::SecondProviderStandard | CardType::SecondProviderClassic)
    }

    /// Whether recorded usage earns a discount. Cardless attendees have no
    /// card to swipe.
    pub fn earns_discount(self) -> bool {
        self != CardType::NoCard
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_name())
    }
}

impl FromStr for CardType {
    type Err = AllocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        CardType::ALL
            .into_iter()
            .find(|card| {
                card.display_name().eq_ignore_ascii_case(needle)
                    || card.short_label().eq_ignore_ascii_case(needle)
                    || card.snake_name() == needle
            })
            .ok_or_else(|| AllocationError::UnknownCardType(needle.to_string()))
    }
}

/// One person at an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: AttendeeId,
    #[serde(alias = "cardType")]
    pub card_type: CardType,
    /// Times the attendee's card was used during the session
    #[serde(default, alias = "meteredUsage", alias = "usage")]
    pub metered_usage: u32,
}

impl Attendee {
    pub fn new(id: impl Into<AttendeeId>, card_type: CardType, metered_usage: u32) -> Self {
        Self { id: id.into(), card_type, metered_usage }
    }
}

/// Side-loaded usage keyed by attendee; missing entries fall back to the
/// attendee's embedded usage.
pub type UsageMap = HashMap<AttendeeId, u32>;
