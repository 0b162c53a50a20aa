//! Negative-balance redistribution
//!
//! An attendee whose discount exceeds their equal share ends up with a
//! negative price. That overflow is floored away from them and charged to
//! attendees who still pay something. Which attendees absorb it, and in what
//! proportion, is policy: proportional (default), an even split, or an
//! ordered card-type cascade. Every policy finishes with a proportional pass
//! so overflow is never dropped.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{AttendeeId, CardType};

/// Working price of one attendee during an allocation
#[derive(Debug, Clone)]
pub(crate) struct PriceSlot {
    pub id: AttendeeId,
    pub card_type: CardType,
    pub usage: u32,
    pub price: Decimal,
}

/// Redistribution policy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "rules", rename_all = "snake_case")]
pub enum Redistribution {
    /// Iterative proportional redistribution to convergence
    #[default]
    Proportional,
    /// One pass splitting the overflow evenly among payers
    EvenSplit,
    /// Ordered card-type rules; leftovers go proportional
    Cascade(CascadeRules),
}

/// Overflow of `source` holders is split evenly across holders of `recipients`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeRule {
    pub source: CardType,
    pub recipients: Vec<CardType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CascadeRules(pub Vec<CascadeRule>);

impl CascadeRules {
    /// Priority list used by the per-card-type calculator: coverage cards push
    /// overflow onto second-provider and cardless players, second-provider
    /// cards push onto cardless players only.
    pub fn legacy() -> Self {
        use CardType::*;
        let payers = vec![SecondProviderStandard, SecondProviderClassic, NoCard];
        Self(vec![
            CascadeRule { source: FullCoverage, recipients: payers.clone() },
            CascadeRule { source: LightCoverage, recipients: payers },
            CascadeRule { source: SecondProviderStandard, recipients: vec![NoCard] },
            CascadeRule { source: SecondProviderClassic, recipients: vec![NoCard] },
        ])
    }

    pub fn rules(&self) -> &[CascadeRule] {
        &self.0
    }
}

impl Default for CascadeRules {
    fn default() -> Self {
        Self::legacy()
    }
}

impl Redistribution {
    /// Parse the policy name used by environment configuration
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "proportional" => Some(Redistribution::Proportional),
            "even_split" | "even" => Some(Redistribution::EvenSplit),
            "cascade" => Some(Redistribution::Cascade(CascadeRules::legacy())),
            _ => None,
        }
    }

    pub(crate) fn apply(&self, slots: &mut [PriceSlot], max_iterations: u32) {
        match self {
            Redistribution::Proportional => {}
            Redistribution::EvenSplit => split_evenly_once(slots),
            Redistribution::Cascade(rules) => cascade(slots, rules),
        }
        redistribute_proportionally(slots, max_iterations);
    }
}

fn overflow_of<'a>(slots: impl Iterator<Item = &'a PriceSlot>) -> Decimal {
    slots.filter(|s| s.price < Decimal::ZERO).map(|s| -s.price).sum()
}

/// Floor negative prices and charge the overflow to positive prices in
/// proportion to each one's current price. Stops once nothing is negative or
/// nobody is left to absorb; in the latter case everyone is floored at zero.
///
/// Returns the number of passes that moved overflow.
pub(crate) fn redistribute_proportionally(slots: &mut [PriceSlot], max_iterations: u32) -> u32 {
    for pass in 0..max_iterations {
        let overflow = overflow_of(slots.iter());
        if overflow.is_zero() {
            return pass;
        }

        for slot in slots.iter_mut().filter(|s| s.price < Decimal::ZERO) {
            slot.price = Decimal::ZERO;
        }

        let absorbing: Decimal = slots.iter().filter(|s| s.price > Decimal::ZERO).map(|s| s.price).sum();
        if absorbing.is_zero() {
            debug!(%overflow, "no positive balance left to absorb overflow");
            return pass + 1;
        }

        debug!(pass, %overflow, %absorbing, "redistributing overflow proportionally");
        for slot in slots.iter_mut().filter(|s| s.price > Decimal::ZERO) {
            slot.price -= overflow * slot.price / absorbing;
        }
    }

    if overflow_of(slots.iter()) > Decimal::ZERO {
        warn!(max_iterations, "redistribution did not converge, flooring remaining balances");
        for slot in slots.iter_mut().filter(|s| s.price < Decimal::ZERO) {
            slot.price = Decimal::ZERO;
        }
    }
    max_iterations
}

/// One-shot even split of the overflow among attendees with a positive price.
fn split_evenly_once(slots: &mut [PriceSlot]) {
    let overflow = overflow_of(slots.iter());
    if overflow.is_zero() {
        return;
    }
    let payers = slots.iter().filter(|s| s.price > Decimal::ZERO).count();
    if payers == 0 {
        return;
    }

    for slot in slots.iter_mut().filter(|s| s.price < Decimal::ZERO) {
        slot.price = Decimal::ZERO;
    }
    let split = overflow / Decimal::from(payers);
    debug!(%overflow, payers, %split, "splitting overflow evenly");
    for slot in slots.iter_mut().filter(|s| s.price > Decimal::ZERO) {
        slot.price -= split;
    }
}

fn cascade(slots: &mut [PriceSlot], rules: &CascadeRules) {
    for rule in rules.rules() {
        let recipients = slots
            .iter()
            .filter(|s| s.card_type != rule.source && rule.recipients.contains(&s.card_type))
            .count();
        if recipients == 0 {
            continue;
        }

        let overflow = overflow_of(slots.iter().filter(|s| s.card_type == rule.source));
        if overflow.is_zero() {
            continue;
        }

        for slot in slots.iter_mut().filter(|s| s.card_type == rule.source && s.price < Decimal::ZERO) {
            slot.price = Decimal::ZERO;
        }
        let split = overflow / Decimal::from(recipients);
        debug!(source = %rule.source, %overflow, recipients, "cascading overflow");
        for slot in slots
            .iter_mut()
            .filter(|s| s.card_type != rule.source && rule.recipients.contains(&s.card_type))
        {
            slot.price -= split;
        }
    }
}
