//! Negotiated-total ("fame") reconciliation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::money::NOISE_SCALE;
use crate::redistribution::{redistribute_proportionally, PriceSlot};

/// How an override total is applied to the organic split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideMode {
    /// Scale every price down so the sum equals the override. An override
    /// above the organic total changes nothing.
    #[default]
    ScaleCap,
    /// Subtract the difference evenly from every attendee
    SubtractEvenly,
}

impl OverrideMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "scale_cap" | "scale" => Some(OverrideMode::ScaleCap),
            "subtract_evenly" | "subtract" => Some(OverrideMode::SubtractEvenly),
            _ => None,
        }
    }

    /// Apply `override_total` to the slots and return the override discount,
    /// `max(0, organic − override)`.
    pub(crate) fn reconcile(
        self,
        slots: &mut [PriceSlot],
        override_total: Option<Decimal>,
        max_iterations: u32,
    ) -> Decimal {
        let Some(target) = override_total else {
            return Decimal::ZERO;
        };
        let organic = slots.iter().map(|s| s.price).sum::<Decimal>().round_dp(NOISE_SCALE);
        if organic <= Decimal::ZERO {
            debug!(%target, "organic total is zero, override has nothing to scale");
            return Decimal::ZERO;
        }
        if target >= organic {
            debug!(%target, %organic, "override at or above organic total, not applied");
            return Decimal::ZERO;
        }

        let fame_discount = organic - target;
        debug!(mode = ?self, %organic, %target, %fame_discount, "applying override");
        match self {
            OverrideMode::ScaleCap => {
                for slot in slots.iter_mut() {
                    slot.price = slot.price * target / organic;
                }
            }
            OverrideMode::SubtractEvenly => {
                let split = fame_discount / Decimal::from(slots.len());
                for slot in slots.iter_mut() {
                    slot.price -= split;
                }
                // whoever drops below zero passes the rest on
                redistribute_proportionally(slots, max_iterations);
            }
        }
        fame_discount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttendeeId, CardType};

    fn slots(prices: &[i64]) -> Vec<PriceSlot> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| PriceSlot {
                id: AttendeeId::new(format!("p{}", i)),
                card_type: CardType::NoCard,
                usage: 0,
                price: Decimal::from(*p),
            })
            .collect()
    }

    #[test]
    fn test_scale_cap_hits_target() {
        let mut s = slots(&[40, 40, 20]);
        let discount = OverrideMode::ScaleCap.reconcile(&mut s, Some(Decimal::from(50)), 8);
        assert_eq!(discount, Decimal::from(50));
        assert_eq!(s[0].price, Decimal::from(20));
        assert_eq!(s[2].price, Decimal::from(10));
    }

    #[test]
    fn test_override_above_organic_is_noop() {
        let mut s = slots(&[40, 40]);
        let discount = OverrideMode::ScaleCap.reconcile(&mut s, Some(Decimal::from(100)), 8);
        assert_eq!(discount, Decimal::ZERO);
        assert_eq!(s[0].price, Decimal::from(40));
    }

    #[test]
    fn test_zero_organic_skips_scaling() {
        let mut s = slots(&[0, 0]);
        let discount = OverrideMode::ScaleCap.reconcile(&mut s, Some(Decimal::from(10)), 8);
        assert_eq!(discount, Decimal::ZERO);
        assert!(s.iter().all(|slot| slot.price.is_zero()));
    }

    #[test]
    fn test_subtract_evenly_passes_shortfall_on() {
        let mut s = slots(&[2, 40, 40]);
        let discount = OverrideMode::SubtractEvenly.reconcile(&mut s, Some(Decimal::from(70)), 8);
        assert_eq!(discount, Decimal::from(12));
        // 4 each; the first attendee can only give 2
        assert_eq!(s[0].price, Decimal::ZERO);
        assert_eq!(s[1].price, Decimal::from(35));
        assert_eq!(s[2].price, Decimal::from(35));
    }
}
