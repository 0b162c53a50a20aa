use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::money::{format_amount, round_amount};
use crate::pricing::PricingConfig;
use crate::redistribution::PriceSlot;
use crate::statistics::{Statistics, StatisticsDisplay};
use crate::types::{Attendee, AttendeeId, CardType, UsageMap};

/// Result of one allocation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Allocation {
    /// Amount owed per attendee, rounded to the cent and never negative
    pub amounts: BTreeMap<AttendeeId, Decimal>,
    pub statistics: Statistics,
    /// Sum of final amounts per card type present in the roster
    pub card_type_subtotals: BTreeMap<CardType, Decimal>,
}

impl Allocation {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn amount_for(&self, id: &AttendeeId) -> Option<Decimal> {
        self.amounts.get(id).copied()
    }

    /// Sum of the rounded per-attendee amounts
    pub fn total(&self) -> Decimal {
        self.amounts.values().copied().sum()
    }

    /// Attendees whose amount differs from `previous`, including ones that
    /// were not in it. These are the rows a persistence sink must rewrite.
    pub fn changed_since(&self, previous: &Allocation) -> Vec<(AttendeeId, Decimal)> {
        self.amounts
            .iter()
            .filter(|(id, amount)| previous.amounts.get(*id) != Some(*amount))
            .map(|(id, amount)| (id.clone(), *amount))
            .collect()
    }

    pub fn display(&self) -> StatisticsDisplay {
        self.statistics.display()
    }

    /// Per-attendee amounts rendered with two decimals
    pub fn formatted_amounts(&self) -> BTreeMap<AttendeeId, String> {
        self.amounts.iter().map(|(id, amount)| (id.clone(), format_amount(*amount))).collect()
    }
}

/// Splits a court booking across a roster.
///
/// Pure and stateless apart from its policy configuration; one instance can
/// serve any number of concurrent calls.
#[derive(Debug, Clone, Default)]
pub struct CostAllocator {
    config: EngineConfig,
}

impl CostAllocator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Allocate using each attendee's embedded usage
    pub fn allocate_embedded(&self, roster: &[Attendee], pricing: &PricingConfig) -> Allocation {
        self.allocate(roster, pricing, &UsageMap::new())
    }

    /// Compute what every attendee owes.
    ///
    /// Everyone starts from an equal share of the base total minus their own
    /// usage discount. Usage recorded for a cardless attendee is ignored. Negative balances are redistributed per the configured
    /// policy, then the override total (if any) is reconciled. An empty roster
    /// yields an empty allocation with zero statistics.
    pub fn allocate(&self, roster: &[Attendee], pricing: &PricingConfig, usage: &UsageMap) -> Allocation {
        if roster.is_empty() {
            debug!("empty roster, nothing to allocate");
            return Allocation::empty();
        }

        let rate = self.config.discount_per_usage;
        let base_total = pricing.base_total();
        let base_share = base_total / Decimal::from(roster.len());

        let mut slots: Vec<PriceSlot> = roster
            .iter()
            .map(|attendee| {
                let usage = if attendee.card_type.earns_discount() {
                    usage.get(&attendee.id).copied().unwrap_or(attendee.metered_usage)
                } else {
                    0
                };
                PriceSlot {
                    id: attendee.id.clone(),
                    card_type: attendee.card_type,
                    usage,
                    price: base_share - Decimal::from(usage) * rate,
                }
            })
            .collect();

        let nominal_discount: Decimal = slots.iter().map(|s| Decimal::from(s.usage) * rate).sum();

        self.config.redistribution.apply(&mut slots, self.config.max_iterations);
        let fame_discount =
            self.config
                .override_mode
                .reconcile(&mut slots, pricing.override_total(), self.config.max_iterations);

        let charged: Decimal = slots.iter().map(|s| s.price.max(Decimal::ZERO)).sum();
        let net = base_total - nominal_discount;
        let price_after_discount = if net < Decimal::ZERO { net } else { charged };

        let mut amounts = BTreeMap::new();
        let mut card_type_subtotals: BTreeMap<CardType, Decimal> = BTreeMap::new();
        for slot in &slots {
            let amount = round_amount(slot.price);
            *card_type_subtotals.entry(slot.card_type).or_default() += amount;
            amounts.insert(slot.id.clone(), amount);
        }

        let statistics = Statistics {
            total_price: base_total,
            discount: nominal_discount,
            price_after_discount,
            fame_discount,
        };

        info!(
            attendees = roster.len(),
            %base_total,
            %nominal_discount,
            %charged,
            %fame_discount,
            "allocated court cost"
        );

        Allocation { amounts, statistics, card_type_subtotals }
    }

    /// Record a new usage count for one attendee and recompute everybody, so
    /// overflow created by the change reaches the other attendees at once.
    ///
    /// Returns the updated usage map together with the new allocation.
    pub fn recalculate_after_usage_change(
        &self,
        roster: &[Attendee],
        pricing: &PricingConfig,
        usage: &UsageMap,
        attendee: &AttendeeId,
        new_usage: u32,
    ) -> (UsageMap, Allocation) {
        let mut usage = usage.clone();
        let previous = usage.insert(attendee.clone(), new_usage);
        debug!(%attendee, ?previous, new_usage, "usage changed");
        let allocation = self.allocate(roster, pricing, &usage);
        (usage, allocation)
    }
}

/// [`CostAllocator::recalculate_after_usage_change`] with the default policy
pub fn recalculate_after_usage_change(
    roster: &[Attendee],
    pricing: &PricingConfig,
    usage: &UsageMap,
    attendee: &AttendeeId,
    new_usage: u32,
) -> (UsageMap, Allocation) {
    CostAllocator::default().recalculate_after_usage_change(roster, pricing, usage, attendee, new_usage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pricing(courts: u32, price: i64, hours: i64) -> PricingConfig {
        PricingConfig::new(courts, Decimal::from(price), Decimal::from(hours))
    }

    #[test]
    fn test_empty_roster() {
        let allocation = CostAllocator::default().allocate_embedded(&[], &pricing(1, 80, 2));
        assert!(allocation.amounts.is_empty());
        assert_eq!(allocation.statistics, Statistics::default());
        assert_eq!(allocation.display().price_after_discount, "0.00");
    }

    #[test]
    fn test_usage_map_overrides_embedded_usage() {
        let roster = vec![
            Attendee::new("a", CardType::SecondProviderStandard, 4),
            Attendee::new("b", CardType::NoCard, 0),
        ];
        let mut usage = UsageMap::new();
        usage.insert(AttendeeId::from("a"), 1);
        let allocation = CostAllocator::default().allocate(&roster, &pricing(1, 40, 1), &usage);
        assert_eq!(allocation.amount_for(&"a".into()), Some(Decimal::from(5)));
        assert_eq!(allocation.amount_for(&"b".into()), Some(Decimal::from(20)));
        assert_eq!(allocation.statistics.discount, Decimal::from(15));
    }

    #[test]
    fn test_card_type_subtotals() {
        let roster = vec![
            Attendee::new("a", CardType::SecondProviderStandard, 2),
            Attendee::new("b", CardType::SecondProviderStandard, 2),
            Attendee::new("c", CardType::NoCard, 0),
        ];
        let allocation = CostAllocator::default().allocate_embedded(&roster, &pricing(1, 60, 2));
        assert_eq!(allocation.card_type_subtotals[&CardType::SecondProviderStandard], Decimal::from(20));
        assert_eq!(allocation.card_type_subtotals[&CardType::NoCard], Decimal::from(40));
        assert!(!allocation.card_type_subtotals.contains_key(&CardType::FullCoverage));
    }

    #[test]
    fn test_usage_change_reaches_other_attendees() {
        let roster = vec![
            Attendee::new("md", CardType::FullCoverage, 0),
            Attendee::new("nc", CardType::NoCard, 0),
        ];
        let pricing = pricing(1, 40, 1);
        let allocator = CostAllocator::default();
        let before = allocator.allocate_embedded(&roster, &pricing);

        let (usage, after) =
            allocator.recalculate_after_usage_change(&roster, &pricing, &UsageMap::new(), &"md".into(), 2);
        assert_eq!(usage[&AttendeeId::from("md")], 2);
        assert_eq!(after.amount_for(&"md".into()), Some(Decimal::ZERO));
        assert_eq!(after.amount_for(&"nc".into()), Some(Decimal::from(10)));

        let changed = after.changed_since(&before);
        assert_eq!(changed.len(), 2);
        assert!(after.changed_since(&after).is_empty());
    }

    #[test]
    fn test_cardless_usage_earns_no_discount() {
        let roster = vec![
            Attendee::new("ms", CardType::SecondProviderStandard, 1),
            Attendee::new("nc", CardType::NoCard, 3),
        ];
        let mut usage = UsageMap::new();
        usage.insert(AttendeeId::from("nc"), 2);
        let allocation = CostAllocator::default().allocate(&roster, &pricing(1, 40, 1), &usage);
        assert_eq!(allocation.statistics.discount, Decimal::from(15));
        assert_eq!(allocation.amount_for(&"ms".into()), Some(Decimal::from(5)));
        assert_eq!(allocation.amount_for(&"nc".into()), Some(Decimal::from(20)));
    }
}
