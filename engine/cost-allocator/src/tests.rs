//! Scenario tests for both calculators
//!
//! Fixtures reproduce sessions recorded at the club: owner counts, usage and
//! pricing together with the figures players were actually charged.

use rust_decimal::Decimal;

use crate::breakdown::{calculate_breakdown, CardTypeBreakdown, CardTypeInput};
use crate::config::EngineConfig;
use crate::engine::CostAllocator;
use crate::pricing::PricingConfig;
use crate::redistribution::{CascadeRules, Redistribution};
use crate::types::{Attendee, AttendeeId, CardType, UsageMap};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn pricing(courts: u32, price: &str, hours: &str) -> PricingConfig {
    PricingConfig::new(courts, dec(price), dec(hours))
}

/// Attendees `<prefix>1..=count` holding `card_type`, usage spread as evenly as possible
fn holders(prefix: &str, card_type: CardType, count: u32, usages: u32) -> Vec<Attendee> {
    (0..count)
        .map(|i| {
            let usage = usages / count + u32::from(i < usages % count);
            Attendee::new(format!("{}{}", prefix, i + 1), card_type, usage)
        })
        .collect()
}

fn amount(allocation: &crate::Allocation, id: &str) -> Decimal {
    allocation.amount_for(&AttendeeId::from(id)).unwrap()
}

#[cfg(test)]
mod allocation_scenarios {
    use super::*;

    #[test]
    fn test_two_standard_two_cardless() {
        let mut roster = holders("ms", CardType::SecondProviderStandard, 2, 4);
        roster.extend(holders("nc", CardType::NoCard, 2, 0));

        let allocation = CostAllocator::default().allocate_embedded(&roster, &pricing(1, "80", "2"));
        let display = allocation.display();
        assert_eq!(display.total_price, "160.00");
        assert_eq!(display.discount, "60.00");
        assert_eq!(display.price_after_discount, "100.00");
        assert_eq!(display.fame_discount, "0.00");
        assert_eq!(amount(&allocation, "nc1"), dec("40"));
        assert_eq!(amount(&allocation, "ms1"), dec("10"));
        assert_eq!(allocation.card_type_subtotals[&CardType::SecondProviderStandard], dec("20"));
    }

    #[test]
    fn test_discount_exceeding_base_total_zeroes_everyone() {
        let roster = vec![
            Attendee::new("md", CardType::FullCoverage, 1),
            Attendee::new("ml", CardType::LightCoverage, 1),
            Attendee::new("ms", CardType::SecondProviderStandard, 1),
            Attendee::new("nc", CardType::NoCard, 1),
        ];
        let allocation = CostAllocator::default().allocate_embedded(&roster, &pricing(1, "40", "1"));
        let display = allocation.display();
        assert_eq!(display.total_price, "40.00");
        assert_eq!(display.discount, "45.00");
        assert_eq!(display.price_after_discount, "0");
        assert!(allocation.amounts.values().all(|a| a.is_zero()));
        assert!(allocation.card_type_subtotals.values().all(|a| a.is_zero()));

        let input = CardTypeInput::from_roster(&roster, &UsageMap::new(), &pricing(1, "40", "1"));
        assert_eq!(calculate_breakdown(&input, dec("15")).discount, display.discount);
    }

    #[test]
    fn test_override_scales_down_to_negotiated_total() {
        let roster = vec![
            Attendee::new("md", CardType::FullCoverage, 1),
            Attendee::new("nc1", CardType::NoCard, 0),
            Attendee::new("nc2", CardType::NoCard, 0),
            Attendee::new("nc3", CardType::NoCard, 0),
        ];
        let pricing = pricing(1, "80", "2").with_override(dec("120"));
        let allocation = CostAllocator::default().allocate_embedded(&roster, &pricing);

        let display = allocation.display();
        assert_eq!(display.fame_discount, "25.00");
        assert_eq!(display.price_after_discount, "120.00");
        assert_eq!(amount(&allocation, "md"), dec("20.69"));
        assert_eq!(amount(&allocation, "nc1"), dec("33.10"));
        assert!((allocation.total() - dec("120")).abs() <= dec("0.04"));
    }

    #[test]
    fn test_override_above_organic_total_changes_nothing() {
        let roster = holders("nc", CardType::NoCard, 4, 0);
        let capped = pricing(1, "80", "2").with_override(dec("500"));
        let allocator = CostAllocator::default();

        let with_override = allocator.allocate_embedded(&roster, &capped);
        let without = allocator.allocate_embedded(&roster, &pricing(1, "80", "2"));
        assert_eq!(with_override.amounts, without.amounts);
        assert_eq!(with_override.display().fame_discount, "0.00");
    }

    #[test]
    fn test_proportional_redistribution_of_coverage_overflow() {
        let roster = vec![
            Attendee::new("medicover", CardType::FullCoverage, 3),
            Attendee::new("light", CardType::LightCoverage, 1),
            Attendee::new("no1", CardType::NoCard, 0),
            Attendee::new("no2", CardType::NoCard, 0),
        ];
        let allocation = CostAllocator::default().allocate_embedded(&roster, &pricing(1, "80", "2"));
        assert_eq!(amount(&allocation, "medicover"), Decimal::ZERO);
        assert_eq!(amount(&allocation, "light"), dec("23.81"));
        assert_eq!(amount(&allocation, "no1"), dec("38.10"));
        assert_eq!(amount(&allocation, "no2"), dec("38.10"));
        assert_eq!(allocation.display().price_after_discount, "100.00");
    }

    #[test]
    fn test_legacy_even_split_matches_recorded_amounts() {
        let roster = vec![
            Attendee::new("medicover", CardType::FullCoverage, 0),
            Attendee::new("light", CardType::LightCoverage, 0),
            Attendee::new("no1", CardType::NoCard, 0),
            Attendee::new("no2", CardType::NoCard, 0),
        ];
        let mut usage = UsageMap::new();
        usage.insert("medicover".into(), 3);
        usage.insert("light".into(), 1);

        let allocator = CostAllocator::new(EngineConfig::legacy_even_split());
        let allocation = allocator.allocate(&roster, &pricing(1, "80", "2"), &usage);

        let display = allocation.display();
        assert_eq!(display.total_price, "160.00");
        assert_eq!(display.price_after_discount, "100.00");
        assert_eq!(display.discount, "60.00");
        assert_eq!(display.fame_discount, "0.00");
        assert_eq!(amount(&allocation, "medicover"), Decimal::ZERO);
        assert_eq!(amount(&allocation, "light"), dec("23.33"));
        assert_eq!(amount(&allocation, "no1"), dec("38.33"));
        assert_eq!(amount(&allocation, "no2"), dec("38.33"));
    }

    #[test]
    fn test_cascade_policy_reproduces_card_type_breakdown() {
        let mut roster = holders("ms", CardType::SecondProviderStandard, 4, 12);
        roster.extend(holders("md", CardType::FullCoverage, 2, 6));
        roster.extend(holders("nc", CardType::NoCard, 2, 0));

        let config = EngineConfig {
            redistribution: Redistribution::Cascade(CascadeRules::legacy()),
            ..EngineConfig::default()
        };
        let allocation = CostAllocator::new(config).allocate_embedded(&roster, &pricing(2, "60", "2.5"));
        assert_eq!(amount(&allocation, "nc1"), dec("15"));
        assert_eq!(amount(&allocation, "nc2"), dec("15"));
        assert_eq!(amount(&allocation, "ms1"), Decimal::ZERO);
        assert_eq!(amount(&allocation, "md2"), Decimal::ZERO);
        assert_eq!(allocation.display().price_after_discount, "30.00");
    }

    #[test]
    fn test_allocation_is_idempotent() {
        let mut roster = holders("ms", CardType::SecondProviderStandard, 3, 7);
        roster.extend(holders("nc", CardType::NoCard, 2, 0));
        let pricing = pricing(2, "77", "1.5").with_override(dec("150"));
        let allocator = CostAllocator::default();
        assert_eq!(allocator.allocate_embedded(&roster, &pricing), allocator.allocate_embedded(&roster, &pricing));
    }
}

#[cfg(test)]
mod breakdown_scenarios {
    use super::*;

    struct Counts {
        full: u32,
        light: u32,
        standard: u32,
        classic: u32,
        no_card: u32,
    }

    #[allow(clippy::too_many_arguments)]
    fn breakdown(
        counts: Counts,
        full_usages: u32,
        light_usages: u32,
        second_usages: u32,
        courts: u32,
        price: &str,
        hours: &str,
        fame: &str,
    ) -> CardTypeBreakdown {
        let input = CardTypeInput {
            full_coverage_owners: counts.full,
            light_coverage_owners: counts.light,
            standard_owners: counts.standard,
            classic_owners: counts.classic,
            no_card_owners: counts.no_card,
            full_coverage_usages: full_usages,
            light_coverage_usages: light_usages,
            second_provider_usages: second_usages,
            courts,
            price_per_hour: dec(price),
            hours: dec(hours),
            fame_total: dec(fame),
        };
        calculate_breakdown(&input, dec("15"))
    }

    fn assert_totals(b: &CardTypeBreakdown, total: &str, discount: &str, after: &str, fame: &str) {
        assert_eq!(b.total_price, total);
        assert_eq!(b.discount, discount);
        assert_eq!(b.price_after_discount, after);
        assert_eq!(b.fame_discount, fame);
    }

    fn assert_shares(b: &CardTypeBreakdown, expected: [Option<&str>; 5]) {
        for (card, share) in CardType::ALL.into_iter().zip(expected) {
            assert_eq!(b.share(card), share, "share of {}", card);
        }
    }

    #[test]
    fn test_2h_2ms_2nc_4u() {
        let b = breakdown(
            Counts { full: 0, light: 0, standard: 2, classic: 0, no_card: 2 },
            0, 0, 4, 1, "80", "2", "0",
        );
        assert_totals(&b, "160.00", "60.00", "100.00", "0.00");
        assert_shares(&b, [None, None, Some("10.00"), None, Some("40.00")]);
    }

    #[test]
    fn test_2h_2ms_1cl_1nc_4u() {
        let b = breakdown(
            Counts { full: 0, light: 0, standard: 2, classic: 1, no_card: 1 },
            0, 0, 4, 1, "80", "2", "0",
        );
        assert_totals(&b, "160.00", "60.00", "100.00", "0.00");
        assert_shares(&b, [None, None, Some("16.00"), Some("28.00"), Some("40.00")]);
    }

    #[test]
    fn test_4c_2h_13ms_3nc_16u_with_fame() {
        let b = breakdown(
            Counts { full: 0, light: 0, standard: 13, classic: 0, no_card: 3 },
            0, 0, 16, 4, "80", "2", "360",
        );
        assert_totals(&b, "640.00", "240.00", "360.00", "40.00");
        assert_shares(&b, [None, None, Some("19.04"), None, Some("37.50")]);
    }

    #[test]
    fn test_5c_2h_18ms_1cl_1nc_20u_fame_equal_to_net() {
        let b = breakdown(
            Counts { full: 0, light: 0, standard: 18, classic: 1, no_card: 1 },
            0, 0, 20, 5, "55", "2", "250",
        );
        assert_totals(&b, "550.00", "300.00", "250.00", "0.00");
        assert_shares(&b, [None, None, Some("11.29"), Some("19.40"), Some("27.50")]);
    }

    #[test]
    fn test_2h_2ms_2mc_8u() {
        let b = breakdown(
            Counts { full: 2, light: 0, standard: 2, classic: 0, no_card: 0 },
            4, 0, 4, 1, "80", "2", "0",
        );
        assert_totals(&b, "160.00", "120.00", "40.00", "0.00");
        assert_shares(&b, [Some("10.00"), None, Some("10.00"), None, None]);
    }

    #[test]
    fn test_2h_3ms_2mc_2cl_1nc_12u() {
        let b = breakdown(
            Counts { full: 2, light: 0, standard: 3, classic: 2, no_card: 1 },
            4, 0, 8, 2, "80", "2", "0",
        );
        assert_totals(&b, "320.00", "180.00", "140.00", "0.00");
        assert_shares(&b, [Some("10.00"), None, Some("10.00"), Some("25.00"), Some("40.00")]);
    }

    #[test]
    fn test_overflow_cascades_to_cardless_players() {
        let b = breakdown(
            Counts { full: 2, light: 0, standard: 4, classic: 0, no_card: 2 },
            6, 0, 12, 2, "60", "2.5", "0",
        );
        assert_totals(&b, "300.00", "270.00", "30.00", "0.00");
        assert_shares(&b, [Some("0"), None, Some("0"), None, Some("15.00")]);
    }

    #[test]
    fn test_overflow_cascades_past_empty_standard_group() {
        let b = breakdown(
            Counts { full: 2, light: 0, standard: 0, classic: 1, no_card: 1 },
            4, 0, 1, 1, "65", "1.5", "0",
        );
        assert_totals(&b, "97.50", "75.00", "22.50", "0.00");
        assert_shares(&b, [Some("0"), None, None, Some("3.75"), Some("18.75")]);
    }

    #[test]
    fn test_discount_above_total_with_standard_holder() {
        let b = breakdown(
            Counts { full: 1, light: 1, standard: 1, classic: 0, no_card: 1 },
            1, 1, 1, 1, "40", "1", "0",
        );
        assert_totals(&b, "40.00", "45.00", "0", "0.00");
        assert_shares(&b, [Some("0"), Some("0"), Some("0"), None, Some("0")]);
    }

    #[test]
    fn test_discount_above_total_with_classic_holder() {
        let b = breakdown(
            Counts { full: 1, light: 1, standard: 0, classic: 1, no_card: 1 },
            1, 1, 1, 1, "40", "1", "0",
        );
        assert_totals(&b, "40.00", "45.00", "0", "0.00");
        assert_shares(&b, [Some("0"), Some("0"), None, Some("0"), Some("0")]);
    }

    #[test]
    fn test_standard_share_exactly_zero_renders_with_decimals() {
        let b = breakdown(
            Counts { full: 0, light: 2, standard: 4, classic: 0, no_card: 2 },
            0, 2, 8, 2, "60", "2", "0",
        );
        assert_totals(&b, "240.00", "150.00", "90.00", "0.00");
        assert_shares(&b, [None, Some("15.00"), Some("0.00"), None, Some("30.00")]);
    }

    #[test]
    fn test_4c_2h_10ms_4ml_2nc_20u_with_fame() {
        let b = breakdown(
            Counts { full: 0, light: 4, standard: 10, classic: 0, no_card: 2 },
            0, 4, 16, 4, "80", "2", "300",
        );
        assert_totals(&b, "640.00", "300.00", "300.00", "40.00");
        assert_shares(&b, [None, Some("22.50"), Some("13.50"), None, Some("37.50")]);
    }

    #[test]
    fn test_2h_2ml_1nc_1cl_3u() {
        let b = breakdown(
            Counts { full: 0, light: 2, standard: 0, classic: 1, no_card: 1 },
            0, 2, 1, 1, "55", "2", "0",
        );
        assert_totals(&b, "110.00", "45.00", "65.00", "0.00");
        assert_shares(&b, [None, Some("12.50"), None, Some("12.50"), Some("27.50")]);
    }

    #[test]
    fn test_2h_1ml_1nc_2ms_5u() {
        let b = breakdown(
            Counts { full: 0, light: 1, standard: 2, classic: 0, no_card: 1 },
            0, 1, 4, 1, "80", "2", "0",
        );
        assert_totals(&b, "160.00", "75.00", "85.00", "0.00");
        assert_shares(&b, [None, Some("25.00"), Some("10.00"), None, Some("40.00")]);
    }

    #[test]
    fn test_fame_above_net_total_is_a_negative_discount() {
        let b = breakdown(
            Counts { full: 0, light: 0, standard: 2, classic: 0, no_card: 2 },
            0, 0, 4, 1, "80", "2", "120",
        );
        assert_totals(&b, "160.00", "60.00", "120.00", "-20.00");
        assert_shares(&b, [None, None, Some("15.00"), None, Some("45.00")]);
    }

    #[test]
    fn test_breakdown_from_roster_matches_fixture() {
        let mut roster = holders("ms", CardType::SecondProviderStandard, 2, 4);
        roster.extend(holders("nc", CardType::NoCard, 2, 0));
        let input = CardTypeInput::from_roster(&roster, &UsageMap::new(), &pricing(1, "80", "2"));
        let b = calculate_breakdown(&input, dec("15"));
        assert_totals(&b, "160.00", "60.00", "100.00", "0.00");
        assert_eq!(b.amounts_for_roster(&roster)[&AttendeeId::from("ms2")], dec("10"));
    }
}
