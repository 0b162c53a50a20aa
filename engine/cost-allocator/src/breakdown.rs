//! Per-card-type price breakdown
//!
//! Works on owner and usage counts per card type rather than on individual
//! attendees, and prices every holder of a card type the same. Coverage cards
//! push their overflow onto second-provider and cardless players, standard
//! second-provider cards push theirs onto cardless players, and a Classic
//! holder gets a fraction of a standard holder's discount that shrinks with
//! the session length. The negotiated total is subtractive here and is not
//! capped: an override above the net total shows up as a negative discount.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::money::{fixed_cents, format_statistic};
use crate::pricing::PricingConfig;
use crate::types::{Attendee, AttendeeId, CardType, UsageMap};

/// Counts that drive the breakdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTypeInput {
    pub full_coverage_owners: u32,
    pub light_coverage_owners: u32,
    pub standard_owners: u32,
    pub classic_owners: u32,
    pub no_card_owners: u32,

    pub full_coverage_usages: u32,
    pub light_coverage_usages: u32,
    /// Standard and Classic holders draw from one usage pool
    pub second_provider_usages: u32,

    pub courts: u32,
    pub price_per_hour: Decimal,
    pub hours: Decimal,
    pub fame_total: Decimal,
}

impl CardTypeInput {
    /// Tally a roster. Usage of cardless attendees carries no discount and is
    /// ignored.
    pub fn from_roster(roster: &[Attendee], usage: &UsageMap, pricing: &PricingConfig) -> Self {
        let mut input = CardTypeInput {
            courts: pricing.courts_booked,
            price_per_hour: pricing.price_per_hour,
            hours: pricing.hours_booked,
            fame_total: pricing.override_total().unwrap_or(Decimal::ZERO),
            ..Default::default()
        };

        for attendee in roster {
            let used = usage.get(&attendee.id).copied().unwrap_or(attendee.metered_usage);
            match attendee.card_type {
                CardType::FullCoverage => {
                    input.full_coverage_owners += 1;
                    input.full_coverage_usages += used;
                }
                CardType::LightCoverage => {
                    input.light_coverage_owners += 1;
                    input.light_coverage_usages += used;
                }
                CardType::SecondProviderStandard => {
                    input.standard_owners += 1;
                    input.second_provider_usages += used;
                }
                CardType::SecondProviderClassic => {
                    input.classic_owners += 1;
                    input.second_provider_usages += used;
                }
                CardType::NoCard => input.no_card_owners += 1,
            }
        }
        input
    }

    fn owners(&self, card_type: CardType) -> u32 {
        match card_type {
            CardType::FullCoverage => self.full_coverage_owners,
            CardType::LightCoverage => self.light_coverage_owners,
            CardType::SecondProviderStandard => self.standard_owners,
            CardType::SecondProviderClassic => self.classic_owners,
            CardType::NoCard => self.no_card_owners,
        }
    }

    pub fn people(&self) -> u32 {
        CardType::ALL.into_iter().map(|card| self.owners(card)).sum()
    }
}

/// Rendered breakdown. A card type has a share only when someone holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTypeBreakdown {
    pub total_price: String,
    pub discount: String,
    pub price_after_discount: String,
    pub fame_discount: String,
    pub shares: BTreeMap<CardType, String>,
}

impl CardTypeBreakdown {
    pub fn share(&self, card_type: CardType) -> Option<&str> {
        self.shares.get(&card_type).map(String::as_str)
    }

    /// Numeric amount per card type; types without holders pay zero
    pub fn payment_updates(&self) -> BTreeMap<CardType, Decimal> {
        CardType::ALL
            .into_iter()
            .map(|card| {
                let amount = self
                    .share(card)
                    .and_then(|share| share.parse::<Decimal>().ok())
                    .unwrap_or(Decimal::ZERO);
                (card, amount)
            })
            .collect()
    }

    /// Give every attendee the amount of their card type
    pub fn amounts_for_roster(&self, roster: &[Attendee]) -> BTreeMap<AttendeeId, Decimal> {
        let updates = self.payment_updates();
        roster
            .iter()
            .map(|attendee| (attendee.id.clone(), updates[&attendee.card_type]))
            .collect()
    }
}

/// Fraction of a standard holder's discount a Classic holder receives
pub fn classic_factor(hours: Decimal) -> Decimal {
    if hours == Decimal::ONE {
        Decimal::ONE
    } else if hours <= Decimal::from(2) {
        Decimal::new(5, 1)
    } else if hours <= Decimal::from(3) {
        Decimal::new(33, 2)
    } else if hours <= Decimal::from(4) {
        Decimal::new(25, 2)
    } else {
        Decimal::ONE
    }
}

/// `amount / count`, or zero when nobody is there to take it
fn spread(amount: Decimal, count: Decimal) -> Decimal {
    if count.is_zero() {
        Decimal::ZERO
    } else {
        amount / count
    }
}

pub fn calculate_breakdown(input: &CardTypeInput, rate: Decimal) -> CardTypeBreakdown {
    let usages = input.full_coverage_usages + input.light_coverage_usages + input.second_provider_usages;
    let discount = Decimal::from(usages) * rate;
    let total = Decimal::from(input.courts) * input.price_per_hour * input.hours;
    let price_after_discount = total - discount;

    let has_fame = input.fame_total > Decimal::ZERO;
    let fame_discount = if has_fame { price_after_discount - input.fame_total } else { Decimal::ZERO };
    let real_total = price_after_discount - fame_discount;
    let fame_display =
        fixed_cents(fame_discount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero));

    let present: Vec<CardType> = CardType::ALL.into_iter().filter(|card| input.owners(*card) > 0).collect();
    let people = Decimal::from(input.people());

    if real_total <= Decimal::ZERO || people.is_zero() {
        debug!(%total, %discount, %real_total, "nothing left to charge");
        return CardTypeBreakdown {
            total_price: format_statistic(total),
            discount: format_statistic(discount),
            price_after_discount: if real_total <= Decimal::ZERO {
                "0".to_string()
            } else {
                format_statistic(real_total)
            },
            fame_discount: fame_display,
            shares: present.into_iter().map(|card| (card, "0".to_string())).collect(),
        };
    }

    let full_coverage_owners = Decimal::from(input.full_coverage_owners);
    let light_coverage_owners = Decimal::from(input.light_coverage_owners);
    let standard_owners = Decimal::from(input.standard_owners);
    let classic_owners = Decimal::from(input.classic_owners);
    let no_card_owners = Decimal::from(input.no_card_owners);
    let absorbers = standard_owners + classic_owners + no_card_owners;

    let mut no_card = (total - fame_discount) / people;

    let full_coverage_price = if input.full_coverage_owners > 0 {
        no_card - Decimal::from(input.full_coverage_usages) * rate / full_coverage_owners
    } else {
        Decimal::ZERO
    };
    let full_coverage_extra = if full_coverage_price < Decimal::ZERO {
        spread(full_coverage_price * full_coverage_owners, absorbers)
    } else {
        Decimal::ZERO
    };

    let light_coverage_price = if input.light_coverage_owners > 0 {
        no_card - Decimal::from(input.light_coverage_usages) * rate / light_coverage_owners
    } else {
        Decimal::ZERO
    };
    let light_coverage_extra = if light_coverage_price < Decimal::ZERO {
        spread(light_coverage_price * light_coverage_owners, absorbers)
    } else {
        Decimal::ZERO
    };

    let factor = classic_factor(input.hours);
    let standard_discount = spread(
        Decimal::from(input.second_provider_usages) * rate,
        standard_owners + classic_owners * factor,
    );
    let classic_discount = standard_discount * factor;

    let coverage_extra = full_coverage_extra + light_coverage_extra;
    let standard_price = no_card - standard_discount + coverage_extra;
    let standard_extra = if standard_price < Decimal::ZERO {
        spread(standard_price * standard_owners, no_card_owners)
    } else {
        Decimal::ZERO
    };

    let classic_price = if input.classic_owners > 0 {
        no_card - classic_discount + coverage_extra + standard_extra
    } else {
        Decimal::ZERO
    };

    no_card += standard_extra + coverage_extra;

    debug!(
        %no_card,
        %standard_price,
        %classic_price,
        %full_coverage_price,
        %light_coverage_price,
        "card type prices"
    );

    let shares = present
        .into_iter()
        .map(|card| {
            let price = match card {
                CardType::FullCoverage => full_coverage_price,
                CardType::LightCoverage => light_coverage_price,
                CardType::SecondProviderStandard => standard_price,
                CardType::SecondProviderClassic => classic_price.max(Decimal::ZERO),
                CardType::NoCard => no_card,
            };
            (card, format_statistic(price))
        })
        .collect();

    CardTypeBreakdown {
        total_price: format_statistic(total),
        discount: format_statistic(discount),
        price_after_discount: format_statistic(real_total),
        fame_discount: fame_display,
        shares,
    }
}
