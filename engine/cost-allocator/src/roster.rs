//! Roster helpers for callers building engine input

use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::{Attendee, CardType, UsageMap};

/// Attendee count per card type in canonical order, zeros included
pub fn card_type_counts(roster: &[Attendee]) -> Vec<(CardType, usize)> {
    let mut counts: BTreeMap<CardType, usize> = CardType::ALL.into_iter().map(|card| (card, 0)).collect();
    for attendee in roster {
        *counts.entry(attendee.card_type).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Stable sort by canonical card order
pub fn sorted_by_card_type(roster: &[Attendee]) -> Vec<Attendee> {
    let mut sorted = roster.to_vec();
    sorted.sort_by_key(|attendee| attendee.card_type);
    sorted
}

/// Usage map holding every attendee's embedded usage
pub fn embedded_usage(roster: &[Attendee]) -> UsageMap {
    roster.iter().map(|attendee| (attendee.id.clone(), attendee.metered_usage)).collect()
}

/// Parse a JSON array of attendees
pub fn parse_roster_json(content: &str) -> Result<Vec<Attendee>> {
    Ok(serde_json::from_str(content)?)
}

/// Parse a JSON object of attendee id to usage count
pub fn parse_usage_json(content: &str) -> Result<UsageMap> {
    Ok(serde_json::from_str(content)?)
}
