//! Seat roster reconciliation.
//!
//! Replacing a room's seats wholesale must not recreate seats whose name is
//! unchanged: their ids are referenced by carts and reservation items.

use std::collections::{HashMap, HashSet};

use crate::models::room::{Seat, SeatInput};

/// Changes needed to turn the current roster into the desired one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RosterDiff {
    pub to_insert: Vec<SeatInput>,
    /// Existing seats carrying their new surcharge; id and name are kept.
    pub to_update: Vec<Seat>,
    pub to_delete: Vec<i64>,
}

impl RosterDiff {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Seats are matched by name. Matching seats with a different surcharge are
/// updated, unmatched desired seats are inserted and unmatched existing seats
/// are deleted. Output follows input order.
pub fn diff_roster(existing: &[Seat], desired: &[SeatInput]) -> RosterDiff {
    let current: HashMap<&str, &Seat> = existing.iter().map(|s| (s.name.as_str(), s)).collect();
    let wanted: HashSet<&str> = desired.iter().map(|s| s.name.as_str()).collect();

    let mut diff = RosterDiff::default();

    for input in desired {
        match current.get(input.name.as_str()) {
            Some(seat) if seat.additional_price == input.additional_price => {}
            Some(seat) => {
                let mut changed = (*seat).clone();
                changed.additional_price = input.additional_price;
                diff.to_update.push(changed);
            }
            None => diff.to_insert.push(input.clone()),
        }
    }

    diff.to_delete = existing
        .iter()
        .filter(|s| !wanted.contains(s.name.as_str()))
        .map(|s| s.id)
        .collect();

    diff
}
