//! Halting-duration tiers and priority ordering.
//!
//! Tier boundaries are the dashboard's green/yellow/red alert thresholds.
//! Ordering is a two-key sort: the coarse tier dominates, raw hours break
//! ties within a tier. A 24-hour halt therefore always outranks a 23-hour
//! one, while 13 and 23 hours sit adjacent in the same tier.

use serde::Serialize;
use std::cmp::Ordering;

use crate::model::Vehicle;

/// Alert tier for a halting duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HaltTier {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl HaltTier {
    pub fn from_hours(hours: f64) -> Self {
        if hours >= 24.0 {
            HaltTier::High
        } else if hours >= 12.0 {
            HaltTier::Medium
        } else {
            HaltTier::Low
        }
    }

    pub fn priority(self) -> u8 {
        self as u8
    }
}

/// Sorts vehicles by descending halt tier, then by descending raw hours.
/// The underlying sort is stable, so equal-hour vehicles keep input order.
pub fn sort_by_halt_priority(vehicles: &mut [Vehicle]) {
    vehicles.sort_by(|a, b| {
        let (a_hours, b_hours) = (a.halt_hours(), b.halt_hours());
        let a_priority = HaltTier::from_hours(a_hours).priority();
        let b_priority = HaltTier::from_hours(b_hours).priority();

        b_priority
            .cmp(&a_priority)
            .then(b_hours.partial_cmp(&a_hours).unwrap_or(Ordering::Equal))
    });
}

/// Formats a halting duration as `"2d 5h"`, or `"5h"` under a day.
pub fn format_halt_hours(hours: f64) -> String {
    let days = (hours / 24.0).floor();
    if days > 0.0 {
        let remaining = hours - days * 24.0;
        format!("{}d {}h", fmt_number(days), fmt_number(remaining))
    } else {
        format!("{}h", fmt_number(hours))
    }
}

fn fmt_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
