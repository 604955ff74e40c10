//! Document expiry evaluation.
//!
//! Expiry dates come from the static document registry. A vehicle with no
//! registry record is treated as worst-case for every document kind.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::model::DocumentRecord;

/// Document registry keyed by vehicle number.
pub type DocumentRegistry = HashMap<String, DocumentRecord>;

/// Days before expiry at which a document starts warning.
const WARNING_WINDOW_DAYS: i64 = 10;

/// Health tier of a statutory document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocTier {
    Danger,
    Warning,
    #[serde(rename = "success")]
    Ok,
}

impl DocTier {
    /// Display marker shown next to the tier in tables and exports.
    pub fn marker(self) -> &'static str {
        match self {
            DocTier::Danger => "✗",
            DocTier::Warning => "⚠",
            DocTier::Ok => "✓",
        }
    }
}

/// The three statutory document kinds tracked per vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pollution,
    Permit,
    Fitness,
}

impl DocumentKind {
    /// Short column label used in table headers.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Pollution => "PUC",
            DocumentKind::Permit => "NP",
            DocumentKind::Fitness => "FIT",
        }
    }
}

/// Tiers an expiry date against `now`.
///
/// Missing or already-expired dates are [`DocTier::Danger`]; anything due
/// within [`WARNING_WINDOW_DAYS`] (inclusive, counted in whole days rounded
/// up) is [`DocTier::Warning`].
pub fn evaluate(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DocTier {
    let Some(expiry) = expiry else {
        return DocTier::Danger;
    };
    if expiry < now {
        return DocTier::Danger;
    }

    let seconds_left = (expiry - now).num_seconds();
    let days_left = (seconds_left + 86_399) / 86_400;

    if days_left <= WARNING_WINDOW_DAYS {
        DocTier::Warning
    } else {
        DocTier::Ok
    }
}

/// Tiers one document kind for a vehicle. No registry record means
/// [`DocTier::Danger`] regardless of the requested kind.
pub fn lookup(
    registry: &DocumentRegistry,
    vehicle_number: &str,
    kind: DocumentKind,
    now: DateTime<Utc>,
) -> DocTier {
    let Some(record) = registry.get(vehicle_number) else {
        return DocTier::Danger;
    };

    let expiry = match kind {
        DocumentKind::Pollution => record.pollution_expiry,
        DocumentKind::Permit => record.permit_expiry,
        DocumentKind::Fitness => record.fitness_expiry,
    };

    evaluate(expiry, now)
}

/// Folds the registry array into a map keyed by vehicle number. Later records
/// for the same vehicle win.
pub fn build_registry(records: Vec<DocumentRecord>) -> DocumentRegistry {
    records
        .into_iter()
        .map(|r| (r.vehicle_number.clone(), r))
        .collect()
}
