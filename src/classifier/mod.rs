//! Vehicle-state classification and annotation.
//!
//! This module partitions a fetched fleet snapshot into per-status buckets,
//! orders each bucket by halting priority, resolves a display place for every
//! vehicle, evaluates document health, and tallies branch-level availability.

pub mod distance;
pub mod documents;
pub mod halting;
pub mod location;
pub mod snapshot;
