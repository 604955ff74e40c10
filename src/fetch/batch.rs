//! Chunked batch requests and the merge policy for their results.
//!
//! The halting-hours and trip endpoints cap each request at fifty vehicle
//! numbers. Callers split the fleet into chunks, issue them concurrently,
//! and fold the settled results into one map.

use anyhow::Result;
use std::collections::HashMap;
use tracing::warn;

/// Maximum vehicle numbers per batch request, the API's documented cap.
pub const MAX_BATCH: usize = 50;

/// How failed chunks fold into the combined result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// A failed chunk contributes nothing; the rest of the batch stands.
    BestEffort,
    /// Any failed chunk fails the whole batch.
    Strict,
}

/// Splits vehicle numbers into chunks of at most `size`.
pub fn chunk_numbers(numbers: &[String], size: usize) -> Vec<Vec<String>> {
    numbers.chunks(size.max(1)).map(<[String]>::to_vec).collect()
}

/// Folds per-chunk results into one map according to `policy`.
pub fn merge_chunks<T>(
    results: Vec<Result<HashMap<String, T>>>,
    policy: MergePolicy,
) -> Result<HashMap<String, T>> {
    let mut merged = HashMap::new();

    for result in results {
        match result {
            Ok(chunk) => merged.extend(chunk),
            Err(e) => match policy {
                MergePolicy::BestEffort => {
                    warn!(error = %e, "Skipping failed batch chunk");
                }
                MergePolicy::Strict => return Err(e),
            },
        }
    }

    Ok(merged)
}
