use std::time::Duration;

use crate::selection::subset_sum::MAX_SUBSET_SUM_CALLS;
use crate::types::InputsLimit;

/// Default cap on inputs per transfer; keeps bundles within signature-size limits.
pub const DEFAULT_MAX_INPUTS: usize = 2;

/// How recent the latest milestone must be for a node to count as synced.
pub const DEFAULT_SYNC_FRESHNESS: Duration = Duration::from_secs(5 * 60);

/// Tunables for input selection and node trust checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionConfig {
    pub max_inputs: InputsLimit,
    pub max_subset_sum_calls: usize,
    pub sync_freshness: Duration,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_inputs: InputsLimit::new(DEFAULT_MAX_INPUTS),
            max_subset_sum_calls: MAX_SUBSET_SUM_CALLS,
            sync_freshness: DEFAULT_SYNC_FRESHNESS,
        }
    }
}
