//! Entry points turning a wallet's address pool into transfer inputs.
//!
//! [`prepare_inputs`] works from local state only. [`get_inputs`] first runs the
//! [`AddressSafetyFilter`] against a node, then selects. Neither checks node sync; callers
//! run [`crate::sync::ensure_synced`] before trusting network-sourced balances.

pub mod greedy;
pub mod subset_sum;

use tracing::info;

use crate::balance::AddressPool;
use crate::config::SelectionConfig;
use crate::error::InputSelectionError;
use crate::provider::NodeApi;
use crate::safety::AddressSafetyFilter;
use crate::types::{AddressEntry, Input, InputsLimit, Selection, Threshold, TransactionRecord};

fn ensure_pool_covers(pool: &AddressPool, threshold: Threshold) -> Result<(), InputSelectionError> {
    let available = pool.total_balance()?;
    if available < threshold.get() {
        return Err(InputSelectionError::InsufficientBalance {
            available,
            threshold: threshold.get(),
        });
    }
    Ok(())
}

fn pool_inputs(pool: &AddressPool) -> Vec<Input> {
    pool.entries().iter().map(Input::from).collect()
}

/// Select inputs from locally known, unspent, funded addresses.
pub fn prepare_inputs(
    entries: &[AddressEntry],
    threshold: u64,
    limit: InputsLimit,
) -> Result<Selection, InputSelectionError> {
    prepare_inputs_with_config(
        entries,
        threshold,
        &SelectionConfig {
            max_inputs: limit,
            ..SelectionConfig::default()
        },
    )
}

pub fn prepare_inputs_with_config(
    entries: &[AddressEntry],
    threshold: u64,
    config: &SelectionConfig,
) -> Result<Selection, InputSelectionError> {
    let threshold = Threshold::new(threshold)?;
    let pool = AddressPool::from_entries(
        entries
            .iter()
            .filter(|entry| !entry.spend_status.is_spent() && entry.balance > 0)
            .cloned(),
    );
    ensure_pool_covers(&pool, threshold)?;

    greedy::select_with_call_budget(
        &pool_inputs(&pool),
        threshold.get(),
        config.max_inputs,
        config.max_subset_sum_calls,
    )
}

/// Filter the pool against `history` and the node's ledger view, then select inputs.
///
/// Fails with the error of the first filter stage that leaves less than `threshold`.
pub async fn get_inputs<P: NodeApi>(
    provider: &P,
    entries: &[AddressEntry],
    history: &[TransactionRecord],
    threshold: u64,
    config: &SelectionConfig,
) -> Result<Selection, InputSelectionError> {
    let threshold = Threshold::new(threshold)?;
    let pool = AddressPool::from_entries(entries.iter().cloned());
    ensure_pool_covers(&pool, threshold)?;

    let safe = AddressSafetyFilter::new(provider)
        .filter(pool, history, threshold)
        .await?;
    info!(
        addresses = safe.len(),
        %threshold,
        limit = %config.max_inputs,
        "selecting inputs from filtered pool"
    );

    greedy::select_with_call_budget(
        &pool_inputs(&safe),
        threshold.get(),
        config.max_inputs,
        config.max_subset_sum_calls,
    )
}
