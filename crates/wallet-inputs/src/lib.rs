#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![cfg_attr(
    test,
    allow(clippy::needless_pass_by_value, clippy::too_many_lines)
)]

//! Wallet-side input selection for a tryte-encoded value ledger.
//!
//! Filters an address pool down to addresses that are safe to spend from, selects inputs
//! covering a transfer value under an input-count cap, and decides whether a node is synced
//! enough to trust its balances.

pub mod balance;
pub mod config;
pub mod error;
pub mod provider;
pub mod safety;
pub mod selection;
pub mod sync;
pub mod trytes;
pub mod types;

#[cfg(test)]
mod test_setup;

pub use balance::{AddressPool, accumulate_balance};
pub use config::SelectionConfig;
pub use error::InputSelectionError;
pub use provider::{NodeApi, NodeInfo};
pub use safety::{AddressSafetyFilter, FilterStage};
pub use selection::greedy::select;
pub use selection::subset_sum::{SubsetSumReport, solve};
pub use selection::{get_inputs, prepare_inputs, prepare_inputs_with_config};
pub use sync::{NodeSyncValidator, ensure_synced, is_synced};
pub use types::{
    AddressEntry, Hash81, Input, InputsLimit, RawInput, SecurityLevel, Selection, SpendStatus,
    Threshold, TransactionRecord, is_valid_input,
};
