use std::collections::HashSet;

use tracing::warn;

use crate::error::InputSelectionError;
use crate::types::{AddressEntry, Hash81, Input};

/// Sum balances with overflow protection.
pub fn accumulate_balance<I>(balances: I) -> Result<u64, InputSelectionError>
where
    I: IntoIterator<Item = u64>,
{
    balances.into_iter().try_fold(0u64, |total, balance| {
        total.checked_add(balance).ok_or_else(|| {
            InputSelectionError::BalanceOverflow("aggregating address balances".to_string())
        })
    })
}

/// Sum the balances of a slice of inputs.
pub fn inputs_balance(inputs: &[Input]) -> Result<u64, InputSelectionError> {
    accumulate_balance(inputs.iter().map(|input| input.balance))
}

/// Address entries keyed by address, in the order the storage layer supplied them.
///
/// Pool order is significant: selection tie-breaks fall back to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressPool {
    entries: Vec<AddressEntry>,
}

impl AddressPool {
    /// Build a pool, keeping the first entry of any duplicated address.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = AddressEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::new();

        for entry in entries {
            if seen.insert(entry.address.clone()) {
                kept.push(entry);
            } else {
                warn!(address = %entry.address, "dropping duplicate address entry from pool");
            }
        }

        Self { entries: kept }
    }

    #[must_use]
    pub fn entries(&self) -> &[AddressEntry] {
        &self.entries
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_balance(&self) -> Result<u64, InputSelectionError> {
        accumulate_balance(self.entries.iter().map(|entry| entry.balance))
    }

    #[must_use]
    pub fn contains(&self, address: &Hash81) -> bool {
        self.entries.iter().any(|entry| &entry.address == address)
    }

    /// Drop every entry whose address is in `excluded`; returns how many were removed.
    pub fn exclude(&mut self, excluded: &HashSet<Hash81>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !excluded.contains(&entry.address));
        before - self.entries.len()
    }
}
