//! Removal of addresses that are unsafe to spend from.
//!
//! Three ordered stages run over the address pool, each re-checking that what is left still
//! covers the threshold and failing with a stage-specific error otherwise:
//! 1. pending incoming: addresses credited by an unconfirmed bundle that is still funded
//! 2. pending outgoing: addresses already used as inputs of an unconfirmed bundle
//! 3. spent: addresses the wallet or the ledger knows to have been spent from, including
//!    inputs of confirmed bundles
//!
//! Only stages 1 and 3 talk to the node, and only when local history cannot settle the answer.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use crate::balance::AddressPool;
use crate::error::InputSelectionError;
use crate::provider::{NodeApi, ensure_response_len};
use crate::types::{Hash81, Threshold, TransactionRecord};

/// Stage of the safety pipeline, used to explain why funds fell short.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterStage {
    PendingIncoming,
    PendingOutgoing,
    Spent,
}

impl FilterStage {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PendingIncoming => "pending_incoming",
            Self::PendingOutgoing => "pending_outgoing",
            Self::Spent => "spent",
        }
    }

    const fn insufficient(self, available: u64, threshold: u64) -> InputSelectionError {
        match self {
            Self::PendingIncoming => InputSelectionError::IncomingTransfersPending {
                available,
                threshold,
            },
            Self::PendingOutgoing => InputSelectionError::PendingOutgoingTransfers {
                available,
                threshold,
            },
            Self::Spent => InputSelectionError::FundsAtSpentAddresses {
                available,
                threshold,
            },
        }
    }
}

fn ensure_sufficient(
    pool: &AddressPool,
    threshold: Threshold,
    stage: FilterStage,
) -> Result<(), InputSelectionError> {
    let available = pool.total_balance()?;
    if available < threshold.get() {
        return Err(stage.insufficient(available, threshold.get()));
    }

    Ok(())
}

fn exclude_and_check(
    mut pool: AddressPool,
    excluded: &HashSet<Hash81>,
    threshold: Threshold,
    stage: FilterStage,
) -> Result<AddressPool, InputSelectionError> {
    let removed = pool.exclude(excluded);
    if removed > 0 {
        info!(
            stage = stage.label(),
            removed,
            remaining = pool.len(),
            "excluded addresses from input pool"
        );
    }

    ensure_sufficient(&pool, threshold, stage)?;
    Ok(pool)
}

/// Bundles with at least one confirmed attachment.
///
/// Reattachments share the bundle hash, so one confirmed record settles every record of the
/// bundle regardless of its own inclusion state.
fn confirmed_bundles(history: &[TransactionRecord]) -> HashSet<&Hash81> {
    history
        .iter()
        .filter(|transaction| transaction.persistence)
        .map(|transaction| &transaction.bundle_hash)
        .collect()
}

/// Unconfirmed value transactions grouped by bundle hash.
fn pending_value_bundles(
    history: &[TransactionRecord],
) -> BTreeMap<&Hash81, Vec<&TransactionRecord>> {
    let confirmed = confirmed_bundles(history);
    let mut bundles: BTreeMap<&Hash81, Vec<&TransactionRecord>> = BTreeMap::new();
    for transaction in history.iter().filter(|transaction| {
        transaction.is_value_transfer() && !confirmed.contains(&transaction.bundle_hash)
    }) {
        bundles
            .entry(&transaction.bundle_hash)
            .or_default()
            .push(transaction);
    }
    bundles
}

/// Value each known input address spends within one bundle.
fn bundle_spends(
    transactions: &[&TransactionRecord],
) -> Result<BTreeMap<Hash81, u64>, InputSelectionError> {
    let mut spends = BTreeMap::new();
    for transaction in transactions.iter().filter(|transaction| transaction.is_input()) {
        let spent = spends.entry(transaction.address.clone()).or_insert(0u64);
        *spent = spent
            .checked_add(transaction.transfer_value.unsigned_abs())
            .ok_or_else(|| {
                InputSelectionError::BalanceOverflow(format!(
                    "summing inputs of bundle {}",
                    transaction.bundle_hash
                ))
            })?;
    }
    Ok(spends)
}

/// Remove addresses used as inputs of unconfirmed bundles.
pub fn remove_pending_outgoing(
    pool: AddressPool,
    history: &[TransactionRecord],
    threshold: Threshold,
) -> Result<AddressPool, InputSelectionError> {
    let confirmed = confirmed_bundles(history);
    let excluded = history
        .iter()
        .filter(|transaction| {
            transaction.is_input() && !confirmed.contains(&transaction.bundle_hash)
        })
        .map(|transaction| transaction.address.clone())
        .collect::<HashSet<_>>();

    exclude_and_check(pool, &excluded, threshold, FilterStage::PendingOutgoing)
}

/// Runs the safety stages against one node.
pub struct AddressSafetyFilter<'a, P> {
    provider: &'a P,
}

impl<'a, P: NodeApi> AddressSafetyFilter<'a, P> {
    pub const fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Run all three stages in order; the first stage leaving too little balance fails the call.
    pub async fn filter(
        &self,
        pool: AddressPool,
        history: &[TransactionRecord],
        threshold: Threshold,
    ) -> Result<AddressPool, InputSelectionError> {
        let pool = self
            .remove_pending_incoming(pool, history, threshold)
            .await?;
        let pool = remove_pending_outgoing(pool, history, threshold)?;
        self.remove_spent(pool, history, threshold).await
    }

    /// Remove addresses credited by unconfirmed bundles that may still confirm.
    ///
    /// A pending bundle is ignored when one of its known inputs no longer holds the value it
    /// spends on the ledger: such a bundle can never confirm.
    pub async fn remove_pending_incoming(
        &self,
        pool: AddressPool,
        history: &[TransactionRecord],
        threshold: Threshold,
    ) -> Result<AddressPool, InputSelectionError> {
        let pending = pending_value_bundles(history);
        let receiving = pending
            .into_iter()
            .filter(|(_, transactions)| {
                transactions
                    .iter()
                    .filter(|transaction| transaction.is_receive())
                    .any(|transaction| pool.contains(&transaction.address))
            })
            .collect::<Vec<_>>();

        let mut excluded = HashSet::new();
        if !receiving.is_empty() {
            let funded = self.funded_bundles(&receiving).await?;
            for (bundle, transactions) in &receiving {
                if !funded.contains(*bundle) {
                    debug!(%bundle, "ignoring pending bundle with unfunded inputs");
                    continue;
                }
                excluded.extend(
                    transactions
                        .iter()
                        .filter(|transaction| transaction.is_receive())
                        .map(|transaction| transaction.address.clone()),
                );
            }
        }

        exclude_and_check(pool, &excluded, threshold, FilterStage::PendingIncoming)
    }

    /// Bundle hashes whose known inputs are all still covered by their ledger balance.
    async fn funded_bundles(
        &self,
        bundles: &[(&Hash81, Vec<&TransactionRecord>)],
    ) -> Result<HashSet<Hash81>, InputSelectionError> {
        let spends = bundles
            .iter()
            .map(|(bundle, transactions)| Ok((*bundle, bundle_spends(transactions)?)))
            .collect::<Result<Vec<_>, InputSelectionError>>()?;

        let input_addresses = spends
            .iter()
            .flat_map(|(_, per_address)| per_address.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        let balances = if input_addresses.is_empty() {
            HashMap::new()
        } else {
            let balances = self
                .provider
                .get_balances(&input_addresses)
                .await
                .map_err(InputSelectionError::provider)?;
            ensure_response_len("getBalances", input_addresses.len(), &balances)?;
            input_addresses.into_iter().zip(balances).collect::<HashMap<_, _>>()
        };

        Ok(spends
            .into_iter()
            .filter(|(_, per_address)| {
                per_address.iter().all(|(address, spent)| {
                    balances.get(address).copied().unwrap_or(0) >= *spent
                })
            })
            .map(|(bundle, _)| bundle.clone())
            .collect())
    }

    /// Remove addresses known to be spent, asking the node only about those local knowledge
    /// does not settle.
    pub async fn remove_spent(
        &self,
        pool: AddressPool,
        history: &[TransactionRecord],
        threshold: Threshold,
    ) -> Result<AddressPool, InputSelectionError> {
        let confirmed = confirmed_bundles(history);
        let used_as_input = history
            .iter()
            .filter(|transaction| {
                transaction.is_input() && confirmed.contains(&transaction.bundle_hash)
            })
            .map(|transaction| &transaction.address)
            .collect::<HashSet<_>>();

        let mut excluded = HashSet::new();
        let mut unresolved = Vec::new();
        for entry in pool.entries() {
            if entry.spend_status.is_spent() || used_as_input.contains(&entry.address) {
                excluded.insert(entry.address.clone());
            } else if entry.balance > 0 {
                unresolved.push(entry.address.clone());
            }
        }

        if !unresolved.is_empty() {
            let states = self
                .provider
                .were_addresses_spent_from(&unresolved)
                .await
                .map_err(InputSelectionError::provider)?;
            ensure_response_len("wereAddressesSpentFrom", unresolved.len(), &states)?;
            excluded.extend(
                unresolved
                    .into_iter()
                    .zip(states)
                    .filter_map(|(address, spent)| spent.then_some(address)),
            );
        }

        exclude_and_check(pool, &excluded, threshold, FilterStage::Spent)
    }
}
