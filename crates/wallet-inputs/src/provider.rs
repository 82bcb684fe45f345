use serde::{Deserialize, Serialize};

use crate::error::InputSelectionError;
use crate::types::Hash81;

/// Consensus view reported by a node's `getNodeInfo` command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub latest_milestone: Hash81,
    pub latest_milestone_index: u64,
    pub latest_solid_subtangle_milestone: Hash81,
    pub latest_solid_subtangle_milestone_index: u64,
}

/// Ledger queries the selection pipeline and the sync check depend on.
///
/// Implemented by the network layer; the core only consumes the result shapes. Every
/// list-returning call must answer in the order of the request.
#[allow(async_fn_in_trait)]
pub trait NodeApi {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn get_node_info(&self) -> Result<NodeInfo, Self::Error>;

    /// Raw transaction trytes for each hash.
    async fn get_trytes(&self, hashes: &[Hash81]) -> Result<Vec<String>, Self::Error>;

    /// Confirmed balance for each address.
    async fn get_balances(&self, addresses: &[Hash81]) -> Result<Vec<u64>, Self::Error>;

    /// Whether each address has ever been used as a bundle input on the ledger.
    async fn were_addresses_spent_from(
        &self,
        addresses: &[Hash81],
    ) -> Result<Vec<bool>, Self::Error>;
}

/// Fail when a list response does not line up with its request.
pub(crate) fn ensure_response_len<T>(
    command: &str,
    requested: usize,
    response: &[T],
) -> Result<(), InputSelectionError> {
    if response.len() == requested {
        return Ok(());
    }

    Err(InputSelectionError::InvalidProviderResponse(format!(
        "{command} returned {} entries for {requested} requested",
        response.len()
    )))
}

#[cfg(test)]
pub(crate) mod mock {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("mock node failure: {0}")]
    pub(crate) struct MockNodeError(pub(crate) String);

    /// In-memory node answering from fixed tables and recording which calls were made.
    #[derive(Default)]
    pub(crate) struct MockNode {
        pub(crate) node_info: Option<NodeInfo>,
        pub(crate) trytes: HashMap<Hash81, String>,
        pub(crate) balances: HashMap<Hash81, u64>,
        pub(crate) spent: HashMap<Hash81, bool>,
        pub(crate) calls: RefCell<Vec<&'static str>>,
    }

    impl MockNode {
        pub(crate) fn calls(&self) -> Vec<&'static str> {
            self.calls.borrow().clone()
        }
    }

    impl NodeApi for MockNode {
        type Error = MockNodeError;

        async fn get_node_info(&self) -> Result<NodeInfo, Self::Error> {
            self.calls.borrow_mut().push("getNodeInfo");
            self.node_info
                .clone()
                .ok_or_else(|| MockNodeError("node info unavailable".to_string()))
        }

        async fn get_trytes(&self, hashes: &[Hash81]) -> Result<Vec<String>, Self::Error> {
            self.calls.borrow_mut().push("getTrytes");
            hashes
                .iter()
                .map(|hash| {
                    self.trytes
                        .get(hash)
                        .cloned()
                        .ok_or_else(|| MockNodeError(format!("unknown transaction {hash}")))
                })
                .collect()
        }

        async fn get_balances(&self, addresses: &[Hash81]) -> Result<Vec<u64>, Self::Error> {
            self.calls.borrow_mut().push("getBalances");
            Ok(addresses
                .iter()
                .map(|address| self.balances.get(address).copied().unwrap_or(0))
                .collect())
        }

        async fn were_addresses_spent_from(
            &self,
            addresses: &[Hash81],
        ) -> Result<Vec<bool>, Self::Error> {
            self.calls.borrow_mut().push("wereAddressesSpentFrom");
            Ok(addresses
                .iter()
                .map(|address| self.spent.get(address).copied().unwrap_or(false))
                .collect())
        }
    }
}
