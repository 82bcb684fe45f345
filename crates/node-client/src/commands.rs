//! Request and response bodies of the node command API.

use serde::{Deserialize, Serialize};
use wallet_inputs::Hash81;

use crate::error::NodeClientError;

/// Confirmation threshold, in percent, for balances returned by `getBalances`.
pub const BALANCE_CONFIRMATION_THRESHOLD: u8 = 100;

/// Body of one command POST.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum NodeCommand<'a> {
    GetNodeInfo,
    GetTrytes {
        hashes: &'a [Hash81],
    },
    GetBalances {
        addresses: &'a [Hash81],
        threshold: u8,
    },
    WereAddressesSpentFrom {
        addresses: &'a [Hash81],
    },
}

impl NodeCommand<'_> {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetNodeInfo => "getNodeInfo",
            Self::GetTrytes { .. } => "getTrytes",
            Self::GetBalances { .. } => "getBalances",
            Self::WereAddressesSpentFrom { .. } => "wereAddressesSpentFrom",
        }
    }

    /// Number of list entries the response must carry, if any.
    #[must_use]
    pub const fn expected_len(&self) -> Option<usize> {
        match self {
            Self::GetNodeInfo => None,
            Self::GetTrytes { hashes } => Some(hashes.len()),
            Self::GetBalances { addresses, .. } | Self::WereAddressesSpentFrom { addresses } => {
                Some(addresses.len())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TrytesResponse {
    pub trytes: Vec<String>,
}

/// Balances arrive as decimal strings.
#[derive(Debug, Deserialize)]
pub struct BalancesResponse {
    pub balances: Vec<String>,
}

impl BalancesResponse {
    pub fn parse_balances(&self) -> Result<Vec<u64>, NodeClientError> {
        self.balances
            .iter()
            .map(|balance| {
                balance
                    .parse::<u64>()
                    .map_err(|e| NodeClientError::Deserialize {
                        command: "getBalances",
                        message: format!("invalid balance '{balance}': {e}"),
                    })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct SpentStatesResponse {
    pub states: Vec<bool>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(alias = "exception")]
    pub error: String,
}
