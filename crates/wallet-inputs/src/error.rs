use thiserror::Error;

/// Boxed failure reported by a [`NodeApi`](crate::NodeApi) collaborator.
pub type ProviderFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum InputSelectionError {
    #[error("Inputs threshold cannot be zero")]
    ZeroThreshold,

    #[error("Invalid inputs limit: {0} (must be a non-negative integer)")]
    InvalidLimit(i64),

    #[error("Insufficient balance: available {available}, threshold {threshold}")]
    InsufficientBalance { available: u64, threshold: u64 },

    #[error(
        "Incoming transfers pending: {available} spendable after excluding unconfirmed receives, threshold {threshold}"
    )]
    IncomingTransfersPending { available: u64, threshold: u64 },

    #[error(
        "Pending outgoing transfers: {available} spendable after excluding addresses in unconfirmed bundles, threshold {threshold}"
    )]
    PendingOutgoingTransfers { available: u64, threshold: u64 },

    #[error(
        "Funds at spent addresses: {available} spendable after excluding spent addresses, threshold {threshold}"
    )]
    FundsAtSpentAddresses { available: u64, threshold: u64 },

    #[error("Cannot reach threshold {threshold} within {limit} inputs")]
    CannotMeetLimit { threshold: u64, limit: usize },

    #[error("Selection invariant violated: {0}")]
    SelectionInvariantViolation(String),

    #[error("Node not synced: {0}")]
    NodeNotSynced(String),

    #[error("Balance overflow while {0}")]
    BalanceOverflow(String),

    #[error("Invalid hash '{0}': expected 81 trytes")]
    InvalidHash(String),

    #[error("Invalid security level: {0} (expected 1, 2 or 3)")]
    InvalidSecurityLevel(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid trytes: {0}")]
    InvalidTrytes(String),

    #[error("Invalid node response: {0}")]
    InvalidProviderResponse(String),

    #[error("Node request failed: {0}")]
    Provider(#[source] ProviderFailure),
}

impl InputSelectionError {
    /// Wrap a collaborator error without losing its source chain.
    pub fn provider<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Provider(Box::new(error))
    }

    /// Whether the error reports funds being temporarily unusable rather than missing.
    ///
    /// Pending transfers clear once the ledger confirms them; every other kind needs caller action.
    #[must_use]
    pub const fn is_pending_transfer(&self) -> bool {
        matches!(
            self,
            Self::IncomingTransfersPending { .. } | Self::PendingOutgoingTransfers { .. }
        )
    }
}
