//! Node trust check based on milestone convergence and freshness.
//!
//! A node is trusted when its latest milestone and latest solid subtangle milestone agree (or
//! the solid one trails by exactly one index) and the latest milestone was issued recently.
//! Structural problems are errors; a converged node with a stale milestone is a `false`
//! verdict. Nothing is cached between checks.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::config::DEFAULT_SYNC_FRESHNESS;
use crate::error::InputSelectionError;
use crate::provider::{NodeApi, NodeInfo, ensure_response_len};
use crate::trytes::TransactionObject;

/// Verify that the reported milestones describe a converged node.
pub fn check_convergence(info: &NodeInfo) -> Result<(), InputSelectionError> {
    if info.latest_milestone.is_empty_sentinel()
        || info.latest_solid_subtangle_milestone.is_empty_sentinel()
    {
        return Err(InputSelectionError::NodeNotSynced(
            "node reports no milestone yet".to_string(),
        ));
    }

    let index_diff = info
        .latest_milestone_index
        .checked_sub(info.latest_solid_subtangle_milestone_index)
        .ok_or_else(|| {
            InputSelectionError::NodeNotSynced(format!(
                "solid milestone {} is ahead of latest milestone {}",
                info.latest_solid_subtangle_milestone_index, info.latest_milestone_index
            ))
        })?;

    let hashes_agree = info.latest_milestone == info.latest_solid_subtangle_milestone;
    match index_diff {
        0 if hashes_agree => Ok(()),
        1 => Ok(()),
        0 => Err(InputSelectionError::NodeNotSynced(format!(
            "milestone {} and solid milestone {} differ at index {}",
            info.latest_milestone,
            info.latest_solid_subtangle_milestone,
            info.latest_milestone_index
        ))),
        gap => Err(InputSelectionError::NodeNotSynced(format!(
            "solid milestone trails latest milestone by {gap} indexes"
        ))),
    }
}

fn milestone_age(now: SystemTime, timestamp: u64) -> Duration {
    let now_secs = now
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    Duration::from_secs(now_secs.saturating_sub(timestamp))
}

/// Checks one node's sync state.
pub struct NodeSyncValidator<'a, P> {
    provider: &'a P,
    freshness: Duration,
}

impl<'a, P: NodeApi> NodeSyncValidator<'a, P> {
    pub const fn new(provider: &'a P) -> Self {
        Self {
            provider,
            freshness: DEFAULT_SYNC_FRESHNESS,
        }
    }

    #[must_use]
    pub const fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub async fn is_synced(&self) -> Result<bool, InputSelectionError> {
        self.is_synced_at(SystemTime::now()).await
    }

    /// [`Self::is_synced`] measured against an explicit clock reading.
    pub async fn is_synced_at(&self, now: SystemTime) -> Result<bool, InputSelectionError> {
        let info = self
            .provider
            .get_node_info()
            .await
            .map_err(InputSelectionError::provider)?;
        check_convergence(&info)?;

        let hashes = [info.latest_milestone.clone()];
        let trytes = self
            .provider
            .get_trytes(&hashes)
            .await
            .map_err(InputSelectionError::provider)?;
        ensure_response_len("getTrytes", hashes.len(), &trytes)?;

        let milestone = TransactionObject::from_trytes(&trytes[0])?;
        let age = milestone_age(now, milestone.timestamp);
        let synced = age < self.freshness;

        debug!(
            milestone_index = info.latest_milestone_index,
            age_secs = age.as_secs(),
            synced,
            "checked latest milestone freshness"
        );
        if !synced {
            info!(
                milestone = %info.latest_milestone,
                age_secs = age.as_secs(),
                "latest milestone is stale"
            );
        }

        Ok(synced)
    }

    /// Like [`Self::is_synced`], with a stale milestone reported as `NodeNotSynced`.
    pub async fn ensure_synced(&self) -> Result<(), InputSelectionError> {
        if self.is_synced().await? {
            return Ok(());
        }
        Err(InputSelectionError::NodeNotSynced(format!(
            "latest milestone older than {}s",
            self.freshness.as_secs()
        )))
    }
}

/// Check `provider` with the default freshness window.
pub async fn is_synced<P: NodeApi>(provider: &P) -> Result<bool, InputSelectionError> {
    NodeSyncValidator::new(provider).is_synced().await
}

/// Fail unless `provider` is synced under the default freshness window.
pub async fn ensure_synced<P: NodeApi>(provider: &P) -> Result<(), InputSelectionError> {
    NodeSyncValidator::new(provider).ensure_synced().await
}
