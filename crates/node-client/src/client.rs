use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use wallet_inputs::{Hash81, NodeApi, NodeInfo};

use crate::commands::{
    BALANCE_CONFIRMATION_THRESHOLD, BalancesResponse, ErrorResponse, NodeCommand,
    SpentStatesResponse, TrytesResponse,
};
use crate::error::NodeClientError;

pub const API_VERSION_HEADER: &str = "X-IOTA-API-Version";
pub const API_VERSION: &str = "1";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// [`NodeApi`] over a node's JSON command endpoint.
#[derive(Clone, Debug)]
pub struct HttpNodeClient {
    client: reqwest::Client,
    url: Url,
}

impl HttpNodeClient {
    pub fn new(url: Url) -> Result<Self, NodeClientError> {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: Url, timeout: Duration) -> Result<Self, NodeClientError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(NodeClientError::InvalidUrl(format!(
                "unsupported scheme '{}' in {url}",
                url.scheme()
            )));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    async fn command<T: DeserializeOwned>(
        &self,
        command: &NodeCommand<'_>,
    ) -> Result<T, NodeClientError> {
        debug!(command = command.name(), url = %self.url, "sending node command");

        let response = self
            .client
            .post(self.url.clone())
            .header(API_VERSION_HEADER, API_VERSION)
            .json(command)
            .send()
            .await?;

        let status = response.status();
        let url = response.url().to_string();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map_or_else(|_| text.trim().to_string(), |body| body.error);
            return Err(NodeClientError::Rejected {
                status: status.as_u16(),
                url,
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| NodeClientError::Deserialize {
            command: command.name(),
            message: e.to_string(),
        })
    }

    async fn list_command<T: DeserializeOwned>(
        &self,
        command: &NodeCommand<'_>,
        entries: impl Fn(&T) -> usize,
    ) -> Result<T, NodeClientError> {
        let response = self.command::<T>(command).await?;
        if let Some(expected) = command.expected_len() {
            let actual = entries(&response);
            if actual != expected {
                return Err(NodeClientError::UnexpectedResponseLength {
                    command: command.name(),
                    expected,
                    actual,
                });
            }
        }
        Ok(response)
    }
}

impl NodeApi for HttpNodeClient {
    type Error = NodeClientError;

    async fn get_node_info(&self) -> Result<NodeInfo, Self::Error> {
        self.command(&NodeCommand::GetNodeInfo).await
    }

    async fn get_trytes(&self, hashes: &[Hash81]) -> Result<Vec<String>, Self::Error> {
        let response: TrytesResponse = self
            .list_command(&NodeCommand::GetTrytes { hashes }, |r: &TrytesResponse| {
                r.trytes.len()
            })
            .await?;
        Ok(response.trytes)
    }

    async fn get_balances(&self, addresses: &[Hash81]) -> Result<Vec<u64>, Self::Error> {
        let command = NodeCommand::GetBalances {
            addresses,
            threshold: BALANCE_CONFIRMATION_THRESHOLD,
        };
        let response: BalancesResponse = self
            .list_command(&command, |r: &BalancesResponse| r.balances.len())
            .await?;
        response.parse_balances()
    }

    async fn were_addresses_spent_from(
        &self,
        addresses: &[Hash81],
    ) -> Result<Vec<bool>, Self::Error> {
        let response: SpentStatesResponse = self
            .list_command(
                &NodeCommand::WereAddressesSpentFrom { addresses },
                |r: &SpentStatesResponse| r.states.len(),
            )
            .await?;
        Ok(response.states)
    }
}
