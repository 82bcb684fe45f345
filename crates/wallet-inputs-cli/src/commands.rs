use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use node_client::HttpNodeClient;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;
use wallet_inputs::{
    AddressEntry, Input, InputSelectionError, InputsLimit, NodeSyncValidator, RawInput,
    TransactionRecord, get_inputs, prepare_inputs_with_config,
};

use crate::config::CliConfig;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether the configured node is synced
    SyncStatus,
    /// Select inputs from a local address snapshot, without contacting a node
    PrepareInputs {
        /// JSON file holding an array of address entries
        #[arg(long = "addresses")]
        addresses: PathBuf,
        /// Value the selected inputs must cover
        #[arg(long = "threshold")]
        threshold: u64,
        /// Maximum number of inputs (0 = unlimited)
        #[arg(long = "limit", allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// Filter addresses against history and the node, then select inputs
    GetInputs {
        /// JSON file holding an array of address entries
        #[arg(long = "addresses")]
        addresses: PathBuf,
        /// JSON file holding the wallet's transaction history
        #[arg(long = "history")]
        history: PathBuf,
        /// Value the selected inputs must cover
        #[arg(long = "threshold")]
        threshold: u64,
        /// Maximum number of inputs (0 = unlimited)
        #[arg(long = "limit", allow_negative_numbers = true)]
        limit: Option<i64>,
        /// Trust the node without checking its milestones first
        #[arg(long = "skip-sync-check")]
        skip_sync_check: bool,
    },
    /// Check an input object given as JSON
    ValidateInput {
        /// Input as JSON: {"address", "balance", "security", "keyIndex"}
        #[arg(long = "input")]
        input: String,
    },
}

#[derive(Serialize)]
struct SyncStatusOutput {
    synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Serialize)]
struct ValidateInputOutput {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl Command {
    pub async fn handle(self, config: &CliConfig) -> Result<()> {
        match self {
            Self::SyncStatus => {
                let client = node_client(config)?;
                let verdict = NodeSyncValidator::new(&client)
                    .with_freshness(config.sync_freshness())
                    .is_synced()
                    .await;

                let output = match verdict {
                    Ok(synced) => SyncStatusOutput {
                        synced,
                        reason: None,
                    },
                    Err(err @ InputSelectionError::NodeNotSynced(_)) => SyncStatusOutput {
                        synced: false,
                        reason: Some(err.to_string()),
                    },
                    Err(err) => return Err(err).context("failed to query node sync status"),
                };
                print_json(&output)
            }
            Self::PrepareInputs {
                addresses,
                threshold,
                limit,
            } => {
                let entries: Vec<AddressEntry> = read_json_file(&addresses)?;
                let selection_config = config.selection(parse_limit(limit)?)?;

                let selection = prepare_inputs_with_config(&entries, threshold, &selection_config)
                    .context("input preparation failed")?;
                print_json(&selection)
            }
            Self::GetInputs {
                addresses,
                history,
                threshold,
                limit,
                skip_sync_check,
            } => {
                let entries: Vec<AddressEntry> = read_json_file(&addresses)?;
                let history: Vec<TransactionRecord> = read_json_file(&history)?;
                let selection_config = config.selection(parse_limit(limit)?)?;
                let client = node_client(config)?;

                if skip_sync_check {
                    info!("skipping node sync check");
                } else {
                    NodeSyncValidator::new(&client)
                        .with_freshness(selection_config.sync_freshness)
                        .ensure_synced()
                        .await
                        .context("node cannot be trusted for balances")?;
                }

                let selection =
                    get_inputs(&client, &entries, &history, threshold, &selection_config)
                        .await
                        .context("input selection failed")?;
                print_json(&selection)
            }
            Self::ValidateInput { input } => print_json(&validate_input(&input)?),
        }
    }
}

fn validate_input(input: &str) -> Result<ValidateInputOutput> {
    let value: serde_json::Value =
        serde_json::from_str(input).context("--input must be a JSON object")?;

    let checked = serde_json::from_value::<RawInput>(value)
        .map_err(|e| e.to_string())
        .and_then(|raw| Input::try_from(&raw).map_err(|e| e.to_string()));

    Ok(match checked {
        Ok(_) => ValidateInputOutput {
            valid: true,
            reason: None,
        },
        Err(reason) => ValidateInputOutput {
            valid: false,
            reason: Some(reason),
        },
    })
}

fn parse_limit(limit: Option<i64>) -> Result<Option<InputsLimit>> {
    limit
        .map(InputsLimit::try_from)
        .transpose()
        .context("--limit must be zero or positive")
}

fn node_client(config: &CliConfig) -> Result<HttpNodeClient> {
    HttpNodeClient::with_timeout(config.node_url()?, config.request_timeout())
        .context("failed to build node client")
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse '{}'", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}
