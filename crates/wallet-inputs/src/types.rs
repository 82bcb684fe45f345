//! Typed records for the address pool, selected inputs and the wallet's transfer history.
//!
//! Everything crossing the crate boundary is validated once here: hashes must be 81 trytes,
//! security levels must be 1-3, thresholds must be positive and input limits non-negative.

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputSelectionError;

/// Number of trytes in an address, bundle or transaction hash.
pub const HASH_TRYTES: usize = 81;

/// Tryte alphabet in value order: `9` is zero, `A..M` are 1..13, `N..Z` are -13..-1.
pub const TRYTE_ALPHABET: &[u8; 27] = b"9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Whether every byte of `value` belongs to the tryte alphabet.
#[must_use]
pub fn is_trytes(value: &str) -> bool {
    value
        .bytes()
        .all(|byte| byte == b'9' || byte.is_ascii_uppercase())
}

/// An 81-tryte hash: address, bundle hash, milestone or transaction hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hash81(String);

impl Hash81 {
    /// The all-`9` hash a node reports before it has seen any milestone.
    #[must_use]
    pub fn empty() -> Self {
        Self("9".repeat(HASH_TRYTES))
    }

    #[must_use]
    pub fn is_empty_sentinel(&self) -> bool {
        self.0.bytes().all(|byte| byte == b'9')
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Hash81 {
    type Err = InputSelectionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.len() != HASH_TRYTES || !is_trytes(value) {
            return Err(InputSelectionError::InvalidHash(value.to_string()));
        }

        Ok(Self(value.to_string()))
    }
}

impl TryFrom<String> for Hash81 {
    type Error = InputSelectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Hash81> for String {
    fn from(value: Hash81) -> Self {
        value.0
    }
}

impl fmt::Display for Hash81 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signature security level of an address (number of key fragments).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SecurityLevel {
    Low = 1,
    #[default]
    Medium = 2,
    High = 3,
}

impl TryFrom<i64> for SecurityLevel {
    type Error = InputSelectionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            other => Err(InputSelectionError::InvalidSecurityLevel(other)),
        }
    }
}

impl TryFrom<u8> for SecurityLevel {
    type Error = InputSelectionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(value))
    }
}

impl From<SecurityLevel> for u8 {
    fn from(value: SecurityLevel) -> Self {
        value as u8
    }
}

/// Spend knowledge for one address.
///
/// `local` comes from the wallet's own bundle history, `remote` from a ledger snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendStatus {
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub remote: bool,
}

impl SpendStatus {
    #[must_use]
    pub const fn is_spent(&self) -> bool {
        self.local || self.remote
    }
}

/// One cached wallet address as supplied by the storage layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressEntry {
    pub address: Hash81,
    pub key_index: u32,
    #[serde(default)]
    pub security: SecurityLevel,
    pub balance: u64,
    #[serde(default)]
    pub spend_status: SpendStatus,
}

/// An address selected (or selectable) to fund a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub address: Hash81,
    pub balance: u64,
    pub security: SecurityLevel,
    pub key_index: u32,
}

impl From<&AddressEntry> for Input {
    fn from(entry: &AddressEntry) -> Self {
        Self {
            address: entry.address.clone(),
            balance: entry.balance,
            security: entry.security,
            key_index: entry.key_index,
        }
    }
}

/// Untrusted input shape as received from callers (JSON), before validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInput {
    pub address: String,
    pub balance: i64,
    pub security: i64,
    pub key_index: i64,
}

impl TryFrom<&RawInput> for Input {
    type Error = InputSelectionError;

    fn try_from(raw: &RawInput) -> Result<Self, Self::Error> {
        let address = raw.address.parse::<Hash81>()?;
        let balance = u64::try_from(raw.balance).map_err(|_| {
            InputSelectionError::InvalidInput(format!("negative balance {}", raw.balance))
        })?;
        let security = SecurityLevel::try_from(raw.security)?;
        let key_index = u32::try_from(raw.key_index).map_err(|_| {
            InputSelectionError::InvalidInput(format!("key index {} out of range", raw.key_index))
        })?;

        Ok(Self {
            address,
            balance,
            security,
            key_index,
        })
    }
}

/// Structural check of an untrusted input: 81-tryte address, non-negative balance,
/// security level 1-3 and a non-negative key index.
#[must_use]
pub fn is_valid_input(input: &RawInput) -> bool {
    Input::try_from(input).is_ok()
}

/// One transaction of the wallet's known history, reduced to what the safety filters need.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub address: Hash81,
    /// Negative for bundle inputs, positive for receives, zero for data-only transactions.
    pub transfer_value: i64,
    pub bundle_hash: Hash81,
    /// `true` once the bundle is confirmed.
    pub persistence: bool,
    #[serde(default)]
    pub attachment_timestamp: u64,
}

impl TransactionRecord {
    #[must_use]
    pub const fn is_value_transfer(&self) -> bool {
        self.transfer_value != 0
    }

    #[must_use]
    pub const fn is_input(&self) -> bool {
        self.transfer_value < 0
    }

    #[must_use]
    pub const fn is_receive(&self) -> bool {
        self.transfer_value > 0
    }
}

/// Target payment value; always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Threshold(NonZeroU64);

impl Threshold {
    pub fn new(value: u64) -> Result<Self, InputSelectionError> {
        NonZeroU64::new(value)
            .map(Self)
            .ok_or(InputSelectionError::ZeroThreshold)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cap on the number of selected inputs; zero means unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InputsLimit(usize);

impl InputsLimit {
    #[must_use]
    pub const fn unlimited() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self(limit)
    }

    #[must_use]
    pub const fn is_unlimited(self) -> bool {
        self.0 == 0
    }

    /// Raw cap, `0` meaning unlimited.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Whether a selection of `count` inputs respects the cap.
    #[must_use]
    pub const fn admits(self, count: usize) -> bool {
        self.0 == 0 || count <= self.0
    }
}

impl TryFrom<i64> for InputsLimit {
    type Error = InputSelectionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .map(Self)
            .map_err(|_| InputSelectionError::InvalidLimit(value))
    }
}

impl fmt::Display for InputsLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() {
            f.write_str("unlimited")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Inputs chosen to fund a transfer and their combined balance.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub inputs: Vec<Input>,
    pub balance: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(fill: char) -> String {
        std::iter::repeat_n(fill, HASH_TRYTES).collect()
    }

    fn raw_input(key_index: i64) -> RawInput {
        RawInput {
            address: address('A'),
            balance: 5,
            security: 2,
            key_index,
        }
    }

    #[test]
    fn valid_input_is_accepted() {
        assert!(is_valid_input(&raw_input(0)));
    }

    #[test]
    fn negative_key_index_is_rejected() {
        assert!(!is_valid_input(&raw_input(-1)));
    }

    #[test]
    fn malformed_address_is_rejected() {
        let mut input = raw_input(0);
        input.address = "abc".to_string();
        assert!(!is_valid_input(&input));

        input.address = format!("{}a", &address('B')[..80]);
        assert!(!is_valid_input(&input));
    }

    #[test]
    fn security_level_out_of_range_is_rejected() {
        let mut input = raw_input(0);
        input.security = 4;
        assert!(!is_valid_input(&input));

        let err = SecurityLevel::try_from(0_i64).expect_err("zero security");
        assert!(matches!(err, InputSelectionError::InvalidSecurityLevel(0)));
    }

    #[test]
    fn empty_sentinel_is_detected() {
        assert!(Hash81::empty().is_empty_sentinel());
        let hash: Hash81 = address('Z').parse().expect("valid hash");
        assert!(!hash.is_empty_sentinel());
    }

    #[test]
    fn zero_threshold_is_rejected() {
        assert!(matches!(
            Threshold::new(0),
            Err(InputSelectionError::ZeroThreshold)
        ));
        assert_eq!(Threshold::new(7).expect("positive").get(), 7);
    }

    #[test]
    fn negative_limit_is_rejected() {
        let err = InputsLimit::try_from(-3_i64).expect_err("negative limit");
        assert!(matches!(err, InputSelectionError::InvalidLimit(-3)));

        let unlimited = InputsLimit::try_from(0_i64).expect("zero limit");
        assert!(unlimited.is_unlimited());
        assert!(unlimited.admits(1_000));
        assert!(InputsLimit::new(2).admits(2));
        assert!(!InputsLimit::new(2).admits(3));
    }

    #[test]
    fn address_entry_deserializes_from_storage_json() {
        let json = format!(
            r#"{{"address":"{}","keyIndex":4,"security":3,"balance":120,"spendStatus":{{"local":false,"remote":true}}}}"#,
            address('C')
        );
        let entry: AddressEntry = serde_json::from_str(&json).expect("entry");

        assert_eq!(entry.key_index, 4);
        assert_eq!(entry.security, SecurityLevel::High);
        assert!(entry.spend_status.is_spent());
    }

    #[test]
    fn address_entry_defaults_security_and_spend_status() {
        let json = format!(
            r#"{{"address":"{}","keyIndex":0,"balance":1}}"#,
            address('D')
        );
        let entry: AddressEntry = serde_json::from_str(&json).expect("entry");

        assert_eq!(entry.security, SecurityLevel::Medium);
        assert!(!entry.spend_status.is_spent());
    }
}
