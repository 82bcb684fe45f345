//! Decoding of raw transaction trytes.
//!
//! A transaction is 2673 trytes. Integer fields are balanced-ternary, least significant tryte
//! first, each tryte worth `-13..=13` (`9` = 0, `A..M` = 1..13, `N..Z` = -13..-1).
//!
//! ```text
//! offset  len   field
//!      0 2187   signature / message fragment
//!   2187   81   address
//!   2268   27   value
//!   2295   27   obsolete tag
//!   2322    9   timestamp (seconds)
//!   2331    9   current index
//!   2340    9   last index
//!   2349   81   bundle
//!   2430   81   trunk transaction
//!   2511   81   branch transaction
//!   2592   27   tag
//!   2619    9   attachment timestamp (milliseconds)
//!   2628    9   attachment timestamp lower bound
//!   2637    9   attachment timestamp upper bound
//!   2646   27   nonce
//! ```

use std::ops::Range;

use crate::error::InputSelectionError;
use crate::types::{Hash81, TRYTE_ALPHABET, is_trytes};

/// Length of a serialized transaction in trytes.
pub const TRANSACTION_TRYTES: usize = 2673;

const SIGNATURE_MESSAGE_FRAGMENT: Range<usize> = 0..2187;
const ADDRESS: Range<usize> = 2187..2268;
const VALUE: Range<usize> = 2268..2295;
const OBSOLETE_TAG: Range<usize> = 2295..2322;
const TIMESTAMP: Range<usize> = 2322..2331;
const CURRENT_INDEX: Range<usize> = 2331..2340;
const LAST_INDEX: Range<usize> = 2340..2349;
const BUNDLE: Range<usize> = 2349..2430;
const TRUNK_TRANSACTION: Range<usize> = 2430..2511;
const BRANCH_TRANSACTION: Range<usize> = 2511..2592;
const TAG: Range<usize> = 2592..2619;
const ATTACHMENT_TIMESTAMP: Range<usize> = 2619..2628;
const ATTACHMENT_TIMESTAMP_LOWER_BOUND: Range<usize> = 2628..2637;
const ATTACHMENT_TIMESTAMP_UPPER_BOUND: Range<usize> = 2637..2646;
const NONCE: Range<usize> = 2646..2673;

/// Balanced value of one tryte character.
fn tryte_value(tryte: u8) -> Option<i64> {
    let position = TRYTE_ALPHABET.iter().position(|candidate| *candidate == tryte)?;
    let position = i64::try_from(position).ok()?;
    Some(if position > 13 { position - 27 } else { position })
}

/// Decode a little-endian balanced-ternary tryte string into an integer.
pub fn trytes_to_i64(trytes: &str) -> Result<i64, InputSelectionError> {
    trytes.bytes().rev().try_fold(0i64, |acc, tryte| {
        let digit = tryte_value(tryte).ok_or_else(|| {
            InputSelectionError::InvalidTrytes(format!("'{}' is not a tryte", char::from(tryte)))
        })?;
        acc.checked_mul(27)
            .and_then(|shifted| shifted.checked_add(digit))
            .ok_or_else(|| {
                InputSelectionError::InvalidTrytes(format!("integer field '{trytes}' overflows"))
            })
    })
}

/// Encode `value` as exactly `length` little-endian balanced trytes.
pub fn i64_to_trytes(value: i64, length: usize) -> Result<String, InputSelectionError> {
    let mut remaining = i128::from(value);
    let mut encoded = String::with_capacity(length);

    for _ in 0..length {
        let mut digit = remaining.rem_euclid(27);
        if digit > 13 {
            digit -= 27;
        }
        remaining = (remaining - digit) / 27;

        let position = if digit < 0 { digit + 27 } else { digit };
        let index = usize::try_from(position).map_err(|_| {
            InputSelectionError::InvalidTrytes(format!("cannot encode digit {digit}"))
        })?;
        encoded.push(char::from(TRYTE_ALPHABET[index]));
    }

    if remaining != 0 {
        return Err(InputSelectionError::InvalidTrytes(format!(
            "{value} does not fit in {length} trytes"
        )));
    }

    Ok(encoded)
}

/// Decoded view of a raw transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionObject {
    pub signature_message_fragment: String,
    pub address: Hash81,
    pub value: i64,
    pub obsolete_tag: String,
    /// Issuance time in seconds since the Unix epoch.
    pub timestamp: u64,
    pub current_index: u64,
    pub last_index: u64,
    pub bundle: Hash81,
    pub trunk_transaction: Hash81,
    pub branch_transaction: Hash81,
    pub tag: String,
    /// Attachment time in milliseconds since the Unix epoch.
    pub attachment_timestamp: i64,
    pub attachment_timestamp_lower_bound: i64,
    pub attachment_timestamp_upper_bound: i64,
    pub nonce: String,
}

impl TransactionObject {
    pub fn from_trytes(trytes: &str) -> Result<Self, InputSelectionError> {
        if trytes.len() != TRANSACTION_TRYTES {
            return Err(InputSelectionError::InvalidTrytes(format!(
                "transaction must be {TRANSACTION_TRYTES} trytes, got {}",
                trytes.len()
            )));
        }
        if !is_trytes(trytes) {
            return Err(InputSelectionError::InvalidTrytes(
                "transaction contains non-tryte characters".to_string(),
            ));
        }

        let field = |range: Range<usize>| &trytes[range];
        let unsigned = |range: Range<usize>, name: &str| {
            let value = trytes_to_i64(&trytes[range])?;
            u64::try_from(value).map_err(|_| {
                InputSelectionError::InvalidTrytes(format!("negative {name}: {value}"))
            })
        };

        Ok(Self {
            signature_message_fragment: field(SIGNATURE_MESSAGE_FRAGMENT).to_string(),
            address: field(ADDRESS).parse()?,
            value: trytes_to_i64(field(VALUE))?,
            obsolete_tag: field(OBSOLETE_TAG).to_string(),
            timestamp: unsigned(TIMESTAMP, "timestamp")?,
            current_index: unsigned(CURRENT_INDEX, "current index")?,
            last_index: unsigned(LAST_INDEX, "last index")?,
            bundle: field(BUNDLE).parse()?,
            trunk_transaction: field(TRUNK_TRANSACTION).parse()?,
            branch_transaction: field(BRANCH_TRANSACTION).parse()?,
            tag: field(TAG).to_string(),
            attachment_timestamp: trytes_to_i64(field(ATTACHMENT_TIMESTAMP))?,
            attachment_timestamp_lower_bound: trytes_to_i64(field(
                ATTACHMENT_TIMESTAMP_LOWER_BOUND,
            ))?,
            attachment_timestamp_upper_bound: trytes_to_i64(field(
                ATTACHMENT_TIMESTAMP_UPPER_BOUND,
            ))?,
            nonce: field(NONCE).to_string(),
        })
    }

    /// Serialize back into raw transaction trytes.
    pub fn to_trytes(&self) -> Result<String, InputSelectionError> {
        let timestamp = i64::try_from(self.timestamp).map_err(|_| {
            InputSelectionError::InvalidTrytes(format!("timestamp {} too large", self.timestamp))
        })?;
        let current_index = i64::try_from(self.current_index).map_err(|_| {
            InputSelectionError::InvalidTrytes(format!(
                "current index {} too large",
                self.current_index
            ))
        })?;
        let last_index = i64::try_from(self.last_index).map_err(|_| {
            InputSelectionError::InvalidTrytes(format!("last index {} too large", self.last_index))
        })?;

        let fixed = |value: &str, range: Range<usize>, name: &str| {
            if value.len() == range.len() && is_trytes(value) {
                Ok(value.to_string())
            } else {
                Err(InputSelectionError::InvalidTrytes(format!(
                    "{name} must be {} trytes",
                    range.len()
                )))
            }
        };

        let mut trytes = String::with_capacity(TRANSACTION_TRYTES);
        trytes.push_str(&fixed(
            &self.signature_message_fragment,
            SIGNATURE_MESSAGE_FRAGMENT,
            "signature message fragment",
        )?);
        trytes.push_str(self.address.as_str());
        trytes.push_str(&i64_to_trytes(self.value, VALUE.len())?);
        trytes.push_str(&fixed(&self.obsolete_tag, OBSOLETE_TAG, "obsolete tag")?);
        trytes.push_str(&i64_to_trytes(timestamp, TIMESTAMP.len())?);
        trytes.push_str(&i64_to_trytes(current_index, CURRENT_INDEX.len())?);
        trytes.push_str(&i64_to_trytes(last_index, LAST_INDEX.len())?);
        trytes.push_str(self.bundle.as_str());
        trytes.push_str(self.trunk_transaction.as_str());
        trytes.push_str(self.branch_transaction.as_str());
        trytes.push_str(&fixed(&self.tag, TAG, "tag")?);
        trytes.push_str(&i64_to_trytes(
            self.attachment_timestamp,
            ATTACHMENT_TIMESTAMP.len(),
        )?);
        trytes.push_str(&i64_to_trytes(
            self.attachment_timestamp_lower_bound,
            ATTACHMENT_TIMESTAMP_LOWER_BOUND.len(),
        )?);
        trytes.push_str(&i64_to_trytes(
            self.attachment_timestamp_upper_bound,
            ATTACHMENT_TIMESTAMP_UPPER_BOUND.len(),
        )?);
        trytes.push_str(&fixed(&self.nonce, NONCE, "nonce")?);

        Ok(trytes)
    }
}
