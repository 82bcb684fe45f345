use crate::types::{
    AddressEntry, HASH_TRYTES, Hash81, SecurityLevel, SpendStatus, TRYTE_ALPHABET,
    TransactionRecord,
};

/// Distinct valid hash for every `seed` below 26 * 26, prefixed by `prefix`.
pub fn hash(prefix: char, seed: usize) -> Hash81 {
    let mut trytes = String::with_capacity(HASH_TRYTES);
    trytes.push(prefix);
    trytes.push(char::from(TRYTE_ALPHABET[1 + seed % 26]));
    trytes.push(char::from(TRYTE_ALPHABET[1 + (seed / 26) % 26]));
    trytes.extend(std::iter::repeat_n('9', HASH_TRYTES - 3));
    trytes.parse().expect("valid hash")
}

pub fn address(seed: usize) -> Hash81 {
    hash('A', seed)
}

pub fn bundle(seed: usize) -> Hash81 {
    hash('B', seed)
}

pub fn entry(seed: usize, balance: u64) -> AddressEntry {
    AddressEntry {
        address: address(seed),
        key_index: u32::try_from(seed).expect("small seed"),
        security: SecurityLevel::Medium,
        balance,
        spend_status: SpendStatus::default(),
    }
}

pub fn spent_entry(seed: usize, balance: u64) -> AddressEntry {
    AddressEntry {
        spend_status: SpendStatus {
            local: true,
            remote: false,
        },
        ..entry(seed, balance)
    }
}

pub fn transaction(
    address: &Hash81,
    transfer_value: i64,
    bundle: &Hash81,
    persistence: bool,
) -> TransactionRecord {
    TransactionRecord {
        address: address.clone(),
        transfer_value,
        bundle_hash: bundle.clone(),
        persistence,
        attachment_timestamp: 1_541_000_000_000,
    }
}
