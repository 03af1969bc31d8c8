//! Address canonicalization for matching decoded event values to accounts.
//!
//! Accounts arrive in two spellings: `shard.realm.num` ids and EVM hex
//! addresses. Both sides of every comparison go through the same canonical
//! form instead of ad hoc string munging at call sites.

/// Lowercase hex with no `0x` prefix and no stray spaces.
pub fn normalize_evm_address(address: &str) -> String {
    let t = address.trim();
    t.strip_prefix("0x")
        .unwrap_or(t)
        .replace(' ', "")
        .to_lowercase()
}

/// Convert `shard.realm.num` to the 20-byte long-zero EVM address
/// (4-byte shard, 8-byte realm, 8-byte num, big-endian) as lowercase hex
/// without prefix. None unless all three parts are decimal numbers.
pub fn account_num_to_evm_address(account: &str) -> Option<String> {
    let mut parts = account.trim().split('.');
    let shard: u32 = parts.next()?.parse().ok()?;
    let realm: u64 = parts.next()?.parse().ok()?;
    let num: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let mut bytes = [0u8; 20];
    bytes[0..4].copy_from_slice(&shard.to_be_bytes());
    bytes[4..12].copy_from_slice(&realm.to_be_bytes());
    bytes[12..20].copy_from_slice(&num.to_be_bytes());
    Some(hex::encode(bytes))
}

/// Canonical comparable form of an account given in either spelling.
pub fn canonical_account(account: &str) -> String {
    account_num_to_evm_address(account).unwrap_or_else(|| normalize_evm_address(account))
}

/// True when both spellings refer to the same address.
pub fn same_address(a: &str, b: &str) -> bool {
    canonical_account(a) == canonical_account(b)
}
