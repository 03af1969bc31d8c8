//! Locked governance-token balance projected from `UpdatedAmount` history.

use crate::events::{events_for, EventsByName};
use crate::project::address::same_address;

pub const UPDATED_AMOUNT: &str = "UpdatedAmount";

/// Governance-token precision: raw amounts are fixed-point with 8 decimals.
pub const DEFAULT_TOKEN_DECIMALS: u32 = 8;

/// Current locked balance for `account` as a display value shifted by
/// `decimals`. The last matching entry in sequence order wins; no matching
/// entry projects to zero.
pub fn locked_balance(events: &EventsByName, account: &str, decimals: u32) -> f64 {
    let raw = events_for(events, UPDATED_AMOUNT)
        .iter()
        .filter(|e| {
            e.param("user")
                .and_then(|v| v.as_str())
                .is_some_and(|user| same_address(user, account))
        })
        .last()
        .and_then(|e| e.param("idOrAmount").and_then(|v| v.as_u128()));
    match raw {
        Some(amount) => amount as f64 / 10f64.powi(decimals as i32),
        None => 0.0,
    }
}
