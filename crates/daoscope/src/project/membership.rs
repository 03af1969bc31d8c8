//! Multisig membership and threshold folded from safe owner events.

use crate::events::{events_for, DecodedEvent, EventsByName};
use crate::project::address::normalize_evm_address;
use serde::Serialize;

pub const ADDED_OWNER: &str = "AddedOwner";
pub const REMOVED_OWNER: &str = "RemovedOwner";
pub const SWAP_OWNER: &str = "SwapOwner";
pub const CHANGED_THRESHOLD: &str = "ChangedThreshold";

/// Current multisig membership: owners in insertion order (normalized hex)
/// and the signing threshold, when one was ever set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub owners: Vec<String>,
    pub threshold: Option<u64>,
}

fn addr_param(event: &DecodedEvent, name: &str) -> Option<String> {
    event
        .param(name)
        .and_then(|v| v.as_str())
        .map(normalize_evm_address)
}

/// Fold owner mutations into the current membership set. The four event
/// kinds are interleaved by consensus timestamp before folding; with equal
/// timestamps, adds apply before removes, swaps, and threshold changes.
/// Adding a present owner is a no-op, as is removing an absent one; a swap
/// replaces the old owner in place, preserving its slot.
pub fn membership(events: &EventsByName) -> Membership {
    let mut history: Vec<&DecodedEvent> = [ADDED_OWNER, REMOVED_OWNER, SWAP_OWNER, CHANGED_THRESHOLD]
        .iter()
        .flat_map(|name| events_for(events, name))
        .collect();
    history.sort_by_key(|e| e.consensus_key().unwrap_or((0, 0)));

    let mut owners: Vec<String> = Vec::new();
    let mut threshold = None;
    for event in history {
        match event.name.as_str() {
            ADDED_OWNER => {
                if let Some(owner) = addr_param(event, "owner") {
                    if !owners.contains(&owner) {
                        owners.push(owner);
                    }
                }
            }
            REMOVED_OWNER => {
                if let Some(owner) = addr_param(event, "owner") {
                    owners.retain(|o| *o != owner);
                }
            }
            SWAP_OWNER => {
                if let (Some(old), Some(new)) =
                    (addr_param(event, "oldOwner"), addr_param(event, "newOwner"))
                {
                    match owners.iter().position(|o| *o == old) {
                        Some(ix) => owners[ix] = new,
                        None => {
                            if !owners.contains(&new) {
                                owners.push(new);
                            }
                        }
                    }
                }
            }
            CHANGED_THRESHOLD => {
                threshold = event
                    .param("threshold")
                    .and_then(|v| v.as_u128())
                    .map(|t| t as u64);
            }
            _ => {}
        }
    }
    Membership { owners, threshold }
}
