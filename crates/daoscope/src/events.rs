//! Decoded events grouped by name, batch merging, and chain ordering.

use crate::abi::value::EventValue;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One decoded log: event name, named parameter values, and the consensus
/// timestamp carried through from the mirror node unmodified. Immutable once
/// created; transformations build new values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DecodedEvent {
    pub name: String,
    pub params: BTreeMap<String, EventValue>,
    pub timestamp: String,
}

impl DecodedEvent {
    pub fn param(&self, name: &str) -> Option<&EventValue> {
        self.params.get(name)
    }

    /// `(seconds, nanos)` parsed from a `sss.nnnnnnnnn` consensus timestamp.
    pub fn consensus_key(&self) -> Option<(u64, u32)> {
        parse_consensus_timestamp(&self.timestamp)
    }
}

/// Decoded events keyed by event name, each sequence in append order.
/// An absent key is equivalent to an empty sequence.
pub type EventsByName = HashMap<String, Vec<DecodedEvent>>;

/// Concatenate batches per event name, in the order batches are supplied.
/// No dedup: a log fetched twice (overlapping query windows) appears twice;
/// exactly-once callers must deduplicate themselves.
pub fn merge(batches: Vec<EventsByName>) -> EventsByName {
    let mut out = EventsByName::new();
    for batch in batches {
        for (name, mut events) in batch {
            out.entry(name).or_default().append(&mut events);
        }
    }
    out
}

/// Events for `name`, treating an absent key as an empty sequence.
pub fn events_for<'a>(events: &'a EventsByName, name: &str) -> &'a [DecodedEvent] {
    events.get(name).map(Vec::as_slice).unwrap_or(&[])
}

/// Parse a Hedera-style consensus timestamp (`"1671654161.469437003"`).
/// A bare seconds value gets zero nanos.
pub fn parse_consensus_timestamp(ts: &str) -> Option<(u64, u32)> {
    let (secs, nanos) = match ts.split_once('.') {
        Some((s, n)) => (s, n),
        None => (ts, "0"),
    };
    Some((secs.trim().parse().ok()?, nanos.trim().parse().ok()?))
}

/// Stable-sort every sequence by consensus timestamp so "latest" means
/// chain-latest regardless of the order batches were merged. Entries without
/// a parseable timestamp sort first and keep their relative arrival order.
pub fn sort_by_consensus_timestamp(events: &mut EventsByName) {
    for seq in events.values_mut() {
        seq.sort_by_key(|e| e.consensus_key().unwrap_or((0, 0)));
    }
}
