//! Proposal lifecycle status projected from governor events.

use crate::events::{events_for, EventsByName};
use serde::Serialize;

pub const PROPOSAL_CREATED: &str = "ProposalCreated";
pub const PROPOSAL_EXECUTED: &str = "ProposalExecuted";
pub const PROPOSAL_CANCELED: &str = "ProposalCanceled";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Active,
    Executed,
    Canceled,
    NotFound,
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Executed => "executed",
            Self::Canceled => "canceled",
            Self::NotFound => "not_found",
        };
        f.write_str(s)
    }
}

fn mentions(events: &EventsByName, name: &str, proposal_id: u128) -> bool {
    events_for(events, name)
        .iter()
        .any(|e| e.param("proposalId").and_then(|v| v.as_u128()) == Some(proposal_id))
}

/// Status by precedence: canceled > executed > active-if-created. A proposal
/// with no `ProposalCreated` entry is `NotFound`.
pub fn proposal_status(events: &EventsByName, proposal_id: u128) -> ProposalStatus {
    if mentions(events, PROPOSAL_CANCELED, proposal_id) {
        ProposalStatus::Canceled
    } else if mentions(events, PROPOSAL_EXECUTED, proposal_id) {
        ProposalStatus::Executed
    } else if mentions(events, PROPOSAL_CREATED, proposal_id) {
        ProposalStatus::Active
    } else {
        ProposalStatus::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::value::EventValue;
    use crate::events::DecodedEvent;
    use std::collections::BTreeMap;

    fn lifecycle(name: &str, proposal_id: u128, ts: &str) -> DecodedEvent {
        let mut params = BTreeMap::new();
        params.insert("proposalId".to_string(), EventValue::Uint(proposal_id));
        DecodedEvent {
            name: name.to_string(),
            params,
            timestamp: ts.to_string(),
        }
    }

    fn events(list: Vec<DecodedEvent>) -> EventsByName {
        let mut out = EventsByName::new();
        for e in list {
            out.entry(e.name.clone()).or_default().push(e);
        }
        out
    }

    #[test]
    fn created_only_is_active() {
        let ev = events(vec![lifecycle(PROPOSAL_CREATED, 7, "1.0")]);
        assert_eq!(proposal_status(&ev, 7), ProposalStatus::Active);
    }

    #[test]
    fn executed_beats_active() {
        let ev = events(vec![
            lifecycle(PROPOSAL_CREATED, 7, "1.0"),
            lifecycle(PROPOSAL_EXECUTED, 7, "2.0"),
        ]);
        assert_eq!(proposal_status(&ev, 7), ProposalStatus::Executed);
    }

    #[test]
    fn canceled_beats_executed() {
        let ev = events(vec![
            lifecycle(PROPOSAL_CREATED, 7, "1.0"),
            lifecycle(PROPOSAL_EXECUTED, 7, "2.0"),
            lifecycle(PROPOSAL_CANCELED, 7, "3.0"),
        ]);
        assert_eq!(proposal_status(&ev, 7), ProposalStatus::Canceled);
    }

    #[test]
    fn other_proposals_do_not_leak() {
        let ev = events(vec![
            lifecycle(PROPOSAL_CREATED, 7, "1.0"),
            lifecycle(PROPOSAL_CANCELED, 8, "2.0"),
        ]);
        assert_eq!(proposal_status(&ev, 7), ProposalStatus::Active);
        assert_eq!(proposal_status(&ev, 9), ProposalStatus::NotFound);
    }
}
