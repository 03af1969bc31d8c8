//! daoscope — DAO governance read-state from mirror-node event logs.
//!
//! Fetches ABI-encoded contract event logs from a mirror node, decodes them
//! against a signature catalog, and projects the history into current state:
//! locked governance-token balances, proposal lifecycle, multisig membership.
//! Read-only; no transaction construction or signing.

pub mod abi;
pub mod config;
pub mod events;
pub mod mirror;
pub mod project;
pub mod view;

pub use abi::decode::{decode_logs, Diagnostic, Diagnostics};
pub use abi::descriptor::{AbiEntry, AbiParam, CatalogError, EventDescriptor, SignatureCatalog};
pub use abi::value::{DecodeError, EventValue};
pub use config::DaoConfig;
pub use events::{events_for, merge, sort_by_consensus_timestamp, DecodedEvent, EventsByName};
pub use mirror::orchestrator::{fetch_and_decode, fetch_and_decode_with_diagnostics};
pub use mirror::{FetchError, LogQuery, MirrorClient, MirrorConfig, RawLogRecord, ResponseCache};
pub use project::{locked_balance, membership, proposal_status, Membership, ProposalStatus};
pub use view::{GovernanceViews, ViewError};
