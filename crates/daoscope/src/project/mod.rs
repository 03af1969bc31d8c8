//! Pure state projectors over decoded event history.
//!
//! Every projector folds an [`crate::events::EventsByName`] into a current
//! value without mutating its input. Shared rule: last write wins by
//! consensus-timestamp order (the orchestrator sorts merged batches before
//! projection). Handling of equal or unparseable timestamps is a
//! per-projector tie-break, documented on each projector.

pub mod address;
mod locked;
mod membership;
mod proposal;

pub use locked::{locked_balance, DEFAULT_TOKEN_DECIMALS, UPDATED_AMOUNT};
pub use membership::{
    membership, Membership, ADDED_OWNER, CHANGED_THRESHOLD, REMOVED_OWNER, SWAP_OWNER,
};
pub use proposal::{
    proposal_status, ProposalStatus, PROPOSAL_CANCELED, PROPOSAL_CREATED, PROPOSAL_EXECUTED,
};
