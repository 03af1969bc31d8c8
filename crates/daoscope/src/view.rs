//! Governance read views: fetch, decode, and project in one call.
//!
//! Nothing here persists state. Every view refetches (or replays from the
//! response cache), decodes against the signature catalog, and folds the
//! event history into a current value.

use crate::abi::decode::Diagnostics;
use crate::abi::descriptor::{CatalogError, SignatureCatalog};
use crate::config::DaoConfig;
use crate::mirror::{fetch_and_decode_with_diagnostics, LogQuery, MirrorClient};
use crate::project::{
    locked_balance, membership, proposal_status, Membership, ProposalStatus, ADDED_OWNER,
    CHANGED_THRESHOLD, PROPOSAL_CANCELED, PROPOSAL_CREATED, PROPOSAL_EXECUTED, REMOVED_OWNER,
    SWAP_OWNER, UPDATED_AMOUNT,
};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("signature catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("config is missing the {0} contract id")]
    MissingContract(&'static str),
}

/// Read-model facade over one DAO deployment. Holds the mirror client, the
/// event signature catalog, and the deployment's contract ids.
pub struct GovernanceViews {
    client: MirrorClient,
    catalog: SignatureCatalog,
    config: DaoConfig,
}

impl GovernanceViews {
    /// Build views over the bundled governance catalog.
    pub fn new(client: MirrorClient, config: DaoConfig) -> Result<Self, ViewError> {
        let catalog = SignatureCatalog::governance()?;
        Ok(Self::with_catalog(client, catalog, config))
    }

    /// Build views over a caller-supplied catalog (custom ABI deployments).
    pub fn with_catalog(client: MirrorClient, catalog: SignatureCatalog, config: DaoConfig) -> Self {
        Self {
            client,
            catalog,
            config,
        }
    }

    pub fn catalog(&self) -> &SignatureCatalog {
        &self.catalog
    }

    fn contract<'a>(
        &self,
        id: &'a str,
        label: &'static str,
    ) -> Result<&'a str, ViewError> {
        if id.is_empty() {
            return Err(ViewError::MissingContract(label));
        }
        Ok(id)
    }

    /// Current locked governance-token balance for `account`, in display
    /// units. Accounts with no lock history read as zero.
    pub async fn locked_token_balance(&self, account: &str) -> Result<(f64, Diagnostics), ViewError> {
        let contract = self.contract(&self.config.gov_token_holder_contract, "gov token holder")?;
        let queries = [LogQuery::for_contract(contract)];
        let (events, diagnostics) = fetch_and_decode_with_diagnostics(
            &self.client,
            &self.catalog,
            &queries,
            &[UPDATED_AMOUNT],
        )
        .await;
        let balance = locked_balance(&events, account, self.config.token_decimals);
        debug!(account, balance, "locked_token_balance");
        Ok((balance, diagnostics))
    }

    /// Lifecycle status of one proposal. Created, executed, and canceled
    /// histories are fetched concurrently, each filtered server-side by its
    /// signature hash.
    pub async fn proposal_state(
        &self,
        proposal_id: u128,
    ) -> Result<(ProposalStatus, Diagnostics), ViewError> {
        let contract = self.contract(&self.config.governor_contract, "governor")?;
        let queries: Vec<LogQuery> =
            [PROPOSAL_CREATED, PROPOSAL_EXECUTED, PROPOSAL_CANCELED]
                .iter()
                .map(|name| LogQuery {
                    contract: contract.to_string(),
                    topic0: self.catalog.hash_for(name).map(String::from),
                    ..Default::default()
                })
                .collect();
        let (events, diagnostics) = fetch_and_decode_with_diagnostics(
            &self.client,
            &self.catalog,
            &queries,
            &[PROPOSAL_CREATED, PROPOSAL_EXECUTED, PROPOSAL_CANCELED],
        )
        .await;
        let status = proposal_status(&events, proposal_id);
        debug!(proposal_id, %status, "proposal_state");
        Ok((status, diagnostics))
    }

    /// Current multisig owner set and signing threshold, replayed from the
    /// safe contract's full event history.
    pub async fn dao_membership(&self) -> Result<(Membership, Diagnostics), ViewError> {
        let contract = self.contract(&self.config.safe_contract, "safe")?;
        let queries = [LogQuery::for_contract(contract)];
        let (events, diagnostics) = fetch_and_decode_with_diagnostics(
            &self.client,
            &self.catalog,
            &queries,
            &[ADDED_OWNER, REMOVED_OWNER, SWAP_OWNER, CHANGED_THRESHOLD],
        )
        .await;
        let members = membership(&events);
        debug!(owners = members.owners.len(), "dao_membership");
        Ok((members, diagnostics))
    }
}
