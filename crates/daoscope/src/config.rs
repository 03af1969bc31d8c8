//! Deployment configuration: governance contract ids and token precision.
//!
//! Load order: env `DAOSCOPE_CONFIG_PATH`, then `./config/daoscope.json`,
//! then `./daoscope.json`. Missing or malformed files fall back to defaults;
//! read views fail later with a missing-contract error if ids are unset.

use crate::project::DEFAULT_TOKEN_DECIMALS;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaoConfig {
    /// Governance-token holder contract (lock/unlock; emits `UpdatedAmount`).
    #[serde(default)]
    pub gov_token_holder_contract: String,

    /// Governor contract (emits the `Proposal*` lifecycle events).
    #[serde(default)]
    pub governor_contract: String,

    /// Multisig safe contract (owner and threshold events).
    #[serde(default)]
    pub safe_contract: String,

    /// Decimal shift applied to raw locked amounts for display.
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u32,

    /// Overrides the public mirror-node base URL when set.
    #[serde(default)]
    pub mirror_base_url: Option<String>,
}

fn default_token_decimals() -> u32 {
    DEFAULT_TOKEN_DECIMALS
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            gov_token_holder_contract: String::new(),
            governor_contract: String::new(),
            safe_contract: String::new(),
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            mirror_base_url: None,
        }
    }
}

impl DaoConfig {
    /// Load config from path. Returns default on error or missing file.
    pub fn load_from_path(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("malformed config at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load config from the standard lookup chain.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("DAOSCOPE_CONFIG_PATH") {
            let p = Path::new(&path);
            if p.exists() {
                return Self::load_from_path(p);
            }
        }
        for candidate in [
            Path::new("./config/daoscope.json"),
            Path::new("./daoscope.json"),
        ] {
            if candidate.exists() {
                return Self::load_from_path(candidate);
            }
        }
        Self::default()
    }
}
