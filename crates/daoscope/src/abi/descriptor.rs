//! JSON ABI parsing and the event signature catalog.
//!
//! The catalog maps a log's leading topic (the Keccak-256 hash of the event's
//! canonical signature) to a structured descriptor. It is built once at
//! startup from static interface definitions and shared read-only afterwards.

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};
use tracing::warn;

/// Governance contract events (token holder, governor, multisig safe).
const GOVERNANCE_ABI_JSON: &str = include_str!("governance_abi.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("abi json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("interface definitions contain no usable event entries")]
    NoEventDefinitions,
}

/// One parameter of an ABI item.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub indexed: bool,
}

/// One entry of a JSON ABI. Only entries of kind `"event"` matter here;
/// functions, constructors, and errors are ignored at catalog build.
#[derive(Clone, Debug, Deserialize)]
pub struct AbiEntry {
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub anonymous: bool,
}

/// Solidity primitive types the decoder understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbiType {
    Address,
    Bool,
    String,
    Bytes,
    FixedBytes(usize),
    Uint(usize),
    Int(usize),
}

impl AbiType {
    /// Parse a solidity type string. Returns `None` for anything outside the
    /// supported primitive set (tuples, arrays, malformed widths).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "address" => Some(Self::Address),
            "bool" => Some(Self::Bool),
            "string" => Some(Self::String),
            "bytes" => Some(Self::Bytes),
            "uint" => Some(Self::Uint(256)),
            "int" => Some(Self::Int(256)),
            t if t.starts_with("bytes") => {
                let n: usize = t[5..].parse().ok()?;
                (1..=32).contains(&n).then_some(Self::FixedBytes(n))
            }
            t if t.starts_with("uint") => {
                let bits: usize = t[4..].parse().ok()?;
                (bits % 8 == 0 && (8..=256).contains(&bits)).then_some(Self::Uint(bits))
            }
            t if t.starts_with("int") => {
                let bits: usize = t[3..].parse().ok()?;
                (bits % 8 == 0 && (8..=256).contains(&bits)).then_some(Self::Int(bits))
            }
            _ => None,
        }
    }

    /// True for types whose value lives outside the static head section.
    pub fn is_dynamic(self) -> bool {
        matches!(self, Self::String | Self::Bytes)
    }
}

/// A known contract event: name, anonymity flag, ordered typed inputs.
/// Immutable for the process lifetime once the catalog is built.
#[derive(Clone, Debug)]
pub struct EventDescriptor {
    pub name: String,
    pub anonymous: bool,
    pub inputs: Vec<AbiParam>,
}

impl EventDescriptor {
    pub fn canonical_signature(&self) -> String {
        canonical_signature(&self.name, &self.inputs)
    }
}

/// `Name(type1,type2,...)` — the Keccak input for the signature hash.
pub fn canonical_signature(name: &str, inputs: &[AbiParam]) -> String {
    let kinds: Vec<&str> = inputs.iter().map(|p| p.kind.as_str()).collect();
    format!("{}({})", name, kinds.join(","))
}

pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut out = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut out);
    out
}

/// Signature hash in the form the mirror node serves topic0:
/// `0x`-prefixed lowercase hex of the canonical signature's Keccak-256.
pub fn signature_hash(name: &str, inputs: &[AbiParam]) -> String {
    let sig = canonical_signature(name, inputs);
    format!("0x{}", hex::encode(keccak256(sig.as_bytes())))
}

fn normalize_topic(topic: &str) -> String {
    format!("0x{}", topic.trim().trim_start_matches("0x").to_lowercase())
}

/// Lookup table from signature hash to event descriptor.
///
/// Write-once-then-read-only: built during startup, then only read, so shared
/// references need no synchronization.
#[derive(Clone, Debug, Default)]
pub struct SignatureCatalog {
    by_hash: HashMap<String, EventDescriptor>,
}

impl SignatureCatalog {
    /// Build from ABI entries. Non-event entries are ignored. Event entries
    /// with unsupported parameter types are skipped rather than inserted under
    /// a wrong key; the build itself never fails.
    pub fn build(entries: &[AbiEntry]) -> Self {
        let mut by_hash = HashMap::new();
        for entry in entries {
            if entry.entry_type != "event" {
                continue;
            }
            if entry.name.is_empty()
                || entry
                    .inputs
                    .iter()
                    .any(|p| AbiType::parse(&p.kind).is_none())
            {
                warn!(name = %entry.name, "skipping ABI event with unsupported parameter types");
                continue;
            }
            let hash = signature_hash(&entry.name, &entry.inputs);
            by_hash.insert(
                hash,
                EventDescriptor {
                    name: entry.name.clone(),
                    anonymous: entry.anonymous,
                    inputs: entry.inputs.clone(),
                },
            );
        }
        Self { by_hash }
    }

    /// Parse a JSON ABI array and build a catalog from it.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<AbiEntry> = serde_json::from_str(json)?;
        Ok(Self::build(&entries))
    }

    /// Catalog over the embedded governance interface definitions. Errors only
    /// if those definitions yield no events, which is a deployment defect.
    pub fn governance() -> Result<Self, CatalogError> {
        let catalog = Self::from_json(GOVERNANCE_ABI_JSON)?;
        if catalog.is_empty() {
            return Err(CatalogError::NoEventDefinitions);
        }
        Ok(catalog)
    }

    /// Resolve a log's leading topic to its event descriptor.
    pub fn lookup(&self, topic0: &str) -> Option<&EventDescriptor> {
        self.by_hash.get(&normalize_topic(topic0))
    }

    /// Signature hash for a cataloged event name, usable as a topic0 filter.
    pub fn hash_for(&self, name: &str) -> Option<&str> {
        self.by_hash
            .iter()
            .find(|(_, d)| d.name == name)
            .map(|(h, _)| h.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}
