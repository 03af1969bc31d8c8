//! Decoding raw mirror-node logs against the signature catalog.
//!
//! One corrupt log never aborts the batch: every skip or failure is recorded
//! as a [`Diagnostic`] and the remaining logs keep decoding. Partial success
//! is the expected mode.

use crate::abi::descriptor::{AbiType, EventDescriptor, SignatureCatalog};
use crate::abi::value::{decode_dynamic, decode_hex, decode_static, DecodeError, EventValue};
use crate::events::{DecodedEvent, EventsByName};
use crate::mirror::RawLogRecord;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// One item absorbed below the error surface while fetching or decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// topics[0] matched no catalog entry; expected for foreign events.
    UnknownSignature { topic0: String },
    /// A known event the caller did not ask for.
    UninterestedEvent { name: String },
    /// Data/topics did not match the descriptor; the log was skipped.
    MalformedLog { name: String, reason: String },
    /// A remote query failed; sibling queries were unaffected.
    QueryFailed { contract: String, reason: String },
}

/// Ordered record of everything silently skipped. Default entry points log
/// and discard it; `_with_diagnostics` variants hand it to the caller.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, d: Diagnostic) {
        self.entries.push(d);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Decode `logs` in input order, keeping only events named in `wanted`.
///
/// Unknown signatures and unrequested event names are skipped silently;
/// per-log decode failures are recorded and skipped. Within the result,
/// each sequence preserves input log order.
pub fn decode_logs(
    catalog: &SignatureCatalog,
    logs: &[RawLogRecord],
    wanted: &[&str],
    diagnostics: &mut Diagnostics,
) -> EventsByName {
    let mut out = EventsByName::new();
    for log in logs {
        let Some(topic0) = log.topics.first() else {
            diagnostics.push(Diagnostic::MalformedLog {
                name: String::new(),
                reason: "log carries no topics".to_string(),
            });
            continue;
        };
        let Some(descriptor) = catalog.lookup(topic0) else {
            debug!(topic0 = %topic0, "unknown event signature, skipping log");
            diagnostics.push(Diagnostic::UnknownSignature {
                topic0: topic0.clone(),
            });
            continue;
        };
        if !wanted.contains(&descriptor.name.as_str()) {
            diagnostics.push(Diagnostic::UninterestedEvent {
                name: descriptor.name.clone(),
            });
            continue;
        }
        match decode_one(descriptor, log) {
            Ok(event) => out.entry(descriptor.name.clone()).or_default().push(event),
            Err(e) => {
                warn!(event = %descriptor.name, error = %e, "failed to decode log, skipping");
                diagnostics.push(Diagnostic::MalformedLog {
                    name: descriptor.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    out
}

fn decode_one(
    descriptor: &EventDescriptor,
    log: &RawLogRecord,
) -> Result<DecodedEvent, DecodeError> {
    // Anonymous events carry no signature topic; every topic is a value.
    let indexed_topics: &[String] = if descriptor.anonymous {
        &log.topics
    } else {
        &log.topics[1..]
    };
    let indexed_count = descriptor.inputs.iter().filter(|p| p.indexed).count();
    if indexed_topics.len() < indexed_count {
        return Err(DecodeError::TopicCount {
            expected: indexed_count,
            got: indexed_topics.len(),
        });
    }
    let data = decode_hex(&log.data)?;

    let mut params = BTreeMap::new();
    let mut topic_ix = 0usize;
    let mut head = 0usize;
    for param in &descriptor.inputs {
        let kind = AbiType::parse(&param.kind)
            .ok_or_else(|| DecodeError::UnsupportedType(param.kind.clone()))?;
        let value = if param.indexed {
            let topic_bytes = decode_hex(&indexed_topics[topic_ix])?;
            topic_ix += 1;
            if topic_bytes.len() != 32 {
                return Err(DecodeError::Truncated("topic"));
            }
            if kind.is_dynamic() {
                // Indexed dynamic values arrive pre-hashed; keep the hash.
                EventValue::Str(format!("0x{}", hex::encode(&topic_bytes)))
            } else {
                decode_static(kind, &topic_bytes)
            }
        } else if kind.is_dynamic() {
            let v = decode_dynamic(kind, &data, head)?;
            head += 32;
            v
        } else {
            let w = data
                .get(head..head + 32)
                .ok_or(DecodeError::Truncated("data word"))?;
            head += 32;
            decode_static(kind, w)
        };
        params.insert(param.name.clone(), value);
    }
    Ok(DecodedEvent {
        name: descriptor.name.clone(),
        params,
        timestamp: log.timestamp.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::descriptor::signature_hash;
    use crate::abi::value::encode;
    use crate::events::events_for;

    fn catalog() -> SignatureCatalog {
        SignatureCatalog::governance().unwrap()
    }

    fn log(topic0: &str, data: Vec<u8>, timestamp: &str) -> RawLogRecord {
        RawLogRecord {
            address: "0x0000000000000000000000000000000000002766".to_string(),
            contract_id: Some("0.0.10086".to_string()),
            topics: vec![topic0.to_string()],
            data: format!("0x{}", hex::encode(data)),
            timestamp: timestamp.to_string(),
        }
    }

    fn updated_amount_log(user: &str, amount: u128, timestamp: &str) -> RawLogRecord {
        let cat = catalog();
        let topic0 = cat.hash_for("UpdatedAmount").unwrap().to_string();
        let mut data = encode::word_address(user);
        data.extend(encode::word_u128(amount));
        log(&topic0, data, timestamp)
    }

    #[test]
    fn decode_updated_amount() {
        let mut diag = Diagnostics::default();
        let logs = vec![updated_amount_log(
            "0x0000000000000000000000000000000000000065",
            500_000_000,
            "1671654161.469437003",
        )];
        let out = decode_logs(&catalog(), &logs, &["UpdatedAmount"], &mut diag);
        let events = events_for(&out, "UpdatedAmount");
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].param("user").unwrap().as_str(),
            Some("0x0000000000000000000000000000000000000065")
        );
        assert_eq!(
            events[0].param("idOrAmount").unwrap().as_u128(),
            Some(500_000_000)
        );
        assert_eq!(events[0].timestamp, "1671654161.469437003");
        assert!(diag.is_empty());
    }

    #[test]
    fn unknown_signature_is_silently_skipped() {
        let mut diag = Diagnostics::default();
        let unknown = log(
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
            encode::word_u128(1),
            "1.0",
        );
        let out = decode_logs(&catalog(), &[unknown], &["UpdatedAmount"], &mut diag);
        assert!(out.is_empty());
        assert!(matches!(
            diag.entries()[0],
            Diagnostic::UnknownSignature { .. }
        ));
    }

    #[test]
    fn unrequested_event_is_skipped() {
        let mut diag = Diagnostics::default();
        let logs = vec![updated_amount_log(
            "0x0000000000000000000000000000000000000065",
            1,
            "1.0",
        )];
        let out = decode_logs(&catalog(), &logs, &["ProposalCreated"], &mut diag);
        assert!(out.is_empty());
        assert_eq!(
            diag.entries(),
            [Diagnostic::UninterestedEvent {
                name: "UpdatedAmount".to_string()
            }]
        );
    }

    #[test]
    fn corrupt_log_does_not_abort_batch() {
        let mut diag = Diagnostics::default();
        let cat = catalog();
        let topic0 = cat.hash_for("UpdatedAmount").unwrap().to_string();
        // Truncated data: one word where two are required.
        let corrupt = log(&topic0, encode::word_u128(9), "1.0");
        let good = updated_amount_log("0x0000000000000000000000000000000000000065", 7, "2.0");
        let out = decode_logs(&cat, &[corrupt, good], &["UpdatedAmount"], &mut diag);
        let events = events_for(&out, "UpdatedAmount");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].param("idOrAmount").unwrap().as_u128(), Some(7));
        assert!(matches!(
            diag.entries()[0],
            Diagnostic::MalformedLog { .. }
        ));
    }

    #[test]
    fn oversized_dynamic_offset_is_absorbed_not_fatal() {
        // A string head word of u64::MAX must become a MalformedLog entry,
        // leaving the rest of the batch intact.
        let cat = catalog();
        let topic0 = cat.hash_for("ProposalCreated").unwrap().to_string();
        let mut data = encode::word_u128(7);
        data.extend(encode::word_address(
            "0x00000000000000000000000000000000000000aa",
        ));
        data.extend(encode::word_u128(u128::from(u64::MAX)));
        let corrupt = log(&topic0, data, "1.0");
        let good = updated_amount_log("0x0000000000000000000000000000000000000065", 3, "2.0");

        let mut diag = Diagnostics::default();
        let out = decode_logs(
            &cat,
            &[corrupt, good],
            &["ProposalCreated", "UpdatedAmount"],
            &mut diag,
        );
        assert!(events_for(&out, "ProposalCreated").is_empty());
        assert_eq!(events_for(&out, "UpdatedAmount").len(), 1);
        assert_eq!(diag.len(), 1);
        assert!(matches!(
            diag.entries()[0],
            Diagnostic::MalformedLog { ref name, .. } if name == "ProposalCreated"
        ));
    }

    #[test]
    fn decode_preserves_input_order() {
        let mut diag = Diagnostics::default();
        let user = "0x0000000000000000000000000000000000000065";
        let logs = vec![
            updated_amount_log(user, 1, "1.0"),
            updated_amount_log(user, 2, "2.0"),
            updated_amount_log(user, 3, "3.0"),
        ];
        let out = decode_logs(&catalog(), &logs, &["UpdatedAmount"], &mut diag);
        let amounts: Vec<u128> = events_for(&out, "UpdatedAmount")
            .iter()
            .map(|e| e.param("idOrAmount").unwrap().as_u128().unwrap())
            .collect();
        assert_eq!(amounts, vec![1, 2, 3]);
    }

    #[test]
    fn string_parameter_roundtrip() {
        // ProposalCreated(uint256,address,string): encode, decode, compare.
        let cat = catalog();
        let topic0 = cat.hash_for("ProposalCreated").unwrap().to_string();
        let mut data = encode::word_u128(7);
        data.extend(encode::word_address(
            "0x00000000000000000000000000000000000000aa",
        ));
        data.extend(encode::word_u128(0x60));
        data.extend(encode::tail_bytes(b"upgrade treasury"));
        let mut diag = Diagnostics::default();
        let out = decode_logs(
            &cat,
            &[log(&topic0, data, "9.0")],
            &["ProposalCreated"],
            &mut diag,
        );
        let events = events_for(&out, "ProposalCreated");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].param("proposalId").unwrap().as_u128(), Some(7));
        assert_eq!(
            events[0].param("description").unwrap().as_str(),
            Some("upgrade treasury")
        );
        assert!(diag.is_empty());
    }

    #[test]
    fn indexed_parameters_come_from_topics() {
        // A catalog with an indexed variant exercises the topic slice path.
        let json = r#"[{"type": "event", "name": "Locked", "inputs": [
            {"name": "who", "type": "address", "indexed": true},
            {"name": "amount", "type": "uint256", "indexed": false}
        ]}]"#;
        let cat = SignatureCatalog::from_json(json).unwrap();
        let topic0 = cat.hash_for("Locked").unwrap().to_string();
        let who_topic = format!(
            "0x{}",
            hex::encode(encode::word_address(
                "0x00000000000000000000000000000000000000bb"
            ))
        );
        let record = RawLogRecord {
            topics: vec![topic0, who_topic],
            data: format!("0x{}", hex::encode(encode::word_u128(12))),
            timestamp: "4.0".to_string(),
            ..Default::default()
        };
        let mut diag = Diagnostics::default();
        let out = decode_logs(&cat, &[record], &["Locked"], &mut diag);
        let events = events_for(&out, "Locked");
        assert_eq!(
            events[0].param("who").unwrap().as_str(),
            Some("0x00000000000000000000000000000000000000bb")
        );
        assert_eq!(events[0].param("amount").unwrap().as_u128(), Some(12));
    }

    #[test]
    fn topic0_hash_matches_signature_hash() {
        let cat = catalog();
        let descriptor = cat
            .lookup(cat.hash_for("AddedOwner").unwrap())
            .unwrap()
            .clone();
        assert_eq!(
            cat.hash_for("AddedOwner").unwrap(),
            signature_hash(&descriptor.name, &descriptor.inputs)
        );
    }
}
