//! Settle-all fan-out over mirror log queries.

use crate::abi::decode::{decode_logs, Diagnostic, Diagnostics};
use crate::abi::descriptor::SignatureCatalog;
use crate::events::{merge, sort_by_consensus_timestamp, EventsByName};
use crate::mirror::fetch::{LogQuery, MirrorClient};
use futures::future::join_all;
use tracing::{info, warn};

/// Issue all `queries` concurrently, decode the batches that succeeded, and
/// merge them in query order. Every query settles independently; a failed
/// query never cancels its siblings, and if every query fails the result is
/// an empty map, not an error. Merged sequences are sorted by consensus
/// timestamp so "latest" follows chain order rather than arrival order.
pub async fn fetch_and_decode(
    client: &MirrorClient,
    catalog: &SignatureCatalog,
    queries: &[LogQuery],
    wanted: &[&str],
) -> EventsByName {
    let (events, diagnostics) =
        fetch_and_decode_with_diagnostics(client, catalog, queries, wanted).await;
    if !diagnostics.is_empty() {
        info!(skipped = diagnostics.len(), "fetch_and_decode absorbed diagnostics");
    }
    events
}

/// As [`fetch_and_decode`], additionally returning the skip/failure record
/// for callers that audit silent degradation.
pub async fn fetch_and_decode_with_diagnostics(
    client: &MirrorClient,
    catalog: &SignatureCatalog,
    queries: &[LogQuery],
    wanted: &[&str],
) -> (EventsByName, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    let results = join_all(queries.iter().map(|q| client.contract_logs(q))).await;
    let mut batches = Vec::new();
    for (query, result) in queries.iter().zip(results) {
        match result {
            Ok(logs) => batches.push(decode_logs(catalog, &logs, wanted, &mut diagnostics)),
            Err(e) => {
                warn!(contract = %query.contract, error = %e, "log query failed, continuing with remaining queries");
                diagnostics.push(Diagnostic::QueryFailed {
                    contract: query.contract.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    let mut merged = merge(batches);
    sort_by_consensus_timestamp(&mut merged);
    (merged, diagnostics)
}
