//! Turns a fresh [`NodeSnapshot`] into gauge updates.
//!
//! Series whose label values come from the node (block hash, peer client
//! versions) are retracted when they stop being current, so the number of
//! published series stays bounded however long the exporter runs.

use crate::{
    collector::NodeSnapshot,
    metrics::{ExporterMetrics, NodeLabels},
};
use slog::{info, Logger};
use std::collections::BTreeMap;

/// Key of the aggregate peer series. Always published, zero included.
pub const PEERS_ALL: &str = "all";

const SYNC_BLOCKS: &str = "blocks";
const SYNC_HEADERS: &str = "headers";
const SYNC_PROGRESS: &str = "progress";
const MEMPOOL_SIZE: &str = "size";
const MEMPOOL_BYTES: &str = "bytes";

/// What was last published for a node. One instance per configured node,
/// owned by that node's poller for the lifetime of the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodePreviousState {
    pub last_subversion: String,
    pub last_best_block_hash: String,
    /// Every client version ever seen on this node, current count included.
    pub peer_counts: BTreeMap<String, u64>,
}

impl Default for NodePreviousState {
    fn default() -> Self {
        Self {
            last_subversion: String::new(),
            last_best_block_hash: String::new(),
            peer_counts: BTreeMap::from([(PEERS_ALL.to_string(), 0)]),
        }
    }
}

/// `blocks / headers` rounded to 5 decimals, within `[0, 1]`.
pub fn sync_progress(blocks: u64, headers: u64) -> f64 {
    if headers == 0 {
        return 0.0;
    }
    let progress = (blocks as f64 / headers as f64).clamp(0.0, 1.0);
    (progress * 100_000.0).round() / 100_000.0
}

/// Applies `snapshot` to the registry and records it in `previous`.
pub fn reconcile(
    snapshot: &NodeSnapshot,
    previous: &mut NodePreviousState,
    metrics: &ExporterMetrics,
    labels: &NodeLabels,
    log: &Logger,
) {
    if snapshot.subversion != previous.last_subversion {
        metrics
            .version
            .with_label_values(&labels.with(&[snapshot.subversion.as_str()]))
            .set(1.0);
        previous.last_subversion = snapshot.subversion.clone();
        info!(log, "update version to {}", snapshot.subversion);
    }

    if snapshot.best_block_hash != previous.last_best_block_hash {
        if !previous.last_best_block_hash.is_empty() {
            // A missing series only means nothing was published yet.
            let _ = metrics
                .latest
                .remove_label_values(&labels.with(&[previous.last_best_block_hash.as_str()]));
        }
        metrics
            .latest
            .with_label_values(&labels.with(&[snapshot.best_block_hash.as_str()]))
            .set(snapshot.blocks as f64);
        previous.last_best_block_hash = snapshot.best_block_hash.clone();
        info!(
            log,
            "update latest to {}:{}", snapshot.blocks, snapshot.best_block_hash
        );

        for (kind, value) in [
            (SYNC_BLOCKS, snapshot.blocks as f64),
            (SYNC_HEADERS, snapshot.headers as f64),
            (SYNC_PROGRESS, sync_progress(snapshot.blocks, snapshot.headers)),
        ] {
            metrics
                .sync
                .with_label_values(&labels.with(&[kind]))
                .set(value);
        }
    }
    metrics
        .size
        .with_label_values(&labels.with(&[]))
        .set(snapshot.size_on_disk as f64);

    metrics
        .mempool
        .with_label_values(&labels.with(&[MEMPOOL_SIZE]))
        .set(snapshot.mempool_size as f64);
    metrics
        .mempool
        .with_label_values(&labels.with(&[MEMPOOL_BYTES]))
        .set(snapshot.mempool_bytes as f64);

    for estimate in &snapshot.fee_estimates {
        let target = estimate.target.to_string();
        metrics
            .fee
            .with_label_values(&labels.with(&[target.as_str(), estimate.mode.as_ref()]))
            .set(estimate.feerate);
    }

    // Every version ever seen stays in the map with a zero count, so it only
    // grows. Zero entries are retracted again on each tick.
    let mut peer_counts: BTreeMap<String, u64> = previous
        .peer_counts
        .keys()
        .map(|version| (version.clone(), 0))
        .collect();
    peer_counts.insert(PEERS_ALL.to_string(), snapshot.peer_subversions.len() as u64);
    // A peer advertising "all" is counted in the aggregate only.
    for subversion in snapshot
        .peer_subversions
        .iter()
        .filter(|subversion| subversion.as_str() != PEERS_ALL)
    {
        *peer_counts.entry(subversion.clone()).or_default() += 1;
    }
    for (version, count) in &peer_counts {
        if *count == 0 && version != PEERS_ALL {
            let _ = metrics
                .peers
                .remove_label_values(&labels.with(&[version.as_str()]));
        } else {
            metrics
                .peers
                .with_label_values(&labels.with(&[version.as_str()]))
                .set(*count as f64);
        }
    }
    previous.peer_counts = peer_counts;
}
