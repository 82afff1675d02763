//! Versioned graph snapshots.
//!
//! Queries run against an `Arc<GraphSnapshot>` taken from the store. A rebuild
//! publishes a new snapshot by swapping the `Arc`; snapshots already handed out
//! stay valid and unchanged.

use crate::Graph;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug)]
pub struct GraphSnapshot {
    pub version: u64,
    pub published_at: DateTime<Utc>,
    pub graph: Graph,
}

/// Holds the current snapshot.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Arc<GraphSnapshot>>,
}

impl SnapshotStore {
    /// Create a store whose first snapshot is version 1.
    pub fn new(graph: Graph) -> Self {
        Self {
            current: RwLock::new(Arc::new(GraphSnapshot {
                version: 1,
                published_at: Utc::now(),
                graph,
            })),
        }
    }

    pub fn current(&self) -> Arc<GraphSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn version(&self) -> u64 {
        self.current.read().version
    }

    /// Replace the current snapshot, returning the new version.
    pub fn publish(&self, graph: Graph) -> u64 {
        let mut slot = self.current.write();
        let version = slot.version + 1;
        *slot = Arc::new(GraphSnapshot {
            version,
            published_at: Utc::now(),
            graph,
        });
        tracing::info!(
            version,
            nodes = slot.graph.node_count(),
            edges = slot.graph.edge_count(),
            "published graph snapshot"
        );
        version
    }
}
