//! Cascade planning and application
//!
//! A cascade is computed in two steps: the plan collects every affected
//! node identifier and the number of edges touching them up front, then `apply` removes edges, nodes and finally the
//! class. Callers run both steps inside one [`SqliteStore::transaction`], so a
//! failure at any step leaves the graph untouched.

use crate::storage::SqliteStore;
use crate::{Error, Result};

/// What a deletion will remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    /// Class row to remove last, if the cascade started at a class
    class_id: Option<String>,
    /// Nodes whose edges and rows will be removed
    node_ids: Vec<String>,
    /// Edges touching `node_ids` when the plan was made
    edge_count: usize,
}

/// What a deletion removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub class_id: Option<String>,
    pub nodes_removed: Vec<String>,
    pub edges_removed: usize,
}

impl CascadePlan {
    /// Plan the removal of a single node and its edges
    pub fn for_node(store: &SqliteStore, node_id: &str) -> Result<Self> {
        if !store.node_exists(node_id)? {
            return Err(Error::NodeNotFound(node_id.to_string()));
        }
        let node_ids = vec![node_id.to_string()];
        let edge_count = store.count_edges_touching_any(&node_ids)?;
        Ok(Self {
            class_id: None,
            node_ids,
            edge_count,
        })
    }

    /// Plan the removal of a class, all of its nodes and every edge touching them
    pub fn for_class(store: &SqliteStore, class_id: &str) -> Result<Self> {
        if !store.class_exists(class_id)? {
            return Err(Error::ClassNotFound(class_id.to_string()));
        }
        let node_ids = store.node_ids_of_class(class_id)?;
        let edge_count = store.count_edges_touching_any(&node_ids)?;
        Ok(Self {
            class_id: Some(class_id.to_string()),
            node_ids,
            edge_count,
        })
    }

    /// Apply the plan: edges, then nodes, then the class.
    pub fn apply(self, store: &SqliteStore) -> Result<CascadeReport> {
        let edges_removed = store.delete_edges_touching_any(&self.node_ids)?;
        if edges_removed != self.edge_count {
            tracing::warn!(
                planned = self.edge_count,
                removed = edges_removed,
                "edge count changed between planning and cascade"
            );
        }
        tracing::debug!(
            nodes = self.node_ids.len(),
            edges = edges_removed,
            "cascade removed edges"
        );

        store.delete_nodes(&self.node_ids)?;

        if let Some(class_id) = &self.class_id {
            store.delete_class(class_id)?;
        }

        Ok(CascadeReport {
            class_id: self.class_id,
            nodes_removed: self.node_ids,
            edges_removed,
        })
    }
}
