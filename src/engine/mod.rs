//! Consistency Engine
//!
//! Mediates every operation on the class/node/edge graph:
//! - Validates required arguments before touching storage
//! - Checks references (class of a node, endpoints of an edge) inside the
//!   same transaction as the insert
//! - Applies class and node deletions as transactional cascades
//! - Treats an empty listing as not-found
//!
//! Source is checked before destination when creating an edge, so a request
//! with both endpoints missing always reports the source.

pub mod cascade;

pub use cascade::{CascadePlan, CascadeReport};

use crate::attributes::AttributeBag;
use crate::class::Class;
use crate::edge::{Edge, EdgeCriteria};
use crate::node::Node;
use crate::storage::{DbStats, SqliteStore};
use crate::{Error, Result};

pub const MISSING_CLASS_FIELDS: &str = "Por favor, forneça identificador e atributos.";
pub const MISSING_NODE_FIELDS: &str = "Por favor, forneça classeId, identificador e atributos.";
pub const MISSING_EDGE_FIELDS: &str = "Por favor, forneça origemId, destinoId e tipo.";
pub const MISSING_CLASS_ID: &str = "O identificador da classe é obrigatório.";
pub const MISSING_NODE_ID: &str = "O identificador do ativo é obrigatório.";
pub const ATTRIBUTES_NOT_OBJECT: &str = "Os atributos devem ser fornecidos no formato de objeto.";
pub const MISSING_CRITERIA: &str = "Informe ao menos um dos critérios: origemId, destinoId ou tipo.";

fn require(value: &str, message: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid(message));
    }
    Ok(())
}

/// Consistency engine over an injected store handle
pub struct GraphEngine<'a> {
    store: &'a SqliteStore,
}

impl<'a> GraphEngine<'a> {
    /// Create a new engine
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    // ========== Class Registry ==========

    /// Define a new class
    pub fn define_class(&self, identifier: &str, attributes: AttributeBag) -> Result<Class> {
        require(identifier, MISSING_CLASS_FIELDS)?;

        let class = Class::new(identifier, attributes);
        self.store.transaction(|s| {
            if s.class_exists(identifier)? {
                return Err(Error::duplicate_class(identifier));
            }
            s.insert_class(&class)
        })?;

        tracing::info!(class = identifier, "class defined");
        Ok(class)
    }

    /// All classes, in insertion order. May be empty.
    pub fn list_classes(&self) -> Result<Vec<Class>> {
        self.store.list_classes()
    }

    pub fn get_class(&self, identifier: &str) -> Result<Class> {
        require(identifier, MISSING_CLASS_ID)?;
        tracing::debug!(class = identifier, "class lookup");
        self.store
            .get_class(identifier)?
            .ok_or_else(|| Error::ClassNotFound(identifier.to_string()))
    }

    /// Attribute template of a class
    pub fn class_attributes(&self, identifier: &str) -> Result<AttributeBag> {
        Ok(self.get_class(identifier)?.attributes)
    }

    /// Remove a class together with its nodes and every edge touching them
    pub fn remove_class(&self, identifier: &str) -> Result<CascadeReport> {
        require(identifier, MISSING_CLASS_ID)?;

        let report = self
            .store
            .transaction(|s| CascadePlan::for_class(s, identifier)?.apply(s))?;

        tracing::info!(
            class = identifier,
            nodes = report.nodes_removed.len(),
            edges = report.edges_removed,
            "class removed"
        );
        Ok(report)
    }

    // ========== Node Store ==========

    /// Create a node of an existing class
    pub fn create_node(&self, class_id: &str, identifier: &str, attributes: AttributeBag) -> Result<Node> {
        require(class_id, MISSING_NODE_FIELDS)?;
        require(identifier, MISSING_NODE_FIELDS)?;

        let node = Node::new(identifier, class_id, attributes);
        self.store.transaction(|s| {
            if !s.class_exists(class_id)? {
                return Err(Error::ClassNotFound(class_id.to_string()));
            }
            if s.node_exists(identifier)? {
                return Err(Error::duplicate_node(identifier));
            }
            s.insert_node(&node)
        })?;

        tracing::info!(node = identifier, class = class_id, "node created");
        Ok(node)
    }

    /// Nodes of a class.
    ///
    /// Fails with `ClassNotFound` if the class is missing and with `NoNodes`
    /// if it exists but has no nodes.
    pub fn list_nodes_of_class(&self, class_id: &str) -> Result<Vec<Node>> {
        require(class_id, MISSING_CLASS_ID)?;

        if !self.store.class_exists(class_id)? {
            return Err(Error::ClassNotFound(class_id.to_string()));
        }
        let nodes = self.store.find_nodes_by_class(class_id)?;
        if nodes.is_empty() {
            return Err(Error::NoNodes(class_id.to_string()));
        }
        Ok(nodes)
    }

    pub fn get_node(&self, identifier: &str) -> Result<Node> {
        require(identifier, MISSING_NODE_ID)?;
        tracing::debug!(node = identifier, "node lookup");
        self.store
            .get_node(identifier)?
            .ok_or_else(|| Error::NodeNotFound(identifier.to_string()))
    }

    /// Replace a node's attribute bag wholesale
    pub fn update_node(&self, identifier: &str, attributes: AttributeBag) -> Result<Node> {
        require(identifier, MISSING_NODE_ID)?;

        let updated = self.store.transaction(|s| {
            let mut node = s
                .get_node(identifier)?
                .ok_or_else(|| Error::NodeNotFound(identifier.to_string()))?;
            s.update_node_attributes(identifier, &attributes)?;
            node.attributes = attributes;
            Ok(node)
        })?;

        tracing::info!(node = identifier, "node updated");
        Ok(updated)
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&self, identifier: &str) -> Result<CascadeReport> {
        require(identifier, MISSING_NODE_ID)?;

        let report = self
            .store
            .transaction(|s| CascadePlan::for_node(s, identifier)?.apply(s))?;

        tracing::info!(node = identifier, edges = report.edges_removed, "node removed");
        Ok(report)
    }

    // ========== Edge Store ==========

    /// Create an edge between two existing nodes
    pub fn create_edge(&self, source_id: &str, destination_id: &str, kind: &str) -> Result<Edge> {
        for value in [source_id, destination_id, kind] {
            require(value, MISSING_EDGE_FIELDS)?;
        }

        let edge = Edge::new(source_id, destination_id, kind);
        self.store.transaction(|s| {
            if !s.node_exists(source_id)? {
                return Err(Error::SourceNotFound(source_id.to_string()));
            }
            if !s.node_exists(destination_id)? {
                return Err(Error::DestinationNotFound(destination_id.to_string()));
            }
            s.insert_edge(&edge)
        })?;

        tracing::info!(source = source_id, destination = destination_id, kind, "edge created");
        Ok(edge)
    }

    /// Edges where the node is source or destination.
    ///
    /// Fails with `NodeNotFound` if the node is missing and with `NoEdges`
    /// if it exists but nothing touches it.
    pub fn list_edges_touching(&self, node_id: &str) -> Result<Vec<Edge>> {
        require(node_id, MISSING_NODE_ID)?;

        if !self.store.node_exists(node_id)? {
            return Err(Error::NodeNotFound(node_id.to_string()));
        }
        let edges = self.store.find_edges_touching(node_id)?;
        if edges.is_empty() {
            return Err(Error::NoEdges(node_id.to_string()));
        }
        Ok(edges)
    }

    /// Remove every edge matching the criteria. Returns the number removed.
    pub fn remove_edges(&self, criteria: &EdgeCriteria) -> Result<usize> {
        let criteria = criteria.clone().normalized();
        if criteria.is_empty() {
            return Err(Error::invalid(MISSING_CRITERIA));
        }

        let removed = self.store.transaction(|s| {
            let matching = s.find_edges_matching(&criteria)?;
            if matching.is_empty() {
                return Err(Error::NoMatchingEdges);
            }
            s.delete_edges_matching(&criteria)
        })?;

        tracing::info!(?criteria, removed, "edges removed");
        Ok(removed)
    }

    pub fn stats(&self) -> Result<DbStats> {
        self.store.stats()
    }
}
