//! SQLite storage implementation
//!
//! Row-level operations only. Reference checks, empty-result policy and
//! cascades belong to [`crate::engine::GraphEngine`].

use std::path::Path;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;
use crate::{Error, Result};
use crate::attributes::{self, AttributeBag};
use crate::class::Class;
use crate::edge::{Edge, EdgeCriteria};
use crate::node::Node;
use super::schema;

/// Upper bound on identifiers bound into a single `IN (...)` list
const ID_BATCH: usize = 500;

/// SQLite-backed storage for the class/node/edge graph
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(schema::PRAGMAS)?;
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Run `f` inside a single transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back on `Err`. Must not be nested.
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== Class Operations ==========

    /// Insert a new class. Fails with `Conflict` if the identifier is taken.
    pub fn insert_class(&self, class: &Class) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO classes (identifier, attributes) VALUES (?1, ?2)",
                params![class.identifier, attributes::to_json(&class.attributes)?],
            )
            .map_err(|e| {
                if is_primary_key_violation(&e) {
                    Error::duplicate_class(&class.identifier)
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    /// Get a class by identifier
    pub fn get_class(&self, identifier: &str) -> Result<Option<Class>> {
        self.conn
            .query_row(
                "SELECT identifier, attributes FROM classes WHERE identifier = ?1",
                [identifier],
                row_to_class,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn class_exists(&self, identifier: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM classes WHERE identifier = ?1", [identifier], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// All classes in insertion order
    pub fn list_classes(&self) -> Result<Vec<Class>> {
        let mut stmt = self
            .conn
            .prepare("SELECT identifier, attributes FROM classes ORDER BY rowid")?;

        let classes = stmt
            .query_map([], row_to_class)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(classes)
    }

    /// Delete a class row. Returns the number of rows removed.
    pub fn delete_class(&self, identifier: &str) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM classes WHERE identifier = ?1", [identifier])?)
    }

    pub fn count_classes(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM classes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Node Operations ==========

    /// Insert a new node. Fails with `Conflict` if the identifier is taken.
    pub fn insert_node(&self, node: &Node) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO nodes (identifier, class_id, attributes) VALUES (?1, ?2, ?3)",
                params![node.identifier, node.class_id, attributes::to_json(&node.attributes)?],
            )
            .map_err(|e| {
                if is_primary_key_violation(&e) {
                    Error::duplicate_node(&node.identifier)
                } else {
                    e.into()
                }
            })?;
        Ok(())
    }

    /// Get a node by identifier
    pub fn get_node(&self, identifier: &str) -> Result<Option<Node>> {
        self.conn
            .query_row(
                "SELECT identifier, class_id, attributes FROM nodes WHERE identifier = ?1",
                [identifier],
                row_to_node,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn node_exists(&self, identifier: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM nodes WHERE identifier = ?1", [identifier], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// All nodes of a class in insertion order
    pub fn find_nodes_by_class(&self, class_id: &str) -> Result<Vec<Node>> {
        let mut stmt = self.conn.prepare(
            "SELECT identifier, class_id, attributes FROM nodes WHERE class_id = ?1 ORDER BY rowid",
        )?;

        let nodes = stmt
            .query_map([class_id], row_to_node)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(nodes)
    }

    /// Identifiers of every node of a class
    pub fn node_ids_of_class(&self, class_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT identifier FROM nodes WHERE class_id = ?1 ORDER BY rowid")?;

        let ids = stmt
            .query_map([class_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(ids)
    }

    /// Replace a node's attribute bag. Returns the number of rows changed.
    pub fn update_node_attributes(&self, identifier: &str, attributes: &AttributeBag) -> Result<usize> {
        Ok(self.conn.execute(
            "UPDATE nodes SET attributes = ?2 WHERE identifier = ?1",
            params![identifier, attributes::to_json(attributes)?],
        )?)
    }

    /// Delete nodes by identifier. Returns the number of rows removed.
    pub fn delete_nodes(&self, identifiers: &[String]) -> Result<usize> {
        let mut removed = 0;
        for batch in identifiers.chunks(ID_BATCH) {
            let sql = format!("DELETE FROM nodes WHERE identifier IN ({})", placeholders(batch.len()));
            removed += self.conn.execute(&sql, params_from_iter(batch.iter()))?;
        }
        Ok(removed)
    }

    pub fn count_nodes(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ========== Edge Operations ==========

    /// Insert an edge. Duplicates of an existing triple are accepted.
    pub fn insert_edge(&self, edge: &Edge) -> Result<()> {
        self.conn.execute(
            "INSERT INTO edges (source_id, destination_id, type) VALUES (?1, ?2, ?3)",
            params![edge.source_id, edge.destination_id, edge.kind],
        )?;
        Ok(())
    }

    /// Edges where the node is source or destination
    pub fn find_edges_touching(&self, node_id: &str) -> Result<Vec<Edge>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_id, destination_id, type FROM edges
             WHERE source_id = ?1 OR destination_id = ?1
             ORDER BY id",
        )?;

        let edges = stmt
            .query_map([node_id], row_to_edge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(edges)
    }

    /// Edges matching every supplied criterion. Empty criteria match all edges.
    pub fn find_edges_matching(&self, criteria: &EdgeCriteria) -> Result<Vec<Edge>> {
        let (clause, values) = criteria_clause(criteria);
        let sql = format!(
            "SELECT source_id, destination_id, type FROM edges WHERE {} ORDER BY id",
            clause
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let edges = stmt
            .query_map(params_from_iter(values), row_to_edge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(edges)
    }

    /// Delete edges matching every supplied criterion. Returns the number removed.
    pub fn delete_edges_matching(&self, criteria: &EdgeCriteria) -> Result<usize> {
        let (clause, values) = criteria_clause(criteria);
        let sql = format!("DELETE FROM edges WHERE {}", clause);
        Ok(self.conn.execute(&sql, params_from_iter(values))?)
    }

    /// Count edges with either endpoint in `node_ids`
    pub fn count_edges_touching_any(&self, node_ids: &[String]) -> Result<usize> {
        let mut total = 0;
        for batch in node_ids.chunks(ID_BATCH) {
            let list = placeholders(batch.len());
            let sql = format!(
                "SELECT COUNT(*) FROM edges WHERE source_id IN ({list}) OR destination_id IN ({list})"
            );
            let count: i64 = self
                .conn
                .query_row(&sql, params_from_iter(batch.iter()), |row| row.get(0))?;
            total += count as usize;
        }
        Ok(total)
    }

    /// Delete edges with either endpoint in `node_ids`. Returns the number removed.
    pub fn delete_edges_touching_any(&self, node_ids: &[String]) -> Result<usize> {
        let mut removed = 0;
        for batch in node_ids.chunks(ID_BATCH) {
            let list = placeholders(batch.len());
            let sql = format!(
                "DELETE FROM edges WHERE source_id IN ({list}) OR destination_id IN ({list})"
            );
            removed += self.conn.execute(&sql, params_from_iter(batch.iter()))?;
        }
        Ok(removed)
    }

    pub fn count_edges(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            classes: self.count_classes()?,
            nodes: self.count_nodes()?,
            edges: self.count_edges()?,
        })
    }
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// `?1, ?2, ... ?n`, numbered so a list can be referenced twice in one statement
fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}

fn criteria_clause(criteria: &EdgeCriteria) -> (String, Vec<&str>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    let columns = [
        ("source_id", &criteria.source_id),
        ("destination_id", &criteria.destination_id),
        ("type", &criteria.kind),
    ];
    for (column, value) in columns {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            values.push(value);
            conditions.push(format!("{} = ?{}", column, values.len()));
        }
    }

    if conditions.is_empty() {
        ("1 = 1".to_string(), values)
    } else {
        (conditions.join(" AND "), values)
    }
}

fn attributes_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<AttributeBag> {
    let text: String = row.get(idx)?;
    attributes::from_json(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_class(row: &rusqlite::Row) -> rusqlite::Result<Class> {
    Ok(Class {
        identifier: row.get(0)?,
        attributes: attributes_column(row, 1)?,
    })
}

fn row_to_node(row: &rusqlite::Row) -> rusqlite::Result<Node> {
    Ok(Node {
        identifier: row.get(0)?,
        class_id: row.get(1)?,
        attributes: attributes_column(row, 2)?,
    })
}

fn row_to_edge(row: &rusqlite::Row) -> rusqlite::Result<Edge> {
    Ok(Edge {
        source_id: row.get(0)?,
        destination_id: row.get(1)?,
        kind: row.get(2)?,
    })
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbStats {
    pub classes: usize,
    pub nodes: usize,
    pub edges: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Classes: {}", self.classes)?;
        writeln!(f, "  Nodes: {}", self.nodes)?;
        writeln!(f, "  Edges: {}", self.edges)
    }
}
