//! # Ativos - Dynamic Graph-Modeling Backend
//!
//! Clients define Classes (schema templates with free-form attributes),
//! instantiate Ativos (nodes) of a Class and connect them with typed
//! Vínculos (directed edges).
//!
//! Ativos provides:
//! - SQLite-backed storage for classes, nodes and edges
//! - A consistency engine that validates references and applies cascades
//!   inside a single transaction
//! - An HTTP boundary compatible with the original REST routes

pub mod attributes;
pub mod class;
pub mod node;
pub mod edge;
pub mod storage;
pub mod engine;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use attributes::AttributeBag;
pub use class::Class;
pub use node::Node;
pub use edge::{Edge, EdgeCriteria};
pub use engine::{CascadeReport, GraphEngine};
pub use storage::SqliteStore;

/// Result type alias for Ativos operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used by the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    Internal,
}

/// Error types for Ativos operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Classe não encontrada.")]
    ClassNotFound(String),

    #[error("Ativo não encontrado.")]
    NodeNotFound(String),

    #[error("Ativo de origem não encontrado.")]
    SourceNotFound(String),

    #[error("Ativo de destino não encontrado.")]
    DestinationNotFound(String),

    #[error("Nenhum ativo encontrado para esta classe.")]
    NoNodes(String),

    #[error("Nenhum vínculo encontrado para este ativo.")]
    NoEdges(String),

    #[error("Nenhum vínculo encontrado com os critérios fornecidos.")]
    NoMatchingEdges,

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::ClassNotFound(_)
            | Error::NodeNotFound(_)
            | Error::SourceNotFound(_)
            | Error::DestinationNotFound(_)
            | Error::NoNodes(_)
            | Error::NoEdges(_)
            | Error::NoMatchingEdges => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Storage(_) | Error::Serialization(_) | Error::Io(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub(crate) fn duplicate_class(identifier: &str) -> Self {
        Error::Conflict(format!("Classe '{}' já existe.", identifier))
    }

    pub(crate) fn duplicate_node(identifier: &str) -> Self {
        Error::Conflict(format!("Ativo '{}' já existe.", identifier))
    }
}
