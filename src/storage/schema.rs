//! Database schema definitions

/// Connection-level settings applied on open
pub const PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

/// SQL to create the classes table
pub const CREATE_CLASSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS classes (
    identifier TEXT PRIMARY KEY,
    attributes TEXT NOT NULL
)
"#;

/// SQL to create the nodes table
pub const CREATE_NODES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    identifier TEXT PRIMARY KEY,
    class_id TEXT NOT NULL REFERENCES classes(identifier),
    attributes TEXT NOT NULL
)
"#;

/// SQL to create the edges table
/// No uniqueness over (source_id, destination_id, type): duplicates are allowed
pub const CREATE_EDGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id TEXT NOT NULL REFERENCES nodes(identifier),
    destination_id TEXT NOT NULL REFERENCES nodes(identifier),
    type TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_nodes_class ON nodes(class_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_destination ON edges(destination_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_type ON edges(type)",
];

/// All schema creation statements, in dependency order
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_CLASSES_TABLE,
        CREATE_NODES_TABLE,
        CREATE_EDGES_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
