use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A field holds a value outside of its allowed range.
    #[error("Invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
    /// A rule has no primary key column.
    #[error("Rule for `{table}` has no primary key column")]
    MissingPrimaryKey { table: String },
    /// A rule declares more than one primary key column.
    #[error("Rule for `{table}` declares {count} primary key columns, only one is supported")]
    CompositePrimaryKey { table: String, count: usize },
    /// A rule references a column that is not part of its column list.
    #[error("Rule for `{table}` references unknown column `{column}`")]
    UnknownColumn { table: String, column: String },
    /// Two rules were configured for the same source table.
    #[error("Duplicate rule for `{table}`")]
    DuplicateRule { table: String },
}
