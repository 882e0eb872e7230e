use std::fmt;

use crate::types::Cell;

/// Fully qualified name of a source table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName {
    /// Schema (database) holding the table.
    pub schema: String,
    /// Table name inside the schema.
    pub name: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// One version of a row, with values ordered like the columns of its rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableRow {
    values: Vec<Cell>,
}

impl TableRow {
    /// Creates a row from values in column order.
    pub fn new(values: Vec<Cell>) -> Self {
        Self { values }
    }

    /// Returns the values in column order.
    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    /// Consumes the row and returns its values.
    pub fn into_values(self) -> Vec<Cell> {
        self.values
    }

    /// Returns the number of values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Cell>> for TableRow {
    fn from(values: Vec<Cell>) -> Self {
        Self::new(values)
    }
}
