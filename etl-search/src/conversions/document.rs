//! Builds document operations from replicated rows.
//!
//! Every builder validates the whole input before returning: a failing row aborts the call and no
//! partial result is produced. Within one call, operations keep the order of the input rows, and a
//! primary key change inside an update yields the delete of the old id immediately followed by the
//! upsert of the new id.

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::rule::Rule;
use crate::types::{Cell, ChangeKind, Document, DocumentAction, DocumentOperation, TableRow};

/// Builds the operations for a row change of the given kind.
///
/// For [`ChangeKind::Update`], `rows` must hold `(before, after)` pairs.
pub fn build_operations(
    rule: &Rule,
    kind: ChangeKind,
    rows: Vec<TableRow>,
) -> EtlResult<Vec<DocumentOperation>> {
    match kind {
        ChangeKind::Insert => build_insert_operations(rule, rows),
        ChangeKind::Delete => build_delete_operations(rule, rows),
        ChangeKind::Update => build_update_operations(rule, rows),
    }
}

/// Builds one upsert per inserted row.
pub fn build_insert_operations(
    rule: &Rule,
    rows: Vec<TableRow>,
) -> EtlResult<Vec<DocumentOperation>> {
    let mut operations = Vec::with_capacity(rows.len());

    for row in rows {
        check_row_schema(rule, &row)?;
        let id = resolve_document_id(rule, &row)?;
        operations.push(upsert_operation(rule, id, row));
    }

    Ok(operations)
}

/// Builds one delete per deleted row.
pub fn build_delete_operations(
    rule: &Rule,
    rows: Vec<TableRow>,
) -> EtlResult<Vec<DocumentOperation>> {
    let mut operations = Vec::with_capacity(rows.len());

    for row in rows {
        check_row_schema(rule, &row)?;
        let id = resolve_document_id(rule, &row)?;
        operations.push(delete_operation(rule, id));
    }

    Ok(operations)
}

/// Builds the operations for `(before, after)` row pairs.
///
/// An unchanged primary key yields a single upsert of the after row. A changed primary key yields
/// a delete of the before id followed by an upsert of the after row under the after id.
pub fn build_update_operations(
    rule: &Rule,
    rows: Vec<TableRow>,
) -> EtlResult<Vec<DocumentOperation>> {
    if rows.len() % 2 != 0 {
        bail!(
            ErrorKind::MalformedUpdate,
            "Update rows must come in before and after pairs",
            format!("{} received {} rows", rule.table(), rows.len())
        );
    }

    let mut operations = Vec::with_capacity(rows.len());
    let mut rows = rows.into_iter();

    while let (Some(before), Some(after)) = (rows.next(), rows.next()) {
        check_row_schema(rule, &before)?;
        check_row_schema(rule, &after)?;

        let before_id = resolve_document_id(rule, &before)?;
        let after_id = resolve_document_id(rule, &after)?;

        if before_id != after_id {
            operations.push(delete_operation(rule, before_id));
        }

        operations.push(upsert_operation(rule, after_id, after));
    }

    Ok(operations)
}

/// Returns the document id of `row`: its primary key value, stringified.
///
/// Fails with [`ErrorKind::MissingKey`] when the key is null or renders to an empty string.
pub fn resolve_document_id(rule: &Rule, row: &TableRow) -> EtlResult<String> {
    let value = row
        .values()
        .get(rule.primary_key_position())
        .unwrap_or(&Cell::Null);

    if value.is_null() {
        bail!(
            ErrorKind::MissingKey,
            "Primary key value is null",
            format!("{} row {:?}", rule.table(), row.values())
        );
    }

    let id = value.to_string();
    if id.is_empty() {
        bail!(
            ErrorKind::MissingKey,
            "Primary key value is empty",
            format!("{} row {:?}", rule.table(), row.values())
        );
    }

    Ok(id)
}

fn check_row_schema(rule: &Rule, row: &TableRow) -> EtlResult<()> {
    if row.len() != rule.column_count() {
        bail!(
            ErrorKind::SchemaMismatch,
            "Row does not match the rule columns",
            format!(
                "{} has {} columns, but the row has {} values",
                rule.table(),
                rule.column_count(),
                row.len()
            )
        );
    }

    Ok(())
}

fn upsert_operation(rule: &Rule, id: String, row: TableRow) -> DocumentOperation {
    DocumentOperation {
        index: rule.index().to_string(),
        type_name: rule.type_name().to_string(),
        id,
        action: DocumentAction::Upsert(build_document(rule, row)),
    }
}

fn delete_operation(rule: &Rule, id: String) -> DocumentOperation {
    DocumentOperation {
        index: rule.index().to_string(),
        type_name: rule.type_name().to_string(),
        id,
        action: DocumentAction::Delete,
    }
}

/// Builds the document of `row`, dropping null values and renaming fields through the rule.
fn build_document(rule: &Rule, row: TableRow) -> Document {
    rule.columns()
        .iter()
        .zip(row.into_values())
        .filter(|(_, value)| !value.is_null())
        .map(|(column, value)| (rule.field_name(column).to_string(), value))
        .collect()
}
