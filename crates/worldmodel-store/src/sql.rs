//! Dynamic column/value statement builder.
//!
//! Maps an [`Entity`] field map onto a parameterized `INSERT` or
//! `UPDATE`. Field names are validated against the table's fixed column
//! allow-list and double-quoted before they reach statement text, and
//! every value – timestamp fields included – is bound as a positional
//! parameter, so no caller-controlled data is ever concatenated into
//! SQL.
//!
//! Timestamp columns take Unix epoch seconds as a numeric value
//! ([`FieldValue::Real`], or [`FieldValue::Int`] for whole seconds); the
//! builder emits a `to_timestamp($n)` expression with the seconds value
//! bound at `$n`.

use std::fmt::Write as _;

use tokio_postgres::types::ToSql;
use worldmodel_types::{Entity, FieldValue};

use crate::error::{Result, WorldModelError};

/// Static description of one world model table: name, identity column
/// and its sequence, the column allow-list, and which columns are
/// timestamps.
pub(crate) struct TableSpec {
    pub table: &'static str,
    pub id_column: &'static str,
    pub sequence: &'static str,
    pub columns: &'static [&'static str],
    pub timestamps: &'static [&'static str],
}

impl TableSpec {
    fn check_column(&self, name: &str) -> Result<()> {
        if self.columns.contains(&name) {
            Ok(())
        } else {
            Err(WorldModelError::UnknownColumn {
                table: self.table,
                column: name.to_string(),
            })
        }
    }

    fn is_timestamp(&self, name: &str) -> bool {
        self.timestamps.contains(&name)
    }
}

/// Statement text plus the bound values it references, aligned with the
/// placeholders in order. Borrows the values from the entity it was
/// built from.
pub(crate) struct BoundStatement<'a> {
    pub sql: String,
    pub params: Vec<&'a (dyn ToSql + Sync)>,
}

impl std::fmt::Debug for BoundStatement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Bound values are type-erased; show how many there are, not
        // what they hold.
        f.debug_struct("BoundStatement")
            .field("sql", &self.sql)
            .field("params", &self.params.len())
            .finish()
    }
}

/// Borrow a field value as a bindable SQL parameter.
fn bind_value(value: &FieldValue) -> &(dyn ToSql + Sync) {
    match value {
        FieldValue::Int(v) => v,
        FieldValue::Real(v) => v,
        FieldValue::Text(v) => v,
        FieldValue::Bytes(v) => v,
        FieldValue::TextArray(v) => v,
        FieldValue::Json(v) => v,
        FieldValue::Oid(v) => v,
    }
}

/// Walk the entity once, producing the aligned column list, placeholder
/// list, and parameter list. The identity column is skipped; every other
/// field must be in the allow-list.
fn columns_and_holders<'a>(
    spec: &TableSpec,
    entity: &'a Entity,
) -> Result<(Vec<&'a str>, Vec<String>, Vec<&'a (dyn ToSql + Sync)>)> {
    let mut cols = Vec::new();
    let mut holders = Vec::new();
    let mut params: Vec<&'a (dyn ToSql + Sync)> = Vec::new();

    for (name, value) in entity.iter() {
        // The identity column is assigned by the sequence, never by the
        // caller.
        if name == spec.id_column {
            continue;
        }
        spec.check_column(name)?;

        let n = params.len() + 1;
        if spec.is_timestamp(name) {
            match value {
                FieldValue::Real(seconds) => {
                    holders.push(format!("to_timestamp(${n})"));
                    params.push(seconds);
                }
                // Whole-second epochs; the cast pins the parameter's
                // type so the engine coerces it for to_timestamp.
                FieldValue::Int(seconds) => {
                    holders.push(format!("to_timestamp(${n}::bigint)"));
                    params.push(seconds);
                }
                _ => {
                    return Err(WorldModelError::InvalidTimestamp {
                        column: name.to_string(),
                    });
                }
            }
        } else {
            holders.push(format!("${n}"));
            params.push(bind_value(value));
        }
        cols.push(name);
    }

    if cols.is_empty() {
        return Err(WorldModelError::EmptyEntity { table: spec.table });
    }
    Ok((cols, holders, params))
}

/// Build `INSERT INTO t ("id", "c1", …) VALUES (nextval('seq'), $1, …)
/// RETURNING "id"` for the entity's fields.
pub(crate) fn insert_statement<'a>(
    spec: &TableSpec,
    entity: &'a Entity,
) -> Result<BoundStatement<'a>> {
    let (cols, holders, params) = columns_and_holders(spec, entity)?;

    let mut sql = format!("INSERT INTO {} (\"{}\"", spec.table, spec.id_column);
    for col in &cols {
        let _ = write!(sql, ", \"{col}\"");
    }
    let _ = write!(sql, ") VALUES (nextval('{}')", spec.sequence);
    for holder in &holders {
        let _ = write!(sql, ", {holder}");
    }
    let _ = write!(sql, ") RETURNING \"{}\"", spec.id_column);

    Ok(BoundStatement { sql, params })
}

/// Build `UPDATE t SET "c1" = $1, … WHERE "id" = $n` for the entity's
/// fields. The identity value is *not* bound here – the caller appends
/// it as the final parameter.
pub(crate) fn update_statement<'a>(
    spec: &TableSpec,
    entity: &'a Entity,
) -> Result<BoundStatement<'a>> {
    let (cols, holders, params) = columns_and_holders(spec, entity)?;

    let mut sql = format!("UPDATE {} SET ", spec.table);
    for (i, (col, holder)) in cols.iter().zip(&holders).enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        let _ = write!(sql, "\"{col}\" = {holder}");
    }
    let _ = write!(sql, " WHERE \"{}\" = ${}", spec.id_column, params.len() + 1);

    Ok(BoundStatement { sql, params })
}

/// Build `SELECT <columns> FROM t WHERE "tags" @> $1` – conjunctive tag
/// containment over the row's tag array, with the requested tags bound
/// as a single `text[]` parameter.
pub(crate) fn tags_query(spec: &TableSpec, select_columns: &str) -> String {
    format!(
        "SELECT {select_columns} FROM {} WHERE \"tags\" @> $1",
        spec.table
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
