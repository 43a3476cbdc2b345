//! Read-only inspection of the application tables.

use crate::db::{ConnectionManager, Disease, Param, Row, Statement};
use crate::error::{DbError, DbResult};
use crate::schema::Table;
use serde::Serialize;

pub const DEFAULT_SAMPLE_LIMIT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub table: Table,
    pub row_count: i64,
    pub columns: Vec<ColumnInfo>,
    pub sample: Vec<Row>,
}

pub async fn row_count(manager: &mut ConnectionManager, table: Table) -> DbResult<i64> {
    let sql = format!(
        "SELECT COUNT(*) AS row_count FROM {}",
        table.identifier().quoted(manager.dialect())
    );
    let row = manager
        .fetch_one(sql)
        .await?
        .ok_or_else(|| DbError::Decode("COUNT(*) returned no row".to_string()))?;
    row.try_i64("row_count")
}

/// Up to `limit` rows of the table's display columns, in id order.
pub async fn sample_rows(
    manager: &mut ConnectionManager,
    table: Table,
    limit: u32,
) -> DbResult<Vec<Row>> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY id LIMIT ?",
        table.display_columns().join(", "),
        table.identifier().quoted(manager.dialect())
    );
    manager
        .fetch_all(Statement::new(sql).bind(i64::from(limit)))
        .await
}

/// Column names and declared types, in table order.
pub async fn columns(manager: &mut ConnectionManager, table: Table) -> DbResult<Vec<ColumnInfo>> {
    let quoted = table.identifier().quoted(manager.dialect());
    let (sql, name_idx, type_idx) = manager.dialect().column_listing(&quoted);

    let rows = manager.fetch_all(sql).await?;
    rows.iter()
        .map(|row| {
            let name = row.get(name_idx).and_then(|v| v.as_text());
            let data_type = row.get(type_idx).and_then(|v| v.as_text());
            match (name, data_type) {
                (Some(name), Some(data_type)) => Ok(ColumnInfo { name, data_type }),
                _ => Err(DbError::Decode(format!(
                    "unexpected column listing row for {}",
                    table
                ))),
            }
        })
        .collect()
}

pub async fn summarize(
    manager: &mut ConnectionManager,
    table: Table,
    limit: u32,
) -> DbResult<TableSummary> {
    Ok(TableSummary {
        table,
        row_count: row_count(manager, table).await?,
        columns: columns(manager, table).await?,
        sample: sample_rows(manager, table, limit).await?,
    })
}

pub async fn list_diseases(manager: &mut ConnectionManager) -> DbResult<Vec<Disease>> {
    let rows = manager
        .fetch_all("SELECT id, name, description, symptoms, treatment FROM diseases ORDER BY id")
        .await?;
    rows.iter().map(Disease::try_from).collect()
}

pub async fn find_disease(manager: &mut ConnectionManager, name: &str) -> DbResult<Option<Disease>> {
    manager
        .fetch_one(
            Statement::new(
                "SELECT id, name, description, symptoms, treatment FROM diseases WHERE name = ?",
            )
            .bind(name),
        )
        .await?
        .as_ref()
        .map(Disease::try_from)
        .transpose()
}

/// Run an arbitrary read query with text parameters.
pub async fn query(
    manager: &mut ConnectionManager,
    sql: &str,
    params: &[String],
) -> DbResult<Vec<Row>> {
    let params = params.iter().map(|p| Param::Text(p.clone())).collect();
    manager
        .fetch_all(Statement::new(sql).with_params(params))
        .await
}
