//! Idempotent schema initialization.
//!
//! Creates the database (MySQL only), the `diseases`, `predictions` and
//! `users` tables, and seeds the disease list. Every step is safe to repeat.

pub mod ddl;
pub mod seed;

use crate::db::{ConnectTarget, ConnectionManager, Identifier, Statement};
use crate::error::{DbError, DbResult};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::info;

pub use seed::{DiseaseSeed, SeedError};

/// The tables this crate knows about. Table names reach SQL text only
/// through this allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Diseases,
    Predictions,
    Users,
}

impl Table {
    /// Creation order: `predictions` references `diseases`.
    pub const ALL: [Table; 3] = [Table::Diseases, Table::Predictions, Table::Users];

    pub fn name(self) -> &'static str {
        match self {
            Table::Diseases => "diseases",
            Table::Predictions => "predictions",
            Table::Users => "users",
        }
    }

    /// Columns shown when sampling rows. Timestamps are left out.
    pub fn display_columns(self) -> &'static [&'static str] {
        match self {
            Table::Diseases => &["id", "name", "symptoms", "treatment"],
            Table::Predictions => &[
                "id",
                "image_filename",
                "disease_id",
                "confidence_score",
                "predicted_class",
            ],
            Table::Users => &["id", "username", "email"],
        }
    }

    pub fn identifier(self) -> Identifier {
        Identifier::trusted(self.name())
    }
}

impl FromStr for Table {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DbError::InvalidIdentifier(s.to_string()))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitReport {
    /// Database created (or confirmed) on the server; `None` for SQLite.
    pub database: Option<String>,
    pub tables: Vec<Table>,
    pub seeds_inserted: u64,
    pub seeds_skipped: u64,
}

/// Create the target's database if the backend has server-side databases.
///
/// Returns the database name when a `CREATE DATABASE` was issued.
pub async fn ensure_database(target: &ConnectTarget) -> DbResult<Option<String>> {
    let (Some(server), Some(database)) = (target.server_only(), target.database()) else {
        return Ok(None);
    };

    let mut manager = ConnectionManager::new(server);
    manager.connect().await?;
    let sql = format!(
        "CREATE DATABASE IF NOT EXISTS {}",
        database.quoted(target.dialect())
    );
    let result = manager.execute(sql).await;
    let closed = manager.disconnect().await;
    result?;
    closed?;

    info!(database = database.as_str(), "database created or already exists");
    Ok(Some(database.as_str().to_string()))
}

/// Create the tables and seed diseases over an open session.
pub async fn apply_schema(
    manager: &mut ConnectionManager,
    seeds: &[DiseaseSeed],
) -> DbResult<InitReport> {
    let dialect = manager.dialect();

    for table in Table::ALL {
        manager.execute(ddl::create_table(dialect, table)).await?;
        info!(table = table.name(), "table created or already exists");
    }

    let seeds_inserted = seed_diseases(manager, seeds).await?;
    let seeds_skipped = (seeds.len() as u64).saturating_sub(seeds_inserted);
    info!(
        inserted = seeds_inserted,
        skipped = seeds_skipped,
        "disease seed data applied"
    );

    Ok(InitReport {
        database: manager.target().database().map(|d| d.as_str().to_string()),
        tables: Table::ALL.to_vec(),
        seeds_inserted,
        seeds_skipped,
    })
}

/// Insert every seed whose name is not present yet, in one transaction.
/// Returns the number of rows inserted.
pub async fn seed_diseases(
    manager: &mut ConnectionManager,
    seeds: &[DiseaseSeed],
) -> DbResult<u64> {
    if seeds.is_empty() {
        return Ok(0);
    }

    let sql = format!(
        "{} diseases (name, description, symptoms, treatment) VALUES (?, ?, ?, ?)",
        manager.dialect().insert_ignore()
    );
    let statements: Vec<Statement> = seeds
        .iter()
        .map(|seed| {
            Statement::new(sql.as_str())
                .bind(seed.name.as_str())
                .bind(seed.description.clone())
                .bind(seed.symptoms.clone())
                .bind(seed.treatment.clone())
        })
        .collect();

    let counts = manager.execute_batch(&statements).await?;
    Ok(counts.into_iter().sum())
}

/// Full initialization: database, tables, seeds. The session opened here is
/// closed again whether or not the steps succeed.
pub async fn initialize(target: &ConnectTarget, seeds: &[DiseaseSeed]) -> DbResult<InitReport> {
    ensure_database(target).await?;

    let mut manager = ConnectionManager::new(target.clone());
    manager.connect().await?;
    let report = apply_schema(&mut manager, seeds).await;
    let closed = manager.disconnect().await;
    let report = report?;
    closed?;

    info!("database initialization completed");
    Ok(report)
}
