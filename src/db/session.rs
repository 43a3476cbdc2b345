//! The connection manager: one owned session and the statements run on it.

use crate::db::dialect::Dialect;
use crate::db::options::ConnectTarget;
use crate::db::row::Row;
use crate::db::statement::Statement;
use crate::error::{DbError, DbResult};
use sqlx::any::{AnyQueryResult, AnyRow};
use sqlx::{AnyConnection, Connection, Executor, Row as _};
use tracing::{error, info, warn};

enum SessionState {
    Disconnected,
    Connected(AnyConnection),
}

/// Owns at most one database session.
///
/// Every operation takes `&mut self`, so a manager serves one flow of control
/// at a time. Callers needing parallel access open several managers.
pub struct ConnectionManager {
    target: ConnectTarget,
    state: SessionState,
}

impl ConnectionManager {
    pub fn new(target: ConnectTarget) -> Self {
        ConnectionManager {
            target,
            state: SessionState::Disconnected,
        }
    }

    pub fn target(&self) -> &ConnectTarget {
        &self.target
    }

    pub fn dialect(&self) -> Dialect {
        self.target.dialect()
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected(_))
    }

    /// Establish the session and return the server version.
    ///
    /// On failure the manager stays disconnected. Calling this on a connected
    /// manager is rejected and leaves the live session untouched.
    pub async fn connect(&mut self) -> DbResult<String> {
        if self.is_connected() {
            warn!(db = %self.target, "connect called on an open session");
            return Err(DbError::AlreadyConnected);
        }

        sqlx::any::install_default_drivers();

        let mut conn = match AnyConnection::connect(self.target.url()).await {
            Ok(conn) => conn,
            Err(e) => {
                error!(db = %self.target, error = %e, "failed to connect to database");
                return Err(DbError::from_connect(e));
            }
        };

        let version = match prepare_session(&mut conn, self.target.dialect()).await {
            Ok(version) => version,
            Err(e) => {
                error!(db = %self.target, error = %e, "failed to prepare database session");
                let _ = conn.close().await;
                return Err(DbError::from_connect(e));
            }
        };

        info!(
            db = %self.target,
            dialect = %self.target.dialect(),
            server_version = %version,
            "connected to database"
        );
        self.state = SessionState::Connected(conn);
        Ok(version)
    }

    /// Close the session. Does nothing when there is none.
    ///
    /// The manager is disconnected afterwards even if the driver reports an
    /// error while closing.
    pub async fn disconnect(&mut self) -> DbResult<()> {
        let conn = match std::mem::replace(&mut self.state, SessionState::Disconnected) {
            SessionState::Connected(conn) => conn,
            SessionState::Disconnected => return Ok(()),
        };

        match conn.close().await {
            Ok(()) => {
                info!(db = %self.target, "database session closed");
                Ok(())
            }
            Err(e) => {
                warn!(db = %self.target, error = %e, "error while closing database session");
                Err(DbError::Connection(e))
            }
        }
    }

    /// Run a mutating statement in its own transaction and return the
    /// number of affected rows. Rolls back on failure.
    pub async fn execute(&mut self, statement: impl Into<Statement>) -> DbResult<u64> {
        let statement = statement.into();
        let counts = self.execute_batch(std::slice::from_ref(&statement)).await?;
        Ok(counts.into_iter().next().unwrap_or(0))
    }

    /// Run several mutating statements in one transaction.
    ///
    /// Either every statement commits or none does. Returns the affected row
    /// count of each statement, in order.
    pub async fn execute_batch(&mut self, statements: &[Statement]) -> DbResult<Vec<u64>> {
        for statement in statements {
            self.ensure_single(statement)?;
        }
        let conn = self.connection()?;

        let mut tx = conn.begin().await.map_err(|e| {
            error!(error = %e, "failed to begin transaction");
            DbError::from_statement(e)
        })?;

        let mut counts = Vec::with_capacity(statements.len());
        for statement in statements {
            match run(&mut *tx, statement).await {
                Ok(result) => counts.push(result.rows_affected()),
                Err(e) => {
                    error!(sql = %statement.sql(), error = %e, "error executing statement");
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!(error = %rollback_err, "rollback failed");
                    } else {
                        warn!("transaction rolled back");
                    }
                    return Err(DbError::from_statement(e));
                }
            }
        }

        tx.commit().await.map_err(|e| {
            error!(error = %e, "failed to commit transaction");
            DbError::from_statement(e)
        })?;

        info!(
            statements = statements.len(),
            rows_affected = counts.iter().sum::<u64>(),
            "statements committed"
        );
        Ok(counts)
    }

    /// Run a read statement and return every row. An empty result is
    /// `Ok(vec![])`.
    ///
    /// The statement runs with the session in read-only mode, so writes fail
    /// and leave the data untouched.
    pub async fn fetch_all(&mut self, statement: impl Into<Statement>) -> DbResult<Vec<Row>> {
        let statement = statement.into();
        self.ensure_single(&statement)?;
        let dialect = self.dialect();
        let conn = self.connection()?;

        enter_read_only(conn, dialect).await?;
        let rows = fetch_rows(conn, &statement).await;
        let restored = leave_read_only(conn, dialect).await;

        let rows = rows.map_err(|e| {
            error!(sql = %statement.sql(), error = %e, "error fetching data");
            DbError::from_statement(e)
        })?;
        restored?;
        rows.iter().map(Row::from_any).collect()
    }

    /// Run a read statement and return its first row, if any. Read-only like
    /// [`fetch_all`](Self::fetch_all).
    pub async fn fetch_one(&mut self, statement: impl Into<Statement>) -> DbResult<Option<Row>> {
        let statement = statement.into();
        self.ensure_single(&statement)?;
        let dialect = self.dialect();
        let conn = self.connection()?;

        enter_read_only(conn, dialect).await?;
        let row = fetch_optional_row(conn, &statement).await;
        let restored = leave_read_only(conn, dialect).await;

        let row = row.map_err(|e| {
            error!(sql = %statement.sql(), error = %e, "error fetching data");
            DbError::from_statement(e)
        })?;
        restored?;
        row.as_ref().map(Row::from_any).transpose()
    }

    fn ensure_single(&self, statement: &Statement) -> DbResult<()> {
        if self.dialect().is_single_statement(statement.sql()) {
            Ok(())
        } else {
            warn!(sql = %statement.sql(), "rejected text holding several statements");
            Err(DbError::MultipleStatements(statement.sql().to_string()))
        }
    }

    fn connection(&mut self) -> DbResult<&mut AnyConnection> {
        match &mut self.state {
            SessionState::Connected(conn) => Ok(conn),
            SessionState::Disconnected => {
                warn!(db = %self.target, "statement issued on a closed session");
                Err(DbError::NotConnected)
            }
        }
    }
}

// Statements without parameters go over the plain text protocol: MySQL
// refuses some DDL (e.g. CREATE DATABASE) as prepared statements.
async fn run(
    conn: &mut AnyConnection,
    statement: &Statement,
) -> Result<AnyQueryResult, sqlx::Error> {
    if statement.params().is_empty() {
        conn.execute(statement.sql()).await
    } else {
        statement.to_query().execute(conn).await
    }
}

async fn fetch_rows(
    conn: &mut AnyConnection,
    statement: &Statement,
) -> Result<Vec<AnyRow>, sqlx::Error> {
    if statement.params().is_empty() {
        conn.fetch_all(statement.sql()).await
    } else {
        statement.to_query().fetch_all(conn).await
    }
}

async fn fetch_optional_row(
    conn: &mut AnyConnection,
    statement: &Statement,
) -> Result<Option<AnyRow>, sqlx::Error> {
    if statement.params().is_empty() {
        conn.fetch_optional(statement.sql()).await
    } else {
        statement.to_query().fetch_optional(conn).await
    }
}

async fn enter_read_only(conn: &mut AnyConnection, dialect: Dialect) -> DbResult<()> {
    let (enter, _) = dialect.read_only_guard();
    conn.execute(enter).await.map(|_| ()).map_err(|e| {
        error!(error = %e, "failed to enter read-only mode");
        DbError::from_statement(e)
    })
}

async fn leave_read_only(conn: &mut AnyConnection, dialect: Dialect) -> DbResult<()> {
    let (_, leave) = dialect.read_only_guard();
    conn.execute(leave).await.map(|_| ()).map_err(|e| {
        error!(error = %e, "failed to leave read-only mode");
        DbError::from_statement(e)
    })
}

async fn prepare_session(
    conn: &mut AnyConnection,
    dialect: Dialect,
) -> Result<String, sqlx::Error> {
    if dialect == Dialect::Sqlite {
        configure_sqlite(conn).await?;
    }
    let row = sqlx::query(dialect.server_version_query())
        .fetch_one(&mut *conn)
        .await?;
    row.try_get::<String, _>(0)
}

/// Session settings SQLite needs for the schema to behave like MySQL.
async fn configure_sqlite(conn: &mut AnyConnection) -> Result<(), sqlx::Error> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&mut *conn)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&mut *conn)
        .await?;
    Ok(())
}
