//! Command-line interface: connection check, schema initialization and
//! table inspection.

pub mod output;

use crate::config::Config;
use crate::db::{ConnectOptions, ConnectTarget, ConnectionManager};
use crate::error::DbResult;
use crate::inspect::{self, DEFAULT_SAMPLE_LIMIT};
use crate::schema::{self, seed, Table};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ricedb - database tooling for the rice disease detection service
#[derive(Parser, Debug)]
#[command(name = "ricedb")]
#[command(
    about = "Connect to, initialize and inspect the rice disease database",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Per-invocation overrides of the connection settings. The password is
/// only ever read from the environment.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Database host (overrides DB_HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,
    /// Database user (overrides DB_USER)
    #[arg(long, global = true)]
    pub user: Option<String>,
    /// Database port (overrides DB_PORT)
    #[arg(long, global = true)]
    pub port: Option<u16>,
    /// Database name (overrides DB_NAME)
    #[arg(long, global = true)]
    pub database: Option<String>,
}

impl ConnectionArgs {
    pub fn to_options(&self) -> ConnectOptions {
        ConnectOptions {
            host: self.host.clone(),
            user: self.user.clone(),
            password: None,
            database: self.database.clone(),
            port: self.port,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open and close a session, printing the server version
    Check,

    /// Create the database, tables and seed diseases (safe to repeat)
    Init {
        /// JSON file with the disease seed list (overrides SEED_FILE)
        #[arg(long)]
        seed_file: Option<PathBuf>,
    },

    /// Show row counts, sample rows and columns of the application tables
    Inspect {
        /// Table to inspect; repeatable (default: all tables)
        #[arg(long = "table")]
        tables: Vec<Table>,
        /// Number of sample rows per table
        #[arg(long, default_value_t = DEFAULT_SAMPLE_LIMIT)]
        limit: u32,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run a read-only query and print the rows
    Query {
        /// SQL text with `?` placeholders
        sql: String,
        /// Placeholder value, bound in order; repeatable
        #[arg(long = "param")]
        params: Vec<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI.
pub async fn run(cli: Cli, config: &Config) -> Result<()> {
    let target = cli
        .connection
        .to_options()
        .resolve(config)
        .context("Invalid connection settings")?;

    match cli.command {
        Command::Check => check(target).await,

        Command::Init { seed_file } => {
            let seed_path = seed_file.or_else(|| config.seed_file.clone());
            let seeds = seed::resolve_seeds(seed_path.as_deref())
                .context("Failed to load disease seed data")?;
            let report = schema::initialize(&target, &seeds)
                .await
                .context("Error initializing database")?;
            println!("{}", output::format_init_report(&report));
            Ok(())
        }

        Command::Inspect {
            tables,
            limit,
            json,
        } => {
            let tables = if tables.is_empty() {
                Table::ALL.to_vec()
            } else {
                tables
            };

            let mut manager = open(target).await?;
            let mut summaries = Vec::with_capacity(tables.len());
            let mut result: Result<()> = Ok(());
            for table in tables {
                match inspect::summarize(&mut manager, table, limit).await {
                    Ok(summary) => summaries.push(summary),
                    Err(e) => {
                        result = Err(e).with_context(|| format!("Failed to inspect {}", table));
                        break;
                    }
                }
            }
            let closed = manager.disconnect().await;
            finish(result, closed)?;

            if json {
                println!("{}", output::to_json(&summaries)?);
            } else {
                let text: Vec<String> = summaries.iter().map(output::format_summary).collect();
                println!("{}", text.join("\n"));
            }
            Ok(())
        }

        Command::Query { sql, params, json } => {
            let mut manager = open(target).await?;
            let rows = inspect::query(&mut manager, &sql, &params)
                .await
                .context("Error fetching data");
            let closed = manager.disconnect().await;
            let rows = finish(rows, closed)?;

            if json {
                println!("{}", output::to_json(&rows)?);
            } else {
                println!("{}", output::format_rows(&rows));
            }
            Ok(())
        }
    }
}

async fn open(target: ConnectTarget) -> Result<ConnectionManager> {
    let mut manager = ConnectionManager::new(target);
    manager
        .connect()
        .await
        .with_context(|| format!("Error while connecting to {}", manager.target()))?;
    Ok(manager)
}

/// The operation's own failure wins over a failure to close afterwards.
fn finish<T>(outcome: Result<T>, closed: DbResult<()>) -> Result<T> {
    let value = outcome?;
    closed.context("Error closing database session")?;
    Ok(value)
}

async fn check(target: ConnectTarget) -> Result<()> {
    let mut manager = ConnectionManager::new(target);
    let version = manager
        .connect()
        .await
        .context("Database connection test failed")?;
    println!("{}", output::format_connected(manager.target(), &version));
    manager.disconnect().await?;
    println!("\n✓ Database connection test successful!");
    Ok(())
}
