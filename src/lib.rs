pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod inspect;
pub mod schema;

pub use config::Config;
pub use db::{ConnectOptions, ConnectTarget, ConnectionManager, Dialect, Row, Statement, Value};
pub use error::{DbError, DbResult, ErrorKind};
pub use schema::{DiseaseSeed, InitReport, Table};
