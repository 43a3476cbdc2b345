//! Database session layer.
//!
//! This module provides:
//! - Connection target resolution (`options`)
//! - The single-session `ConnectionManager` (`session`)
//! - Statements, parameters and identifiers (`statement`)
//! - Driver-independent rows and typed records (`row`, `models`)

pub mod dialect;
pub mod models;
pub mod options;
pub mod row;
pub mod session;
pub mod statement;

pub use dialect::Dialect;
pub use models::Disease;
pub use options::{ConnectOptions, ConnectTarget};
pub use row::{Row, Value};
pub use session::ConnectionManager;
pub use statement::{Identifier, Param, Statement};
