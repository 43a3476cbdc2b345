//! Table definitions for each dialect.
//!
//! Both variants declare the same columns and constraints; SQLite gets
//! `INTEGER PRIMARY KEY AUTOINCREMENT` where MySQL uses `AUTO_INCREMENT`.

use super::Table;
use crate::db::Dialect;

const MYSQL_DISEASES: &str = r#"
CREATE TABLE IF NOT EXISTS diseases (
    id INT AUTO_INCREMENT PRIMARY KEY,
    name VARCHAR(100) NOT NULL UNIQUE,
    description TEXT,
    symptoms VARCHAR(500),
    treatment VARCHAR(500),
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

const MYSQL_PREDICTIONS: &str = r#"
CREATE TABLE IF NOT EXISTS predictions (
    id INT AUTO_INCREMENT PRIMARY KEY,
    image_filename VARCHAR(255),
    disease_id INT,
    confidence_score FLOAT,
    predicted_class VARCHAR(100),
    prediction_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (disease_id) REFERENCES diseases(id)
)
"#;

const MYSQL_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INT AUTO_INCREMENT PRIMARY KEY,
    username VARCHAR(100) NOT NULL UNIQUE,
    email VARCHAR(100) NOT NULL UNIQUE,
    password_hash VARCHAR(255),
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

const SQLITE_DISEASES: &str = r#"
CREATE TABLE IF NOT EXISTS diseases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR(100) NOT NULL UNIQUE,
    description TEXT,
    symptoms VARCHAR(500),
    treatment VARCHAR(500),
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

const SQLITE_PREDICTIONS: &str = r#"
CREATE TABLE IF NOT EXISTS predictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    image_filename VARCHAR(255),
    disease_id INTEGER,
    confidence_score FLOAT,
    predicted_class VARCHAR(100),
    prediction_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (disease_id) REFERENCES diseases(id)
)
"#;

const SQLITE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username VARCHAR(100) NOT NULL UNIQUE,
    email VARCHAR(100) NOT NULL UNIQUE,
    password_hash VARCHAR(255),
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

pub fn create_table(dialect: Dialect, table: Table) -> &'static str {
    match (dialect, table) {
        (Dialect::MySql, Table::Diseases) => MYSQL_DISEASES,
        (Dialect::MySql, Table::Predictions) => MYSQL_PREDICTIONS,
        (Dialect::MySql, Table::Users) => MYSQL_USERS,
        (Dialect::Sqlite, Table::Diseases) => SQLITE_DISEASES,
        (Dialect::Sqlite, Table::Predictions) => SQLITE_PREDICTIONS,
        (Dialect::Sqlite, Table::Users) => SQLITE_USERS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_is_idempotent() {
        for dialect in [Dialect::MySql, Dialect::Sqlite] {
            for table in Table::ALL {
                let ddl = create_table(dialect, table);
                assert!(ddl.contains("CREATE TABLE IF NOT EXISTS"));
                assert!(ddl.contains(table.name()));
            }
        }
    }
}
