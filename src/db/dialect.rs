//! Backend-specific SQL fragments.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Sqlite,
}

impl Dialect {
    /// Pick the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_ascii_lowercase();
        match scheme.as_str() {
            "mysql" | "mariadb" => Some(Dialect::MySql),
            "sqlite" => Some(Dialect::Sqlite),
            _ => None,
        }
    }

    pub fn server_version_query(self) -> &'static str {
        match self {
            Dialect::MySql => "SELECT VERSION()",
            Dialect::Sqlite => "SELECT sqlite_version()",
        }
    }

    /// `INSERT` prefix that silently skips rows hitting a unique key.
    pub fn insert_ignore(self) -> &'static str {
        match self {
            Dialect::MySql => "INSERT IGNORE INTO",
            Dialect::Sqlite => "INSERT OR IGNORE INTO",
        }
    }

    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", name),
            Dialect::Sqlite => format!("\"{}\"", name),
        }
    }

    /// Whether databases are created with `CREATE DATABASE` on the server.
    pub fn has_server_databases(self) -> bool {
        matches!(self, Dialect::MySql)
    }

    /// Query listing a table's columns, and the result positions of the
    /// column name and declared type.
    pub fn column_listing(self, quoted_table: &str) -> (String, usize, usize) {
        match self {
            Dialect::MySql => (format!("SHOW COLUMNS FROM {}", quoted_table), 0, 1),
            Dialect::Sqlite => (format!("PRAGMA table_info({})", quoted_table), 1, 2),
        }
    }

    /// Statements switching the session into read-only mode and back.
    pub fn read_only_guard(self) -> (&'static str, &'static str) {
        match self {
            Dialect::MySql => ("START TRANSACTION READ ONLY", "ROLLBACK"),
            Dialect::Sqlite => ("PRAGMA query_only = ON", "PRAGMA query_only = OFF"),
        }
    }

    /// Whether `sql` holds at most one statement. Quoted text and comments
    /// are skipped; a trailing `;` is allowed.
    pub fn is_single_statement(self, sql: &str) -> bool {
        let mysql = matches!(self, Dialect::MySql);
        let mut chars = sql.chars().peekable();
        let mut terminated = false;

        while let Some(c) = chars.next() {
            match c {
                '\'' | '"' | '`' => {
                    if terminated {
                        return false;
                    }
                    while let Some(q) = chars.next() {
                        if q == '\\' && mysql && c != '`' {
                            chars.next();
                        } else if q == c {
                            break;
                        }
                    }
                }
                '-' if chars.peek() == Some(&'-') => skip_line(&mut chars),
                '#' if mysql => skip_line(&mut chars),
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    while let Some(x) = chars.next() {
                        if x == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            break;
                        }
                    }
                }
                ';' => terminated = true,
                c if c.is_whitespace() => {}
                _ if terminated => return false,
                _ => {}
            }
        }
        true
    }
}

fn skip_line(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    for c in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::MySql => write!(f, "mysql"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url() {
        assert_eq!(
            Dialect::from_url("mysql://root@127.0.0.1:3306/rice"),
            Some(Dialect::MySql)
        );
        assert_eq!(
            Dialect::from_url("MariaDB://db/rice"),
            Some(Dialect::MySql)
        );
        assert_eq!(Dialect::from_url("sqlite::memory:"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_url("sqlite:/tmp/x.db?mode=rwc"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_url("postgres://localhost/rice"), None);
        assert_eq!(Dialect::from_url(""), None);
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(Dialect::MySql.quote_identifier("diseases"), "`diseases`");
        assert_eq!(Dialect::Sqlite.quote_identifier("diseases"), "\"diseases\"");
    }

    #[test]
    fn test_single_statement() {
        for dialect in [Dialect::MySql, Dialect::Sqlite] {
            assert!(dialect.is_single_statement("SELECT 1"));
            assert!(dialect.is_single_statement("SELECT 1;  "));
            assert!(dialect.is_single_statement("SELECT 1; -- trailing note"));
            assert!(dialect.is_single_statement("SELECT name FROM diseases WHERE name = 'a;b'"));
            assert!(dialect.is_single_statement("SELECT 'it''s; fine' /* ; */"));
            assert!(!dialect.is_single_statement("SELECT 1 AS one; DROP TABLE users"));
            assert!(!dialect.is_single_statement("SELECT 1;DELETE FROM diseases;"));
            assert!(!dialect.is_single_statement("SELECT 1; 'x'"));
        }
    }

    #[test]
    fn test_single_statement_escapes_per_dialect() {
        // Backslash escapes the quote only on MySQL.
        assert!(Dialect::MySql.is_single_statement(r"SELECT 'a\'; b'"));
        assert!(!Dialect::Sqlite.is_single_statement(r"SELECT 'a\'; DELETE FROM users"));
        assert!(!Dialect::MySql.is_single_statement("SELECT 1 # note\n; DELETE FROM users"));
    }
}
