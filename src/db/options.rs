//! Resolution of per-call connection parameters against the process config.

use crate::config::Config;
use crate::db::dialect::Dialect;
use crate::db::statement::Identifier;
use crate::error::{DbError, DbResult};
use std::fmt;
use url::Url;

/// Parameters for establishing a session. Anything left `None` falls back to
/// the [`Config`] the options are resolved against.
#[derive(Clone, Default)]
pub struct ConnectOptions {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub port: Option<u16>,
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    fn is_empty(&self) -> bool {
        self.host.is_none()
            && self.user.is_none()
            && self.password.is_none()
            && self.database.is_none()
            && self.port.is_none()
    }

    /// Resolve to a concrete target.
    ///
    /// Explicit options win over `DATABASE_URL`, which wins over the `DB_*`
    /// components of the config.
    pub fn resolve(&self, config: &Config) -> DbResult<ConnectTarget> {
        if self.is_empty() {
            if let Some(url) = config.database_url.as_deref() {
                return ConnectTarget::from_url(url);
            }
        }

        let password = self
            .password
            .as_deref()
            .or(config.password.as_deref())
            .ok_or_else(|| DbError::InvalidTarget("no database password configured".to_string()))?;

        ConnectTarget::mysql(
            self.host.as_deref().unwrap_or(&config.host),
            self.port.unwrap_or(config.port),
            self.user.as_deref().unwrap_or(&config.user),
            password,
            Some(self.database.as_deref().unwrap_or(&config.database)),
        )
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("port", &self.port)
            .finish()
    }
}

/// A fully resolved place to connect to.
#[derive(Clone)]
pub struct ConnectTarget {
    url: String,
    dialect: Dialect,
    database: Option<Identifier>,
}

impl ConnectTarget {
    pub fn from_url(raw: &str) -> DbResult<Self> {
        let dialect = Dialect::from_url(raw).ok_or_else(|| {
            DbError::InvalidTarget(format!(
                "unsupported URL scheme in {:?}",
                raw.split(':').next().unwrap_or_default()
            ))
        })?;

        let database = match dialect {
            Dialect::MySql => {
                let url = Url::parse(raw).map_err(|e| DbError::InvalidTarget(e.to_string()))?;
                let name = url.path().trim_start_matches('/');
                if name.is_empty() {
                    None
                } else {
                    Some(Identifier::new(name)?)
                }
            }
            // The file is the database; the URL is handed to the driver untouched.
            Dialect::Sqlite => None,
        };

        Ok(ConnectTarget {
            url: raw.to_string(),
            dialect,
            database,
        })
    }

    pub fn mysql(
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        database: Option<&str>,
    ) -> DbResult<Self> {
        let database = database.map(Identifier::new).transpose()?;

        // IPv6 literals need brackets to be told apart from the port.
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]", host)
        } else {
            host.to_string()
        };
        let mut url = Url::parse(&format!("mysql://{}:{}", host, port))
            .map_err(|e| DbError::InvalidTarget(e.to_string()))?;
        url.set_username(user)
            .map_err(|_| DbError::InvalidTarget(format!("cannot use user {:?}", user)))?;
        url.set_password(Some(password))
            .map_err(|_| DbError::InvalidTarget("cannot set password".to_string()))?;
        if let Some(db) = &database {
            url.set_path(&format!("/{}", db.as_str()));
        }

        Ok(ConnectTarget {
            url: url.to_string(),
            dialect: Dialect::MySql,
            database,
        })
    }

    /// The same server without a selected database, for creating it.
    /// `None` for backends where the database is not a server object.
    pub fn server_only(&self) -> Option<ConnectTarget> {
        if !self.dialect.has_server_databases() {
            return None;
        }
        let mut url = Url::parse(&self.url).ok()?;
        url.set_path("");
        Some(ConnectTarget {
            url: url.to_string(),
            dialect: self.dialect,
            database: None,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn database(&self) -> Option<&Identifier> {
        self.database.as_ref()
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// URL safe to print: the password is masked.
    pub fn redacted(&self) -> String {
        match Url::parse(&self.url) {
            Ok(mut url) if url.password().is_some() => {
                let _ = url.set_password(Some("***"));
                url.to_string()
            }
            Ok(_) => self.url.clone(),
            Err(_) => format!("{}:<unparseable>", self.dialect),
        }
    }
}

impl fmt::Debug for ConnectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectTarget")
            .field("url", &self.redacted())
            .field("dialect", &self.dialect)
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Display for ConnectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}
