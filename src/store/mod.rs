//! SQLite-backed `users` table.
//!
//! [`UserStore`] owns its connection. Open it, call [`UserStore::initialize`]
//! once, and close it (or drop it) when done.

pub mod schema;
pub mod users;

pub use users::User;

use rusqlite::Connection;
use std::path::Path;
use tracing::info;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to create database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("user {0} not found")]
    NotFound(i64),
}

impl StoreError {
    /// True when an insert or update hit the unique email constraint
    pub fn is_duplicate_email(&self) -> bool {
        matches!(
            self,
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

#[derive(Debug)]
pub struct UserStore {
    conn: Connection,
}

impl UserStore {
    /// Open (creating if needed) the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened user database");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Create tables and seed example rows into an empty store
    pub fn initialize(&self) -> Result<()> {
        schema::create_tables(&self.conn)?;
        let seeded = schema::seed_initial_data(&self.conn)?;
        if seeded > 0 {
            info!(seeded, "seeded example users");
        }
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
        info!("closed user database");
        Ok(())
    }
}
