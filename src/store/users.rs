use super::{Result, StoreError, UserStore};
use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

impl User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::MissingField(field));
    }
    Ok(value)
}

impl UserStore {
    /// Insert a user and return its id
    pub fn create_user(&self, name: &str, email: &str) -> Result<i64> {
        let (name, email) = (require("name", name)?, require("email", email)?);
        self.conn.execute(
            "INSERT INTO users (name, email) VALUES (?1, ?2)",
            params![name, email],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(id, "created user");
        Ok(id)
    }

    /// All users, newest first
    pub fn all_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, created_at FROM users ORDER BY created_at DESC, id DESC",
        )?;

        let users = stmt
            .query_map([], User::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(users)
    }

    pub fn user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, name, email, created_at FROM users WHERE id = ?1",
                [id],
                User::from_row,
            )
            .optional()?;

        Ok(user)
    }

    pub fn update_user(&self, id: i64, name: &str, email: &str) -> Result<()> {
        let (name, email) = (require("name", name)?, require("email", email)?);
        let changed = self.conn.execute(
            "UPDATE users SET name = ?1, email = ?2 WHERE id = ?3",
            params![name, email, id],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        debug!(id, "updated user");
        Ok(())
    }

    pub fn delete_user(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM users WHERE id = ?1", [id])?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        debug!(id, "deleted user");
        Ok(())
    }
}
