use rusqlite::{params, Connection, Result};

const SEED_USERS: [(&str, &str); 3] = [
    ("Alice Smith", "alice@example.com"),
    ("Bob Nguyen", "bob@example.com"),
    ("Charlie Tran", "charlie@example.com"),
];

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        [],
    )?;

    Ok(())
}

/// Insert the example users if the table is empty. Returns how many were added.
pub fn seed_initial_data(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    if count > 0 {
        return Ok(0);
    }

    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare("INSERT INTO users (name, email) VALUES (?1, ?2)")?;
        for (name, email) in SEED_USERS {
            stmt.execute(params![name, email])?;
        }
    }
    tx.commit()?;

    Ok(SEED_USERS.len())
}
