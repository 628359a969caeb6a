use anyhow::Result;
use rusqlite::params;

use crate::Database;

impl Database {
    pub fn create_session(&self, user_id: i64, token_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (user_id, token_id) VALUES (?1, ?2)",
                params![user_id, token_id],
            )?;
            Ok(())
        })
    }

    pub fn session_exists(&self, token_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sessions WHERE token_id = ?1",
                [token_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Revoke a single token. Returns false when it was already gone.
    pub fn delete_session(&self, token_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE token_id = ?1", [token_id])?;
            Ok(n > 0)
        })
    }

    /// Revoke every token the user holds ("log out everywhere").
    pub fn delete_user_sessions(&self, user_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM sessions WHERE user_id = ?1", [user_id])?;
            Ok(n)
        })
    }
}
