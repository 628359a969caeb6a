use anyhow::Result;
use rusqlite::params;

use crate::Database;

impl Database {
    pub fn like_exists(&self, user_id: i64, post_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM post_likes WHERE user_id = ?1 AND post_id = ?2",
                params![user_id, post_id],
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
    }

    pub fn create_like(&self, user_id: i64, post_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO post_likes (user_id, post_id) VALUES (?1, ?2)",
                params![user_id, post_id],
            )?;
            Ok(())
        })
    }

    pub fn delete_like(&self, user_id: i64, post_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM post_likes WHERE user_id = ?1 AND post_id = ?2",
                params![user_id, post_id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn like_count(&self, post_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM post_likes WHERE post_id = ?1",
                [post_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}
