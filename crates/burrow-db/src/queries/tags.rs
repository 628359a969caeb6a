use anyhow::Result;
use rusqlite::params;

use crate::Database;
use crate::models::TagRow;
use crate::queries::{OptionalExt, like_pattern, tag_from_row};

const TAG_COLS: &str = "id, name, created_at, updated_at";

impl Database {
    pub fn list_tags(&self, q: Option<&str>) -> Result<Vec<TagRow>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(q.unwrap_or(""));
            let mut stmt = conn.prepare(&format!(
                "SELECT {TAG_COLS} FROM tags WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name"
            ))?;
            let rows = stmt
                .query_map([&pattern], tag_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_tag(&self, id: i64) -> Result<Option<TagRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {TAG_COLS} FROM tags WHERE id = ?1"),
                [id],
                tag_from_row,
            )
            .optional()
        })
    }

    pub fn get_tag_by_name(&self, name: &str) -> Result<Option<TagRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {TAG_COLS} FROM tags WHERE name = ?1"),
                [name],
                tag_from_row,
            )
            .optional()
        })
    }

    pub fn create_tag(&self, name: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute("INSERT INTO tags (name) VALUES (?1)", [name])?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn update_tag(&self, id: i64, name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE tags SET name = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![name, id],
            )?;
            Ok(())
        })
    }

    /// Delete a tag and its post associations.
    pub fn delete_tag(&self, id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            tx.execute("DELETE FROM post_tags WHERE tag_id = ?1", [id])?;
            let n = tx.execute("DELETE FROM tags WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}
