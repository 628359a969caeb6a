use anyhow::Result;
use rusqlite::{Connection, params};

use burrow_types::models::Visibility;

use crate::Database;
use crate::models::{PostRow, PostWithAuthorRow, TagRow};
use crate::queries::{OptionalExt, POST_COLS, like_pattern, post_from_row, tag_from_row};

const POST_AUTHOR_COLS: &str =
    "p.id, p.user_id, p.group_id, p.title, p.description, p.img_url, p.status, \
     p.is_highlighted, p.created_at, p.updated_at, u.first_name, u.last_name, u.pf_img_url";

fn post_with_author_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostWithAuthorRow> {
    Ok(PostWithAuthorRow {
        post: post_from_row(row)?,
        first_name: row.get(10)?,
        last_name: row.get(11)?,
        pf_img_url: row.get(12)?,
    })
}

impl Database {
    /// Insert a post and attach its tags in one transaction. Tag ids
    /// that do not exist are skipped rather than failing the post.
    pub fn create_post(
        &self,
        user_id: i64,
        group_id: Option<i64>,
        title: &str,
        description: &str,
        img_url: &str,
        status: Visibility,
        tag_ids: &[i64],
    ) -> Result<i64> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO posts (user_id, group_id, title, description, img_url, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![user_id, group_id, title, description, img_url, status.as_str()],
            )?;
            let post_id = tx.last_insert_rowid();
            attach_tags(tx, post_id, tag_ids)?;
            Ok(post_id)
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {POST_COLS} FROM posts WHERE id = ?1"),
                [id],
                post_from_row,
            )
            .optional()
        })
    }

    /// Replace a post's fields and rewrite its tag set.
    pub fn update_post(
        &self,
        id: i64,
        title: &str,
        description: &str,
        img_url: &str,
        status: Visibility,
        tag_ids: &[i64],
    ) -> Result<()> {
        self.with_tx(|tx| {
            tx.execute(
                "UPDATE posts
                 SET title = ?1, description = ?2, img_url = ?3, status = ?4,
                     updated_at = datetime('now')
                 WHERE id = ?5",
                params![title, description, img_url, status.as_str(), id],
            )?;
            tx.execute("DELETE FROM post_tags WHERE post_id = ?1", [id])?;
            attach_tags(tx, id, tag_ids)?;
            Ok(())
        })
    }

    pub fn delete_post_cascade(&self, id: i64) -> Result<()> {
        self.with_tx(|tx| delete_post_rows(tx, id))
    }

    /// Public feed, newest first, optionally narrowed to one tag name.
    pub fn public_posts(&self, tag: Option<&str>) -> Result<Vec<PostWithAuthorRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_AUTHOR_COLS}
                 FROM posts p
                 JOIN users u ON u.id = p.user_id
                 WHERE p.status = 'public'
                   AND (?1 IS NULL OR p.id IN (
                        SELECT pt.post_id FROM post_tags pt
                        JOIN tags t ON t.id = pt.tag_id
                        WHERE t.name = ?1))
                 ORDER BY p.created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([tag], post_with_author_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn posts_by_user(&self, user_id: i64, public_only: bool) -> Result<Vec<PostWithAuthorRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_AUTHOR_COLS}
                 FROM posts p
                 JOIN users u ON u.id = p.user_id
                 WHERE p.user_id = ?1
                   AND (?2 = 0 OR p.status = 'public')
                 ORDER BY p.created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![user_id, public_only], post_with_author_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn posts_in_group(&self, group_id: i64) -> Result<Vec<PostWithAuthorRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_AUTHOR_COLS}
                 FROM posts p
                 JOIN users u ON u.id = p.user_id
                 WHERE p.group_id = ?1
                 ORDER BY p.created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([group_id], post_with_author_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Posts sharing a tag with `post_id`, plus posts by the same
    /// author, excluding the post itself, shuffled by the database.
    pub fn related_posts(&self, post_id: i64, author_id: i64) -> Result<Vec<PostWithAuthorRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_AUTHOR_COLS}
                 FROM posts p
                 JOIN users u ON u.id = p.user_id
                 WHERE p.id != ?1
                   AND (p.user_id = ?2
                        OR p.id IN (
                            SELECT pt.post_id FROM post_tags pt
                            WHERE pt.tag_id IN (
                                SELECT tag_id FROM post_tags WHERE post_id = ?1)))
                 ORDER BY RANDOM()"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![post_id, author_id], post_with_author_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn highlighted_post(&self) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {POST_COLS} FROM posts WHERE is_highlighted = 1 LIMIT 1"),
                [],
                post_from_row,
            )
            .optional()
        })
    }

    pub fn latest_post(&self) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {POST_COLS} FROM posts ORDER BY created_at DESC LIMIT 1"),
                [],
                post_from_row,
            )
            .optional()
        })
    }

    pub fn tags_for_post(&self, post_id: i64) -> Result<Vec<TagRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.name, t.created_at, t.updated_at
                 FROM tags t
                 JOIN post_tags pt ON pt.tag_id = t.id
                 WHERE pt.post_id = ?1
                 ORDER BY t.name",
            )?;
            let rows = stmt
                .query_map([post_id], tag_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Distinct ids of every post the user has saved anywhere, for
    /// flagging whole feeds in one query.
    pub fn saved_post_ids(&self, user_id: i64) -> Result<std::collections::HashSet<i64>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT post_id FROM saved_posts WHERE user_id = ?1")?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<_, _>>()?;
            Ok(ids)
        })
    }

    /// Whether the user has saved this post into any of their folders.
    pub fn is_post_saved(&self, user_id: i64, post_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM saved_posts WHERE user_id = ?1 AND post_id = ?2",
                params![user_id, post_id],
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
    }

    pub fn search_posts(&self, term: &str, limit: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(term);
            let sql = format!(
                "SELECT {POST_COLS} FROM posts
                 WHERE title LIKE ?1 ESCAPE '\\' AND status = 'public'
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![pattern, limit], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn random_posts(&self, limit: u32) -> Result<Vec<PostWithAuthorRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {POST_AUTHOR_COLS}
                 FROM posts p
                 JOIN users u ON u.id = p.user_id
                 ORDER BY RANDOM() LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([limit], post_with_author_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn all_posts(&self) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {POST_COLS} FROM posts ORDER BY created_at DESC"))?;
            let rows = stmt
                .query_map([], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn attach_tags(conn: &Connection, post_id: i64, tag_ids: &[i64]) -> Result<()> {
    for tag_id in tag_ids {
        // Skip unknown tags; INSERT OR IGNORE also swallows duplicates
        // in the request.
        conn.execute(
            "INSERT OR IGNORE INTO post_tags (post_id, tag_id)
             SELECT ?1, id FROM tags WHERE id = ?2",
            params![post_id, tag_id],
        )?;
    }
    Ok(())
}

/// Delete a post and every row referencing it. Caller supplies the
/// transaction; also used by the group and user cascades.
pub(crate) fn delete_post_rows(conn: &Connection, post_id: i64) -> Result<()> {
    conn.execute("DELETE FROM post_tags WHERE post_id = ?1", [post_id])?;
    conn.execute("DELETE FROM post_likes WHERE post_id = ?1", [post_id])?;
    conn.execute("DELETE FROM comments WHERE post_id = ?1", [post_id])?;
    conn.execute("DELETE FROM saved_posts WHERE post_id = ?1", [post_id])?;
    conn.execute("DELETE FROM reports WHERE post_id = ?1", [post_id])?;
    conn.execute("DELETE FROM posts WHERE id = ?1", [post_id])?;
    Ok(())
}
