use anyhow::Result;
use rusqlite::params;

use crate::Database;
use crate::queries::like_pattern;

/// Follower/following list entry, with the viewer's own follow state.
#[derive(Debug)]
pub struct FollowListRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pf_img_url: String,
    pub is_following: bool,
}

impl Database {
    pub fn follow_exists(&self, user_id: i64, follower_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM user_followers WHERE user_id = ?1 AND follower_id = ?2",
                params![user_id, follower_id],
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
    }

    pub fn create_follow(&self, user_id: i64, follower_id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO user_followers (user_id, follower_id) VALUES (?1, ?2)",
                params![user_id, follower_id],
            )?;
            Ok(())
        })
    }

    pub fn delete_follow(&self, user_id: i64, follower_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM user_followers WHERE user_id = ?1 AND follower_id = ?2",
                params![user_id, follower_id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn follower_count(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM user_followers WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn following_count(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM user_followers WHERE follower_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    /// Users following `user_id`, with the viewer's follow state per
    /// entry and an optional name/email filter.
    pub fn followers_of(
        &self,
        user_id: i64,
        viewer_id: i64,
        q: Option<&str>,
    ) -> Result<Vec<FollowListRow>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(q.unwrap_or(""));
            let mut stmt = conn.prepare(
                "SELECT u.id, u.first_name, u.last_name, u.email, u.pf_img_url,
                        EXISTS(SELECT 1 FROM user_followers v
                               WHERE v.user_id = u.id AND v.follower_id = ?2)
                 FROM user_followers f
                 JOIN users u ON u.id = f.follower_id
                 WHERE f.user_id = ?1
                   AND (u.first_name LIKE ?3 ESCAPE '\\'
                        OR u.last_name LIKE ?3 ESCAPE '\\'
                        OR u.email LIKE ?3 ESCAPE '\\')",
            )?;
            let rows = stmt
                .query_map(params![user_id, viewer_id, pattern], follow_list_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Users that `user_id` follows, same shape as [`followers_of`].
    pub fn followings_of(
        &self,
        user_id: i64,
        viewer_id: i64,
        q: Option<&str>,
    ) -> Result<Vec<FollowListRow>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(q.unwrap_or(""));
            let mut stmt = conn.prepare(
                "SELECT u.id, u.first_name, u.last_name, u.email, u.pf_img_url,
                        EXISTS(SELECT 1 FROM user_followers v
                               WHERE v.user_id = u.id AND v.follower_id = ?2)
                 FROM user_followers f
                 JOIN users u ON u.id = f.user_id
                 WHERE f.follower_id = ?1
                   AND (u.first_name LIKE ?3 ESCAPE '\\'
                        OR u.last_name LIKE ?3 ESCAPE '\\'
                        OR u.email LIKE ?3 ESCAPE '\\')",
            )?;
            let rows = stmt
                .query_map(params![user_id, viewer_id, pattern], follow_list_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn follow_list_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FollowListRow> {
    Ok(FollowListRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        pf_img_url: row.get(4)?,
        is_following: row.get(5)?,
    })
}
