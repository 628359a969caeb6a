use anyhow::Result;

use crate::Database;
use crate::models::UserRow;
use crate::queries::{USER_COLS, user_from_row};

impl Database {
    pub fn count_users(&self) -> Result<i64> {
        self.count_table("users")
    }

    pub fn count_posts(&self) -> Result<i64> {
        self.count_table("posts")
    }

    pub fn count_groups(&self) -> Result<i64> {
        self.count_table("groups")
    }

    fn count_table(&self, table: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
            Ok(n)
        })
    }

    /// Rows created in the last seven days.
    pub fn count_recent(&self, table: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {table} WHERE created_at >= datetime('now', '-7 days')"
                ),
                [],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    /// New users this week vs the week before.
    pub fn weekly_new_users(&self) -> Result<(i64, i64)> {
        self.with_conn(|conn| {
            let this_week: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE created_at >= datetime('now', '-7 days')",
                [],
                |row| row.get(0),
            )?;
            let previous_week: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users
                 WHERE created_at >= datetime('now', '-14 days')
                   AND created_at < datetime('now', '-7 days')",
                [],
                |row| row.get(0),
            )?;
            Ok((this_week, previous_week))
        })
    }

    pub fn newest_users(&self, limit: u32) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLS} FROM users ORDER BY created_at DESC LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map([limit], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Post counts bucketed by month for the last `months` months,
    /// oldest bucket first. Months with no posts report zero.
    pub fn posts_per_month(&self, months: u32) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT strftime('%Y-%m', created_at) AS month, COUNT(*)
                 FROM posts
                 WHERE created_at >= datetime('now', 'start of month', ?1 || ' months')
                 GROUP BY month",
            )?;
            let offset = format!("-{}", months.saturating_sub(1));
            let counts: std::collections::HashMap<String, i64> = stmt
                .query_map([offset], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<_, _>>()?;

            // Month labels for the window, oldest first.
            let mut stmt = conn.prepare(
                "SELECT strftime('%Y-%m', datetime('now', 'start of month', ?1 || ' months'))",
            )?;
            let mut buckets = Vec::with_capacity(months as usize);
            for i in (0..months).rev() {
                let label: String = stmt.query_row([format!("-{i}")], |row| row.get(0))?;
                buckets.push(counts.get(&label).copied().unwrap_or(0));
            }
            Ok(buckets)
        })
    }
}
