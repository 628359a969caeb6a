use anyhow::Result;
use rusqlite::params;

use crate::Database;
use crate::models::{ReportDetailRow, ReportRow};
use crate::queries::{OptionalExt, report_from_row};

const REPORT_COLS: &str = "id, user_id, post_id, reason, created_at";

impl Database {
    pub fn create_report(&self, user_id: i64, post_id: i64, reason: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reports (user_id, post_id, reason) VALUES (?1, ?2, ?3)",
                params![user_id, post_id, reason],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Moderation queue, newest first, annotated with reporter and post
    /// owner. Reports whose post or users have since vanished are
    /// dropped from the listing (matching the join).
    pub fn list_reports_annotated(&self) -> Result<Vec<ReportDetailRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.user_id, r.post_id, r.reason, r.created_at,
                        reporter.email, owner.id, owner.email, p.img_url
                 FROM reports r
                 JOIN users reporter ON reporter.id = r.user_id
                 JOIN posts p ON p.id = r.post_id
                 JOIN users owner ON owner.id = p.user_id
                 ORDER BY r.created_at DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ReportDetailRow {
                        report: report_from_row(row)?,
                        reporter_email: row.get(5)?,
                        post_owner_id: row.get(6)?,
                        post_owner_email: row.get(7)?,
                        post_img_url: row.get(8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_report_by_post(&self, post_id: i64) -> Result<Option<ReportRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {REPORT_COLS} FROM reports WHERE post_id = ?1 LIMIT 1"),
                [post_id],
                report_from_row,
            )
            .optional()
        })
    }

    pub fn delete_report(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM reports WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}
