use anyhow::Result;
use rusqlite::params;

use burrow_types::models::GroupRole;

use crate::Database;
use crate::models::{GroupMemberRow, MemberWithUserRow};
use crate::queries::{MEMBER_COLS, OptionalExt, column_enum, like_pattern, member_from_row};

/// Invite-picker candidate: a user outside the group, with the flags
/// the picker UI shows.
#[derive(Debug)]
pub struct CandidateRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pf_img_url: String,
    pub is_following: bool,
    pub is_invited: bool,
}

impl Database {
    pub fn get_member(&self, id: i64) -> Result<Option<GroupMemberRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {MEMBER_COLS} FROM group_members WHERE id = ?1"),
                [id],
                member_from_row,
            )
            .optional()
        })
    }

    pub fn set_member_role(&self, id: i64, role: GroupRole) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE group_members SET role = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![role.as_str(), id],
            )?;
            Ok(())
        })
    }

    /// Members of a group joined with their user records, optionally
    /// filtered by name/email substring.
    pub fn list_members(&self, group_id: i64, q: Option<&str>) -> Result<Vec<MemberWithUserRow>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(q.unwrap_or(""));
            let mut stmt = conn.prepare(
                "SELECT m.id, u.id, u.first_name, u.last_name, u.email, u.pf_img_url, m.role
                 FROM group_members m
                 JOIN users u ON u.id = m.user_id
                 WHERE m.group_id = ?1
                   AND (u.first_name LIKE ?2 ESCAPE '\\'
                        OR u.last_name LIKE ?2 ESCAPE '\\'
                        OR u.email LIKE ?2 ESCAPE '\\')",
            )?;
            let rows = stmt
                .query_map(params![group_id, pattern], |row| {
                    Ok(MemberWithUserRow {
                        member_id: row.get(0)?,
                        user_id: row.get(1)?,
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                        email: row.get(4)?,
                        pf_img_url: row.get(5)?,
                        role: column_enum(row, 6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Users not in the group, for the invite picker. `viewer_id` drives
    /// the is_following flag. Capped to keep the picker snappy.
    pub fn list_non_members(
        &self,
        group_id: i64,
        viewer_id: i64,
        q: Option<&str>,
        limit: u32,
    ) -> Result<Vec<CandidateRow>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(q.unwrap_or(""));
            let mut stmt = conn.prepare(
                "SELECT u.id, u.first_name, u.last_name, u.email, u.pf_img_url,
                        EXISTS(SELECT 1 FROM user_followers f
                               WHERE f.user_id = u.id AND f.follower_id = ?2),
                        EXISTS(SELECT 1 FROM group_invites i
                               WHERE i.user_id = u.id AND i.group_id = ?1)
                 FROM users u
                 WHERE u.id NOT IN (SELECT user_id FROM group_members WHERE group_id = ?1)
                   AND (u.first_name LIKE ?3 ESCAPE '\\'
                        OR u.last_name LIKE ?3 ESCAPE '\\'
                        OR u.email LIKE ?3 ESCAPE '\\')
                 LIMIT ?4",
            )?;
            let rows = stmt
                .query_map(params![group_id, viewer_id, pattern, limit], |row| {
                    Ok(CandidateRow {
                        id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        email: row.get(3)?,
                        pf_img_url: row.get(4)?,
                        is_following: row.get(5)?,
                        is_invited: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
