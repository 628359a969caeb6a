use anyhow::Result;
use rusqlite::params;

use crate::Database;
use crate::models::{GroupInviteRow, InviteWithGroupRow};
use crate::queries::{OptionalExt, column_enum, invite_from_row};

const INVITE_COLS: &str = "id, group_id, user_id, created_at";

impl Database {
    pub fn get_invite(&self, id: i64) -> Result<Option<GroupInviteRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {INVITE_COLS} FROM group_invites WHERE id = ?1"),
                [id],
                invite_from_row,
            )
            .optional()
        })
    }

    pub fn get_invite_by_pair(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<Option<GroupInviteRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {INVITE_COLS} FROM group_invites WHERE group_id = ?1 AND user_id = ?2"
                ),
                params![group_id, user_id],
                invite_from_row,
            )
            .optional()
        })
    }

    pub fn create_invite(&self, group_id: i64, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO group_invites (group_id, user_id) VALUES (?1, ?2)",
                params![group_id, user_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn delete_invite(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM group_invites WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// Consume an invite: delete it and create the membership in one
    /// transaction. Returns false when the invite was already gone
    /// (e.g. a concurrent accept won).
    pub fn accept_invite(&self, invite_id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            let pair = tx
                .query_row(
                    "SELECT group_id, user_id FROM group_invites WHERE id = ?1",
                    [invite_id],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
                )
                .optional()?;

            let Some((group_id, user_id)) = pair else {
                return Ok(false);
            };

            tx.execute("DELETE FROM group_invites WHERE id = ?1", [invite_id])?;
            tx.execute(
                "INSERT INTO group_members (group_id, user_id, role) VALUES (?1, ?2, 'member')",
                params![group_id, user_id],
            )?;
            Ok(true)
        })
    }

    pub fn list_group_invites(&self, group_id: i64) -> Result<Vec<GroupInviteRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {INVITE_COLS} FROM group_invites WHERE group_id = ?1 ORDER BY created_at"
            ))?;
            let rows = stmt
                .query_map([group_id], invite_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// A user's pending invites joined with the inviting groups.
    pub fn pending_invites_for_user(&self, user_id: i64) -> Result<Vec<InviteWithGroupRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT i.id, g.id, g.title, g.img_url, g.status, i.created_at
                 FROM group_invites i
                 JOIN groups g ON g.id = i.group_id
                 WHERE i.user_id = ?1
                 ORDER BY i.created_at DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(InviteWithGroupRow {
                        invite_id: row.get(0)?,
                        group_id: row.get(1)?,
                        title: row.get(2)?,
                        img_url: row.get(3)?,
                        status: column_enum(row, 4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn invite_count_for_user(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM group_invites WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}

#[cfg(test)]
mod tests {
    use burrow_types::models::{GroupRole, Visibility};

    use crate::queries::testutil::{seed_group, seed_user, test_db};

    #[test]
    fn accept_consumes_invite_and_creates_member() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let invitee = seed_user(&db, "invitee@example.com");
        let group = seed_group(&db, owner, Visibility::Public);

        let invite = db.create_invite(group, invitee).unwrap();
        assert!(db.accept_invite(invite).unwrap());

        assert!(db.get_invite(invite).unwrap().is_none());
        let member = db.membership(group, invitee).unwrap().expect("membership");
        assert_eq!(member.role, GroupRole::Member);

        // Already consumed.
        assert!(!db.accept_invite(invite).unwrap());
    }

    #[test]
    fn duplicate_invite_rejected_by_unique_constraint() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let invitee = seed_user(&db, "invitee@example.com");
        let group = seed_group(&db, owner, Visibility::Public);

        db.create_invite(group, invitee).unwrap();
        assert!(db.create_invite(group, invitee).is_err());
    }

    #[test]
    fn pending_invites_carry_group_details() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let invitee = seed_user(&db, "invitee@example.com");
        let group = seed_group(&db, owner, Visibility::Private);

        db.create_invite(group, invitee).unwrap();

        let pending = db.pending_invites_for_user(invitee).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].group_id, group);
        assert_eq!(pending[0].title, "fixture group");
        assert_eq!(db.invite_count_for_user(invitee).unwrap(), 1);
    }
}
