use anyhow::Result;
use rusqlite::{Connection, params};

use burrow_types::models::{GroupRole, Visibility};

use crate::Database;
use crate::models::{GroupMemberRow, GroupRow};
use crate::queries::{GROUP_COLS, MEMBER_COLS, OptionalExt, group_from_row, like_pattern, member_from_row};

/// Group annotated with counts and the owner's email, for listings.
#[derive(Debug)]
pub struct GroupWithCounts {
    pub group: GroupRow,
    pub members_count: i64,
    pub posts_count: i64,
    pub owner_email: String,
}

impl Database {
    /// Create a group and its owner's membership (role admin) in one
    /// transaction, so a group can never exist without its owner row.
    pub fn create_group(
        &self,
        owner_id: i64,
        title: &str,
        status: Visibility,
        img_url: &str,
    ) -> Result<i64> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO groups (title, img_url, owner_id, status) VALUES (?1, ?2, ?3, ?4)",
                params![title, img_url, owner_id, status.as_str()],
            )?;
            let group_id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO group_members (group_id, user_id, role) VALUES (?1, ?2, 'admin')",
                params![group_id, owner_id],
            )?;
            Ok(group_id)
        })
    }

    pub fn get_group(&self, id: i64) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {GROUP_COLS} FROM groups WHERE id = ?1"),
                [id],
                group_from_row,
            )
            .optional()
        })
    }

    /// All groups with counts and owner email, title matches first.
    /// `q` matches the title or the owner's email.
    pub fn list_groups_annotated(&self, q: Option<&str>) -> Result<Vec<GroupWithCounts>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(q.unwrap_or(""));
            let sql = format!(
                "SELECT {cols},
                        (SELECT COUNT(*) FROM group_members m WHERE m.group_id = g.id),
                        (SELECT COUNT(*) FROM posts p WHERE p.group_id = g.id),
                        COALESCE(u.email, 'Unknown')
                 FROM groups g
                 LEFT JOIN users u ON u.id = g.owner_id
                 WHERE g.title LIKE ?1 ESCAPE '\\'
                    OR u.email LIKE ?1 ESCAPE '\\'
                 ORDER BY (g.title LIKE ?1 ESCAPE '\\') DESC, g.title",
                cols = "g.id, g.title, g.img_url, g.owner_id, g.status, g.created_at, g.updated_at"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([&pattern], |row| {
                    Ok(GroupWithCounts {
                        group: group_from_row(row)?,
                        members_count: row.get(7)?,
                        posts_count: row.get(8)?,
                        owner_email: row.get(9)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Groups owned by a user, with member counts.
    pub fn groups_owned_by(&self, owner_id: i64) -> Result<Vec<(GroupRow, i64)>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {GROUP_COLS},
                        (SELECT COUNT(*) FROM group_members m WHERE m.group_id = groups.id)
                 FROM groups WHERE owner_id = ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner_id], |row| Ok((group_from_row(row)?, row.get(7)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Groups the user owns, filtered by title substring and optional
    /// status.
    pub fn owned_groups(
        &self,
        owner_id: i64,
        status: Option<Visibility>,
        search: &str,
    ) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(search);
            let sql = format!(
                "SELECT {GROUP_COLS} FROM groups
                 WHERE owner_id = ?1
                   AND title LIKE ?2 ESCAPE '\\'
                   AND (?3 IS NULL OR status = ?3)"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![owner_id, pattern, status.map(|s| s.as_str())],
                    group_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Groups the user belongs to; `exclude_owned` drops the ones they
    /// also own (the "joined-group" tab).
    pub fn joined_groups(
        &self,
        user_id: i64,
        exclude_owned: bool,
        status: Option<Visibility>,
        search: &str,
    ) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(search);
            let sql = format!(
                "SELECT {cols} FROM groups g
                 JOIN group_members m ON m.group_id = g.id
                 WHERE m.user_id = ?1
                   AND g.title LIKE ?2 ESCAPE '\\'
                   AND (?3 IS NULL OR g.status = ?3)
                   AND (?4 = 0 OR g.owner_id != ?1)",
                cols = "g.id, g.title, g.img_url, g.owner_id, g.status, g.created_at, g.updated_at"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    params![user_id, pattern, status.map(|s| s.as_str()), exclude_owned],
                    group_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Update a group and mirror the new status onto every post in it
    /// (group posts inherit group visibility).
    pub fn update_group(
        &self,
        id: i64,
        title: &str,
        status: Visibility,
        img_url: Option<&str>,
    ) -> Result<()> {
        self.with_tx(|tx| {
            tx.execute(
                "UPDATE groups SET title = ?1, status = ?2, updated_at = datetime('now')
                 WHERE id = ?3",
                params![title, status.as_str(), id],
            )?;
            if let Some(url) = img_url {
                if !url.is_empty() {
                    tx.execute("UPDATE groups SET img_url = ?1 WHERE id = ?2", params![url, id])?;
                }
            }
            tx.execute(
                "UPDATE posts SET status = ?1, updated_at = datetime('now') WHERE group_id = ?2",
                params![status.as_str(), id],
            )?;
            Ok(())
        })
    }

    /// Move ownership and force the new owner's membership to admin.
    pub fn transfer_group(&self, group_id: i64, new_owner_id: i64) -> Result<()> {
        self.with_tx(|tx| {
            tx.execute(
                "UPDATE groups SET owner_id = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![new_owner_id, group_id],
            )?;
            tx.execute(
                "INSERT INTO group_members (group_id, user_id, role) VALUES (?1, ?2, 'admin')
                 ON CONFLICT(group_id, user_id)
                 DO UPDATE SET role = 'admin', updated_at = datetime('now')",
                params![group_id, new_owner_id],
            )?;
            Ok(())
        })
    }

    pub fn delete_group_cascade(&self, id: i64) -> Result<()> {
        self.with_tx(|tx| delete_group_rows(tx, id))
    }

    pub fn membership(&self, group_id: i64, user_id: i64) -> Result<Option<GroupMemberRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {MEMBER_COLS} FROM group_members WHERE group_id = ?1 AND user_id = ?2"
                ),
                params![group_id, user_id],
                member_from_row,
            )
            .optional()
        })
    }

    pub fn member_count(&self, group_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM group_members WHERE group_id = ?1",
                [group_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn group_post_count(&self, group_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE group_id = ?1",
                [group_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn create_member(&self, group_id: i64, user_id: i64, role: GroupRole) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO group_members (group_id, user_id, role) VALUES (?1, ?2, ?3)",
                params![group_id, user_id, role.as_str()],
            )?;
            Ok(())
        })
    }

    /// Remove a membership by (group, user). Returns false when no row
    /// existed.
    pub fn delete_member_pair(&self, group_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
                params![group_id, user_id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn pending_request_count(&self, group_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM group_requests WHERE group_id = ?1",
                [group_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn search_groups(&self, term: &str, limit: u32) -> Result<Vec<(GroupRow, i64)>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(term);
            let sql = format!(
                "SELECT {GROUP_COLS},
                        (SELECT COUNT(*) FROM group_members m WHERE m.group_id = groups.id)
                 FROM groups
                 WHERE title LIKE ?1 ESCAPE '\\'
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![pattern, limit], |row| {
                    Ok((group_from_row(row)?, row.get(7)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn random_groups(&self, limit: u32) -> Result<Vec<(GroupRow, i64)>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {GROUP_COLS},
                        (SELECT COUNT(*) FROM group_members m WHERE m.group_id = groups.id)
                 FROM groups ORDER BY RANDOM() LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([limit], |row| Ok((group_from_row(row)?, row.get(7)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// Delete a group and everything scoped to it. Caller supplies the
/// transaction; also used by the user cascade.
pub(crate) fn delete_group_rows(conn: &Connection, group_id: i64) -> Result<()> {
    let post_ids: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT id FROM posts WHERE group_id = ?1")?;
        stmt.query_map([group_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?
    };
    for post_id in post_ids {
        super::posts::delete_post_rows(conn, post_id)?;
    }

    conn.execute("DELETE FROM group_invites WHERE group_id = ?1", [group_id])?;
    conn.execute("DELETE FROM group_requests WHERE group_id = ?1", [group_id])?;
    conn.execute("DELETE FROM group_members WHERE group_id = ?1", [group_id])?;
    conn.execute("DELETE FROM groups WHERE id = ?1", [group_id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use burrow_types::models::{GroupRole, Visibility};

    use crate::queries::testutil::{seed_group, seed_user, test_db};

    #[test]
    fn creating_a_group_inserts_owner_membership() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let group = seed_group(&db, owner, Visibility::Public);

        let member = db.membership(group, owner).unwrap().expect("owner row");
        assert_eq!(member.role, GroupRole::Admin);
        assert_eq!(db.member_count(group).unwrap(), 1);
    }

    #[test]
    fn status_update_rewrites_group_posts() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let group = seed_group(&db, owner, Visibility::Public);

        let post = db
            .create_post(owner, Some(group), "in group", "", "", Visibility::Public, &[])
            .unwrap();

        db.update_group(group, "fixture group", Visibility::Private, None).unwrap();

        let row = db.get_post(post).unwrap().expect("post");
        assert_eq!(row.status, Visibility::Private);
    }

    #[test]
    fn delete_cascades_members_and_posts() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let member = seed_user(&db, "member@example.com");
        let group = seed_group(&db, owner, Visibility::Public);
        db.create_member(group, member, GroupRole::Member).unwrap();
        let post = db
            .create_post(member, Some(group), "in group", "", "", Visibility::Public, &[])
            .unwrap();

        db.delete_group_cascade(group).unwrap();

        assert!(db.get_group(group).unwrap().is_none());
        assert!(db.membership(group, owner).unwrap().is_none());
        assert!(db.membership(group, member).unwrap().is_none());
        assert!(db.get_post(post).unwrap().is_none());
    }

    #[test]
    fn transfer_force_sets_membership_to_admin() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let heir = seed_user(&db, "heir@example.com");
        let group = seed_group(&db, owner, Visibility::Public);
        db.create_member(group, heir, GroupRole::Member).unwrap();

        db.transfer_group(group, heir).unwrap();

        let row = db.get_group(group).unwrap().expect("group");
        assert_eq!(row.owner_id, heir);
        let member = db.membership(group, heir).unwrap().expect("membership");
        assert_eq!(member.role, GroupRole::Admin);

        // Transfer to someone with no membership row creates one.
        let outsider = seed_user(&db, "outsider@example.com");
        db.transfer_group(group, outsider).unwrap();
        let member = db.membership(group, outsider).unwrap().expect("created");
        assert_eq!(member.role, GroupRole::Admin);
    }

    #[test]
    fn joined_groups_can_exclude_owned_ones() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let other = seed_user(&db, "other@example.com");
        let own_group = seed_group(&db, owner, Visibility::Public);
        let other_group = seed_group(&db, other, Visibility::Public);
        db.create_member(other_group, owner, GroupRole::Member).unwrap();

        let all = db.joined_groups(owner, false, None, "").unwrap();
        assert_eq!(all.len(), 2);

        let joined_only = db.joined_groups(owner, true, None, "").unwrap();
        assert_eq!(joined_only.len(), 1);
        assert_eq!(joined_only[0].id, other_group);
        assert_ne!(joined_only[0].id, own_group);
    }
}
