use anyhow::Result;
use rusqlite::params;

use crate::Database;
use crate::models::{GroupRequestRow, RequestWithUserRow};
use crate::queries::{OptionalExt, request_from_row};

const REQUEST_COLS: &str = "id, group_id, user_id, created_at";

impl Database {
    pub fn get_request(&self, id: i64) -> Result<Option<GroupRequestRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {REQUEST_COLS} FROM group_requests WHERE id = ?1"),
                [id],
                request_from_row,
            )
            .optional()
        })
    }

    pub fn get_request_by_pair(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<Option<GroupRequestRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {REQUEST_COLS} FROM group_requests WHERE group_id = ?1 AND user_id = ?2"
                ),
                params![group_id, user_id],
                request_from_row,
            )
            .optional()
        })
    }

    pub fn create_request(&self, group_id: i64, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO group_requests (group_id, user_id) VALUES (?1, ?2)",
                params![group_id, user_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn delete_request(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM group_requests WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    /// Consume a join request: delete it and create the membership in
    /// one transaction. Returns false when the request was already gone,
    /// so a second concurrent accept cannot also succeed.
    pub fn accept_request(&self, request_id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            let pair = tx
                .query_row(
                    "SELECT group_id, user_id FROM group_requests WHERE id = ?1",
                    [request_id],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
                )
                .optional()?;

            let Some((group_id, user_id)) = pair else {
                return Ok(false);
            };

            tx.execute("DELETE FROM group_requests WHERE id = ?1", [request_id])?;
            tx.execute(
                "INSERT INTO group_members (group_id, user_id, role) VALUES (?1, ?2, 'member')",
                params![group_id, user_id],
            )?;
            Ok(true)
        })
    }

    /// Pending requests for a group, with requester details.
    pub fn pending_requests_for_group(&self, group_id: i64) -> Result<Vec<RequestWithUserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT r.id, r.group_id, u.id, u.first_name, u.last_name, u.email,
                        u.pf_img_url, r.created_at
                 FROM group_requests r
                 JOIN users u ON u.id = r.user_id
                 WHERE r.group_id = ?1
                 ORDER BY r.created_at",
            )?;
            let rows = stmt
                .query_map([group_id], |row| {
                    Ok(RequestWithUserRow {
                        request_id: row.get(0)?,
                        group_id: row.get(1)?,
                        user_id: row.get(2)?,
                        first_name: row.get(3)?,
                        last_name: row.get(4)?,
                        email: row.get(5)?,
                        pf_img_url: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Pending join requests across the groups this user administers,
    /// for the notification counter.
    pub fn request_count_for_admin(&self, user_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM group_requests
                 WHERE group_id IN (
                     SELECT group_id FROM group_members
                     WHERE user_id = ?1 AND role = 'admin')",
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
    fn accept_consumes_request_and_creates_member() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let joiner = seed_user(&db, "joiner@example.com");
        let group = seed_group(&db, owner, Visibility::Private);

        let req = db.create_request(group, joiner).unwrap();

        assert!(db.accept_request(req).unwrap());
        assert!(db.get_request(req).unwrap().is_none());

        let member = db.membership(group, joiner).unwrap().expect("membership row");
        assert_eq!(member.role, GroupRole::Member);

        // owner membership from group creation + the accepted joiner
        assert_eq!(db.member_count(group).unwrap(), 2);
    }

    #[test]
    fn second_accept_of_same_request_fails() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let joiner = seed_user(&db, "joiner@example.com");
        let group = seed_group(&db, owner, Visibility::Private);

        let req = db.create_request(group, joiner).unwrap();
        assert!(db.accept_request(req).unwrap());
        assert!(!db.accept_request(req).unwrap());
        assert_eq!(db.member_count(group).unwrap(), 2);
    }

    #[test]
    fn duplicate_request_rejected_by_unique_constraint() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let joiner = seed_user(&db, "joiner@example.com");
        let group = seed_group(&db, owner, Visibility::Private);

        db.create_request(group, joiner).unwrap();
        assert!(db.create_request(group, joiner).is_err());
    }

    #[test]
    fn admin_request_counter_spans_administered_groups() {
        let db = test_db();
        let owner = seed_user(&db, "owner@example.com");
        let a = seed_user(&db, "a@example.com");
        let b = seed_user(&db, "b@example.com");
        let group = seed_group(&db, owner, Visibility::Private);

        db.create_request(group, a).unwrap();
        db.create_request(group, b).unwrap();

        assert_eq!(db.request_count_for_admin(owner).unwrap(), 2);
        assert_eq!(db.request_count_for_admin(a).unwrap(), 0);
    }
}
