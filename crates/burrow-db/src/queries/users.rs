use anyhow::Result;
use rusqlite::params;

use burrow_types::models::Role;

use crate::Database;
use crate::models::UserRow;
use crate::queries::{OptionalExt, USER_COLS, like_pattern, user_from_row};

pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub pf_img_url: &'a str,
}

/// Admin user listing entry with per-user activity counts.
#[derive(Debug)]
pub struct UserWithCounts {
    pub user: UserRow,
    pub posts: i64,
    pub group_own: i64,
    pub group_member: i64,
}

impl Database {
    pub fn create_user(&self, new: &NewUser<'_>) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (first_name, last_name, email, password, role, pf_img_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    new.first_name,
                    new.last_name,
                    new.email,
                    new.password_hash,
                    new.role.as_str(),
                    new.pf_img_url
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
                [id],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLS} FROM users WHERE email = ?1"),
                [email],
                user_from_row,
            )
            .optional()
        })
    }

    pub fn update_user_names(&self, id: i64, first_name: &str, last_name: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET first_name = ?1, last_name = ?2, updated_at = datetime('now')
                 WHERE id = ?3",
                params![first_name, last_name, id],
            )?;
            Ok(())
        })
    }

    pub fn update_user_pf_img(&self, id: i64, pf_img_url: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET pf_img_url = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![pf_img_url, id],
            )?;
            Ok(())
        })
    }

    pub fn update_user_password(&self, id: i64, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET password = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![password_hash, id],
            )?;
            Ok(())
        })
    }

    pub fn update_user_info(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
        pf_img_url: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users
                 SET first_name = ?1, last_name = ?2, pf_img_url = ?3,
                     updated_at = datetime('now')
                 WHERE id = ?4",
                params![first_name, last_name, pf_img_url, id],
            )?;
            Ok(())
        })
    }

    pub fn set_user_role(&self, id: i64, role: Role) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET role = ?1, updated_at = datetime('now') WHERE id = ?2",
                params![role.as_str(), id],
            )?;
            Ok(())
        })
    }

    /// Non-admin accounts with activity counts, newest first, optionally
    /// filtered by name/email substring.
    pub fn list_users_with_counts(&self, search: Option<&str>) -> Result<Vec<UserWithCounts>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(search.unwrap_or(""));
            let sql = format!(
                "SELECT {USER_COLS},
                        (SELECT COUNT(*) FROM posts p WHERE p.user_id = users.id),
                        (SELECT COUNT(*) FROM groups g WHERE g.owner_id = users.id),
                        (SELECT COUNT(*) FROM group_members m WHERE m.user_id = users.id)
                 FROM users
                 WHERE role != 'admin'
                   AND (first_name LIKE ?1 ESCAPE '\\'
                        OR last_name LIKE ?1 ESCAPE '\\'
                        OR email LIKE ?1 ESCAPE '\\')
                 ORDER BY created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([&pattern], |row| {
                    Ok(UserWithCounts {
                        user: user_from_row(row)?,
                        posts: row.get(11)?,
                        group_own: row.get(12)?,
                        group_member: row.get(13)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_admins(&self, search: Option<&str>) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(search.unwrap_or(""));
            let sql = format!(
                "SELECT {USER_COLS} FROM users
                 WHERE role = 'admin'
                   AND (first_name LIKE ?1 ESCAPE '\\'
                        OR last_name LIKE ?1 ESCAPE '\\'
                        OR email LIKE ?1 ESCAPE '\\')
                 ORDER BY created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([&pattern], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn search_users(&self, term: &str, limit: u32) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(term);
            let sql = format!(
                "SELECT {USER_COLS} FROM users
                 WHERE first_name LIKE ?1 ESCAPE '\\'
                    OR last_name LIKE ?1 ESCAPE '\\'
                    OR email LIKE ?1 ESCAPE '\\'
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![pattern, limit], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn random_users(&self, limit: u32) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLS} FROM users ORDER BY RANDOM() LIMIT ?1");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([limit], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Remove an account and everything hanging off it, including the
    /// full cascade for every group the user owned.
    pub fn delete_user_cascade(&self, id: i64) -> Result<()> {
        self.with_tx(|tx| {
            let owned_groups: Vec<i64> = {
                let mut stmt = tx.prepare("SELECT id FROM groups WHERE owner_id = ?1")?;
                stmt.query_map([id], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };
            for group_id in owned_groups {
                super::groups::delete_group_rows(tx, group_id)?;
            }

            let own_posts: Vec<i64> = {
                let mut stmt = tx.prepare("SELECT id FROM posts WHERE user_id = ?1")?;
                stmt.query_map([id], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };
            for post_id in own_posts {
                super::posts::delete_post_rows(tx, post_id)?;
            }

            tx.execute("DELETE FROM comments WHERE user_id = ?1", [id])?;
            tx.execute("DELETE FROM group_invites WHERE user_id = ?1", [id])?;
            tx.execute("DELETE FROM group_requests WHERE user_id = ?1", [id])?;
            tx.execute("DELETE FROM group_members WHERE user_id = ?1", [id])?;
            tx.execute("DELETE FROM saved_posts WHERE user_id = ?1", [id])?;
            tx.execute("DELETE FROM folders WHERE user_id = ?1", [id])?;
            tx.execute("DELETE FROM post_likes WHERE user_id = ?1", [id])?;
            tx.execute(
                "DELETE FROM user_followers WHERE user_id = ?1 OR follower_id = ?1",
                [id],
            )?;
            tx.execute("DELETE FROM reports WHERE user_id = ?1", [id])?;
            tx.execute("DELETE FROM sessions WHERE user_id = ?1", [id])?;
            tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use burrow_types::models::Visibility;

    use crate::queries::testutil::{seed_group, seed_post, seed_user, test_db};

    #[test]
    fn email_is_unique() {
        let db = test_db();
        seed_user(&db, "dup@example.com");
        let err = db.create_user(&super::NewUser {
            first_name: "Other",
            last_name: "User",
            email: "dup@example.com",
            password_hash: "y",
            role: burrow_types::models::Role::User,
            pf_img_url: "",
        });
        assert!(err.is_err());
    }

    #[test]
    fn delete_cascade_takes_owned_groups_and_content() {
        let db = test_db();
        let user = seed_user(&db, "user@example.com");
        let bystander = seed_user(&db, "bystander@example.com");

        let group = seed_group(&db, user, Visibility::Public);
        let group_post = db
            .create_post(bystander, Some(group), "their post", "", "", Visibility::Public, &[])
            .unwrap();
        let own_post = seed_post(&db, user);
        let folder = db.create_folder(user, "mine", "", Visibility::Private).unwrap();
        db.toggle_saved_post(user, own_post, &[folder]).unwrap();
        db.create_follow(bystander, user).unwrap();
        db.create_session(user, "tok-1").unwrap();

        db.delete_user_cascade(user).unwrap();

        assert!(db.get_user_by_id(user).unwrap().is_none());
        assert!(db.get_group(group).unwrap().is_none());
        // Posts inside the deleted group go with it, even other users'.
        assert!(db.get_post(group_post).unwrap().is_none());
        assert!(db.get_post(own_post).unwrap().is_none());
        assert!(db.get_folder(folder).unwrap().is_none());
        assert!(!db.follow_exists(bystander, user).unwrap());
        assert!(!db.session_exists("tok-1").unwrap());
        // The bystander survives.
        assert!(db.get_user_by_id(bystander).unwrap().is_some());
    }

    #[test]
    fn admin_listing_counts_activity() {
        let db = test_db();
        let user = seed_user(&db, "active@example.com");
        seed_admin(&db);
        seed_post(&db, user);
        seed_post(&db, user);
        seed_group(&db, user, Visibility::Public);

        let listed = db.list_users_with_counts(None).unwrap();
        assert_eq!(listed.len(), 1, "admins are excluded");
        assert_eq!(listed[0].posts, 2);
        assert_eq!(listed[0].group_own, 1);
        assert_eq!(listed[0].group_member, 1);
    }

    fn seed_admin(db: &crate::Database) {
        crate::queries::testutil::seed_admin(db, "admin@example.com");
    }
}
