use anyhow::Result;
use rusqlite::params;

use burrow_types::models::Visibility;

use crate::Database;
use crate::models::{FolderRow, PostWithAuthorRow};
use crate::queries::{FOLDER_COLS, OptionalExt, folder_from_row, post_from_row};

/// Outcome of toggling one post across a set of folders.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    pub added: Vec<i64>,
    pub removed: Vec<i64>,
}

impl Database {
    pub fn create_folder(
        &self,
        user_id: i64,
        title: &str,
        description: &str,
        status: Visibility,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO folders (user_id, title, description, status) VALUES (?1, ?2, ?3, ?4)",
                params![user_id, title, description, status.as_str()],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_folder(&self, id: i64) -> Result<Option<FolderRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {FOLDER_COLS} FROM folders WHERE id = ?1"),
                [id],
                folder_from_row,
            )
            .optional()
        })
    }

    pub fn update_folder(
        &self,
        id: i64,
        title: &str,
        description: &str,
        status: Visibility,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE folders
                 SET title = ?1, description = ?2, status = ?3, updated_at = datetime('now')
                 WHERE id = ?4",
                params![title, description, status.as_str(), id],
            )?;
            Ok(())
        })
    }

    /// Delete a folder and its saved-post rows.
    pub fn delete_folder_cascade(&self, id: i64) -> Result<()> {
        self.with_tx(|tx| {
            tx.execute("DELETE FROM saved_posts WHERE folder_id = ?1", [id])?;
            tx.execute("DELETE FROM folders WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    pub fn folders_for_user(&self, user_id: i64) -> Result<Vec<FolderRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FOLDER_COLS} FROM folders WHERE user_id = ?1 ORDER BY created_at, id"
            ))?;
            let rows = stmt
                .query_map([user_id], folder_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// First few saved posts of a folder, for the folder-grid preview.
    pub fn saved_previews(&self, folder_id: i64, limit: u32) -> Result<Vec<(i64, String)>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.img_url
                 FROM saved_posts s
                 JOIN posts p ON p.id = s.post_id
                 WHERE s.folder_id = ?1
                 ORDER BY s.created_at
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![folder_id, limit], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn is_saved_in_folder(&self, user_id: i64, folder_id: i64, post_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM saved_posts
                 WHERE user_id = ?1 AND folder_id = ?2 AND post_id = ?3",
                params![user_id, folder_id, post_id],
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
    }

    /// Toggle a post's membership per folder: present → removed, absent
    /// → added (symmetric difference, not an upsert). One transaction
    /// for the whole folder set.
    pub fn toggle_saved_post(
        &self,
        user_id: i64,
        post_id: i64,
        folder_ids: &[i64],
    ) -> Result<SaveOutcome> {
        self.with_tx(|tx| {
            let mut outcome = SaveOutcome::default();
            for &folder_id in folder_ids {
                let removed = tx.execute(
                    "DELETE FROM saved_posts
                     WHERE user_id = ?1 AND folder_id = ?2 AND post_id = ?3",
                    params![user_id, folder_id, post_id],
                )?;
                if removed > 0 {
                    outcome.removed.push(folder_id);
                } else {
                    tx.execute(
                        "INSERT INTO saved_posts (user_id, folder_id, post_id) VALUES (?1, ?2, ?3)",
                        params![user_id, folder_id, post_id],
                    )?;
                    outcome.added.push(folder_id);
                }
            }
            Ok(outcome)
        })
    }

    /// Posts saved in one folder, with author info.
    pub fn saved_posts_in_folder(&self, folder_id: i64) -> Result<Vec<PostWithAuthorRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.user_id, p.group_id, p.title, p.description, p.img_url,
                        p.status, p.is_highlighted, p.created_at, p.updated_at,
                        u.first_name, u.last_name, u.pf_img_url
                 FROM saved_posts s
                 JOIN posts p ON p.id = s.post_id
                 JOIN users u ON u.id = p.user_id
                 WHERE s.folder_id = ?1
                 ORDER BY s.created_at DESC",
            )?;
            let rows = stmt
                .query_map([folder_id], |row| {
                    Ok(PostWithAuthorRow {
                        post: post_from_row(row)?,
                        first_name: row.get(10)?,
                        last_name: row.get(11)?,
                        pf_img_url: row.get(12)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use burrow_types::models::Visibility;

    use crate::queries::testutil::{seed_post, seed_user, test_db};

    #[test]
    fn toggle_is_symmetric_difference_per_folder() {
        let db = test_db();
        let user = seed_user(&db, "user@example.com");
        let post = seed_post(&db, user);
        let folder_a = db.create_folder(user, "A", "", Visibility::Private).unwrap();
        let folder_b = db.create_folder(user, "B", "", Visibility::Private).unwrap();

        // Already saved in A.
        db.toggle_saved_post(user, post, &[folder_a]).unwrap();
        assert!(db.is_saved_in_folder(user, folder_a, post).unwrap());

        // Saving to {A, B}: unsaved from A, saved to B.
        let outcome = db.toggle_saved_post(user, post, &[folder_a, folder_b]).unwrap();
        assert_eq!(outcome.removed, vec![folder_a]);
        assert_eq!(outcome.added, vec![folder_b]);
        assert!(!db.is_saved_in_folder(user, folder_a, post).unwrap());
        assert!(db.is_saved_in_folder(user, folder_b, post).unwrap());
    }

    #[test]
    fn deleting_folder_cascades_saved_posts() {
        let db = test_db();
        let user = seed_user(&db, "user@example.com");
        let post = seed_post(&db, user);
        let folder = db.create_folder(user, "keep", "", Visibility::Private).unwrap();

        db.toggle_saved_post(user, post, &[folder]).unwrap();
        assert!(db.is_post_saved(user, post).unwrap());

        db.delete_folder_cascade(folder).unwrap();
        assert!(db.get_folder(folder).unwrap().is_none());
        assert!(!db.is_post_saved(user, post).unwrap());
    }

    #[test]
    fn previews_are_capped() {
        let db = test_db();
        let user = seed_user(&db, "user@example.com");
        let folder = db.create_folder(user, "pics", "", Visibility::Public).unwrap();

        for _ in 0..5 {
            let post = seed_post(&db, user);
            db.toggle_saved_post(user, post, &[folder]).unwrap();
        }

        assert_eq!(db.saved_previews(folder, 3).unwrap().len(), 3);
        assert_eq!(db.saved_posts_in_folder(folder).unwrap().len(), 5);
    }
}
