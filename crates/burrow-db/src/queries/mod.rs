pub mod comments;
pub mod dashboard;
pub mod folders;
pub mod follows;
pub mod groups;
pub mod invites;
pub mod likes;
pub mod members;
pub mod posts;
pub mod reports;
pub mod requests;
pub mod sessions;
pub mod tags;
pub mod users;

use std::str::FromStr;

use anyhow::Result;
use rusqlite::Row;
use rusqlite::types::Type;

use crate::models::{
    CommentRow, FolderRow, GroupInviteRow, GroupMemberRow, GroupRequestRow, GroupRow, PostRow,
    ReportRow, TagRow, UserRow,
};

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Read a TEXT column into one of the string-backed enums
/// (Role / GroupRole / Visibility).
pub(crate) fn column_enum<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: T::Err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

// Column lists, shared between queries so the row mappers below stay in
// sync with every SELECT.

pub(crate) const USER_COLS: &str =
    "id, first_name, last_name, email, password, role, pf_img_url, provider, provider_id, \
     created_at, updated_at";

pub(crate) const GROUP_COLS: &str =
    "id, title, img_url, owner_id, status, created_at, updated_at";

pub(crate) const MEMBER_COLS: &str =
    "id, group_id, user_id, role, created_at, updated_at";

pub(crate) const POST_COLS: &str =
    "id, user_id, group_id, title, description, img_url, status, is_highlighted, \
     created_at, updated_at";

pub(crate) const COMMENT_COLS: &str =
    "id, user_id, post_id, comment, reply_cmt_id, created_at, updated_at";

pub(crate) const FOLDER_COLS: &str =
    "id, user_id, title, description, status, created_at, updated_at";

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password: row.get(4)?,
        role: column_enum(row, 5)?,
        pf_img_url: row.get(6)?,
        provider: row.get(7)?,
        provider_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub(crate) fn group_from_row(row: &Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        title: row.get(1)?,
        img_url: row.get(2)?,
        owner_id: row.get(3)?,
        status: column_enum(row, 4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub(crate) fn member_from_row(row: &Row<'_>) -> rusqlite::Result<GroupMemberRow> {
    Ok(GroupMemberRow {
        id: row.get(0)?,
        group_id: row.get(1)?,
        user_id: row.get(2)?,
        role: column_enum(row, 3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub(crate) fn invite_from_row(row: &Row<'_>) -> rusqlite::Result<GroupInviteRow> {
    Ok(GroupInviteRow {
        id: row.get(0)?,
        group_id: row.get(1)?,
        user_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub(crate) fn request_from_row(row: &Row<'_>) -> rusqlite::Result<GroupRequestRow> {
    Ok(GroupRequestRow {
        id: row.get(0)?,
        group_id: row.get(1)?,
        user_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub(crate) fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        group_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        img_url: row.get(5)?,
        status: column_enum(row, 6)?,
        is_highlighted: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub(crate) fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        comment: row.get(3)?,
        reply_cmt_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub(crate) fn folder_from_row(row: &Row<'_>) -> rusqlite::Result<FolderRow> {
    Ok(FolderRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: column_enum(row, 4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub(crate) fn tag_from_row(row: &Row<'_>) -> rusqlite::Result<TagRow> {
    Ok(TagRow {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

pub(crate) fn report_from_row(row: &Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        reason: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// LIKE pattern for substring search; escapes user-supplied `%`/`_`.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
pub(crate) mod testutil {
    use burrow_types::models::{Role, Visibility};

    use crate::Database;
    use crate::queries::users::NewUser;

    pub fn test_db() -> Database {
        Database::open_in_memory().expect("in-memory db")
    }

    pub fn seed_user(db: &Database, email: &str) -> i64 {
        db.create_user(&NewUser {
            first_name: "Test",
            last_name: "User",
            email,
            password_hash: "x",
            role: Role::User,
            pf_img_url: "",
        })
        .expect("seed user")
    }

    pub fn seed_admin(db: &Database, email: &str) -> i64 {
        db.create_user(&NewUser {
            first_name: "Site",
            last_name: "Admin",
            email,
            password_hash: "x",
            role: Role::Admin,
            pf_img_url: "",
        })
        .expect("seed admin")
    }

    pub fn seed_group(db: &Database, owner_id: i64, status: Visibility) -> i64 {
        db.create_group(owner_id, "fixture group", status, "")
            .expect("seed group")
    }

    pub fn seed_post(db: &Database, user_id: i64) -> i64 {
        db.create_post(user_id, None, "a post", "", "", Visibility::Public, &[])
            .expect("seed post")
    }
}
