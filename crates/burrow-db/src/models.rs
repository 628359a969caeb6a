//! Database row types — these map directly to SQLite rows.
//! Distinct from the burrow-types API models to keep the DB layer
//! independent. Timestamps stay in SQLite's `datetime('now')` text form
//! here; the API layer converts them.

use burrow_types::models::{GroupRole, Role, Visibility};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub pf_img_url: String,
    pub provider: Option<String>,
    pub provider_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct GroupRow {
    pub id: i64,
    pub title: String,
    pub img_url: String,
    pub owner_id: i64,
    pub status: Visibility,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct GroupMemberRow {
    pub id: i64,
    pub group_id: i64,
    pub user_id: i64,
    pub role: GroupRole,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct GroupInviteRow {
    pub id: i64,
    pub group_id: i64,
    pub user_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct GroupRequestRow {
    pub id: i64,
    pub group_id: i64,
    pub user_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub group_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub img_url: String,
    pub status: Visibility,
    pub is_highlighted: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Post joined with its author, for feed queries (single query, no N+1).
#[derive(Debug, Clone)]
pub struct PostWithAuthorRow {
    pub post: PostRow,
    pub first_name: String,
    pub last_name: String,
    pub pf_img_url: String,
}

#[derive(Debug, Clone)]
pub struct TagRow {
    pub id: i64,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub comment: String,
    pub reply_cmt_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Comment joined with its author's display fields.
#[derive(Debug, Clone)]
pub struct CommentWithAuthorRow {
    pub comment: CommentRow,
    pub user_name: String,
    pub user_pf_img_url: String,
}

#[derive(Debug, Clone)]
pub struct FolderRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub status: Visibility,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct ReportRow {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub reason: String,
    pub created_at: String,
}

/// Membership joined with the member's user record.
#[derive(Debug, Clone)]
pub struct MemberWithUserRow {
    pub member_id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pf_img_url: String,
    pub role: GroupRole,
}

/// Pending join request joined with the requesting user.
#[derive(Debug, Clone)]
pub struct RequestWithUserRow {
    pub request_id: i64,
    pub group_id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pf_img_url: String,
    pub created_at: String,
}

/// Pending invite joined with its group, for the invitee's inbox.
#[derive(Debug, Clone)]
pub struct InviteWithGroupRow {
    pub invite_id: i64,
    pub group_id: i64,
    pub title: String,
    pub img_url: String,
    pub status: Visibility,
    pub created_at: String,
}

/// Report annotated for the moderation queue.
#[derive(Debug, Clone)]
pub struct ReportDetailRow {
    pub report: ReportRow,
    pub reporter_email: String,
    pub post_owner_id: i64,
    pub post_owner_email: String,
    pub post_img_url: String,
}
