use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{GroupRole, Role, Visibility};

// -- JWT Claims --

/// JWT claims shared between burrow-api (REST middleware) and
/// burrow-server (token minting in tests). Canonical definition lives
/// here in burrow-types to eliminate duplication.
///
/// `jti` keys a row in the sessions table; deleting that row revokes the
/// token even before `exp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub jti: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub pf_img_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckPasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditProfileRequest {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileImageRequest {
    pub pf_img_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminUpdateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub pf_img_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAdminRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub pf_img_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub pf_img_url: String,
    pub followers: i64,
    pub followings: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct FollowEntry {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pf_img_url: String,
    pub is_following: bool,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub img_url: Option<String>,
    pub status: Visibility,
    #[serde(default)]
    pub tags: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub img_url: String,
    pub status: Visibility,
    #[serde(default)]
    pub tags: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct TagInfo {
    pub id: i64,
    pub name: String,
}

/// Feed entry: the image grid plus enough author info to render a card.
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub user_id: i64,
    pub img_url: String,
    pub is_saved: bool,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub user_pf_img_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct GroupPostEntry {
    pub id: i64,
    pub user_id: i64,
    pub group_id: i64,
    pub is_admin: bool,
    pub tags: Vec<TagInfo>,
    pub title: String,
    pub description: String,
    pub img_url: String,
    pub status: Visibility,
    pub first_name: String,
    pub last_name: String,
    pub user_pf_img_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    pub id: i64,
    pub user_id: i64,
    pub group_id: Option<i64>,
    pub group_title: String,
    pub tags: Vec<TagInfo>,
    pub title: String,
    pub description: String,
    pub img_url: String,
    pub status: Visibility,
    pub like_count: i64,
    pub is_liked: bool,
    pub is_saved: bool,
    pub user_name: String,
    pub user_pf_img_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RelatedPost {
    pub id: i64,
    pub img_url: String,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub user_pf_img_url: String,
    pub is_saved: bool,
}

// -- Groups --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupRequest {
    pub title: String,
    pub status: Visibility,
    #[serde(default)]
    pub img_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateGroupRequest {
    pub title: String,
    pub status: Visibility,
    #[serde(default)]
    pub img_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteGroupRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferGroupRequest {
    pub new_owner_id: i64,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct GroupSummary {
    pub id: i64,
    pub title: String,
    pub img_url: String,
    pub owner_id: i64,
    pub status: Visibility,
    pub members_count: i64,
    pub posts_count: i64,
    pub owner_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MyGroupEntry {
    pub id: i64,
    pub title: String,
    pub img_url: String,
    pub owner_id: i64,
    pub status: Visibility,
    /// Pending join requests; only populated for groups the caller
    /// administers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct GroupDetail {
    pub id: i64,
    pub title: String,
    pub owner_id: i64,
    pub img_url: String,
    pub is_member: bool,
    pub is_admin: bool,
    pub status: Visibility,
    pub members: i64,
    pub posts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_requesting: Option<bool>,
    pub is_inviting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Group members --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMemberRequest {
    pub user_id: i64,
    pub role: GroupRole,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveMemberRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct MemberEntry {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pf_img_url: String,
    pub group_role: GroupRole,
}

/// Invite-picker entry: a user who is not yet in the group.
#[derive(Debug, Serialize)]
pub struct CandidateEntry {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pf_img_url: String,
    pub is_following: bool,
    pub is_invited: bool,
}

// -- Invites & requests --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateInviteRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PendingInviteEntry {
    pub id: i64,
    pub group_id: i64,
    pub title: String,
    pub img_url: String,
    pub status: Visibility,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct JoinRequestEntry {
    pub id: i64,
    pub group_id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub pf_img_url: String,
    pub created_at: DateTime<Utc>,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub comment: String,
    pub post_id: i64,
    #[serde(default)]
    pub reply_cmt_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplyCommentRequest {
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct CommentEntry {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub comment: String,
    pub reply_cmt_id: Option<i64>,
    pub user_name: String,
    pub user_pf_img_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Top-level comment with its direct replies. Replies-to-replies are
/// stored but not listed; see the comments module.
#[derive(Debug, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: CommentEntry,
    pub replies: Vec<CommentEntry>,
}

// -- Folders & saved posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Visibility,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavePostRequest {
    pub post_id: i64,
    pub folder_id: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct SavedPreview {
    pub id: i64,
    pub img_url: String,
}

#[derive(Debug, Serialize)]
pub struct FolderSummary {
    pub id: i64,
    pub title: String,
    pub saved_posts: Vec<SavedPreview>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct FolderFlag {
    pub id: i64,
    pub title: String,
    pub is_saved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Tags --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagRequest {
    pub name: String,
}

// -- Reports --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReportRequest {
    pub post_id: i64,
    pub reason: String,
}
