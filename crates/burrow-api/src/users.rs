use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde_json::json;

use burrow_db::queries::users::NewUser;
use burrow_types::api::{
    AdminUpdateUserRequest, CreateAdminRequest, EditProfileRequest, UpdatePasswordRequest,
    UpdateProfileImageRequest, UserProfile,
};
use burrow_types::models::Role;

use crate::auth::{AppState, hash_password, validate_password_policy, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::notify;
use crate::ts::parse_ts;

/// Caller's own profile, with the notification counters the navbar
/// shows.
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    let user = &current.user;

    let followers = state.db.follower_count(user.id)?;
    let followings = state.db.following_count(user.id)?;
    let invites = state.db.invite_count_for_user(user.id)?;
    let group_req = state.db.request_count_for_admin(user.id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "User data",
        "data": {
            "id": user.id,
            "first_name": user.first_name,
            "last_name": user.last_name,
            "email": user.email,
            "role": user.role,
            "pf_img_url": user.pf_img_url,
            "followers": followers,
            "followings": followings,
            "created_at": parse_ts(&user.created_at),
            "updated_at": parse_ts(&user.updated_at),
            "invites": invites,
            "group_req": group_req,
            "total_noti": invites + group_req,
        },
    })))
}

pub async fn show(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .db
        .get_user_by_id(id)?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let followers = state.db.follower_count(id)?;
    let followings = state.db.following_count(id)?;
    let is_following = state.db.follow_exists(id, current.id())?;

    let profile = UserProfile {
        id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        role: user.role,
        pf_img_url: user.pf_img_url,
        followers,
        followings,
        created_at: parse_ts(&user.created_at),
        updated_at: parse_ts(&user.updated_at),
    };

    Ok(Json(json!({
        "status": 200,
        "message": "User data",
        "user": profile,
        "is_following": is_following,
    })))
}

pub async fn edit_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<EditProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(ApiError::validation("First and last name are required"));
    }

    if req.first_name == current.user.first_name && req.last_name == current.user.last_name {
        return Ok(Json(json!({ "status": 200, "message": "No changes made" })));
    }

    state
        .db
        .update_user_names(current.id(), req.first_name.trim(), req.last_name.trim())?;

    Ok(Json(json!({
        "status": 200,
        "message": "Profile updated successfully",
    })))
}

pub async fn update_profile_image(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileImageRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.pf_img_url.is_empty() {
        return Err(ApiError::validation("pf_img_url is required"));
    }

    state.db.update_user_pf_img(current.id(), &req.pf_img_url)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Profile image updated successfully",
    })))
}

pub async fn update_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<UpdatePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_password_policy(&req.new_password)?;

    verify_password(&req.old_password, &current.user.password)
        .map_err(|_| ApiError::unauthenticated("Incorrect old password"))?;

    if verify_password(&req.new_password, &current.user.password).is_ok() {
        return Err(ApiError::validation(
            "New password can not be same as old password",
        ));
    }

    let hash = hash_password(&req.new_password)?;
    state.db.update_user_password(current.id(), &hash)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Password updated successfully",
    })))
}

// -- Admin surface --

pub async fn admin_update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AdminUpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_user_by_id(id)?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    state
        .db
        .update_user_info(id, &req.first_name, &req.last_name, &req.pf_img_url)?;

    Ok(Json(json!({
        "status": 200,
        "message": "User updated successfully",
    })))
}

/// Promote an existing account to admin, or create a fresh admin
/// account with a generated password. Either way the affected user is
/// mailed, fire-and-forget.
pub async fn create_admin(
    State(state): State<AppState>,
    Json(req): Json<CreateAdminRequest>,
) -> ApiResult<impl IntoResponse> {
    if !req.email.contains('@') {
        return Err(ApiError::validation("A valid email is required"));
    }

    if let Some(existing) = state.db.get_user_by_email(&req.email)? {
        if existing.role == Role::Admin {
            return Err(ApiError::conflict("Admin already exists"));
        }

        state.db.set_user_role(existing.id, Role::Admin)?;
        state
            .notifier
            .send(notify::admin_granted_mail(&existing.email, &existing.first_name));

        return Ok(Json(json!({
            "status": 200,
            "message": "Admin assigned successfully",
        })));
    }

    let password = generate_password(12);
    let password_hash = hash_password(&password)?;
    let pf_img_url = req.pf_img_url.as_deref().unwrap_or("/assets/default-avatar.png");

    state.db.create_user(&NewUser {
        first_name: &req.first_name,
        last_name: &req.last_name,
        email: &req.email,
        password_hash: &password_hash,
        role: Role::Admin,
        pf_img_url,
    })?;

    state
        .notifier
        .send(notify::admin_created_mail(&req.email, &req.first_name, &password));

    Ok(Json(json!({
        "status": 200,
        "message": "Admin created successfully",
    })))
}

pub async fn remove_admin(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_user_by_id(id)?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    state.db.set_user_role(id, Role::User)?;

    Ok(Json(json!({
        "status": 200,
        "message": "Admin removed successfully",
    })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if state.db.get_user_by_id(id)?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    state.db.delete_user_cascade(id)?;

    Ok(Json(json!({
        "status": 200,
        "message": "User deleted successfully",
    })))
}

/// Random password satisfying the account policy: one character from
/// each class, the rest drawn from all of them, then shuffled.
fn generate_password(length: usize) -> String {
    const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
    const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    const DIGITS: &[u8] = b"0123456789";
    const SPECIALS: &[u8] = b"@$!%*#?&";

    let mut rng = rand::rng();
    let mut chars: Vec<u8> = vec![
        *LOWER.choose(&mut rng).expect("non-empty"),
        *UPPER.choose(&mut rng).expect("non-empty"),
        *DIGITS.choose(&mut rng).expect("non-empty"),
        *SPECIALS.choose(&mut rng).expect("non-empty"),
    ];

    let all: Vec<u8> = [LOWER, UPPER, DIGITS, SPECIALS].concat();
    while chars.len() < length.max(4) {
        chars.push(all[rng.random_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);

    String::from_utf8(chars).expect("ascii password")
}

#[cfg(test)]
mod tests {
    use super::generate_password;
    use crate::auth::validate_password_policy;

    #[test]
    fn generated_passwords_satisfy_the_policy() {
        for _ in 0..50 {
            let pw = generate_password(12);
            assert_eq!(pw.len(), 12);
            assert!(validate_password_policy(&pw).is_ok(), "weak password: {pw}");
        }
    }
}
