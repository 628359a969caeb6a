//! End-to-end flows through the full router, against an in-memory
//! database.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use burrow_api::auth::{AppState, AppStateInner, hash_password};
use burrow_api::notify::Notifier;
use burrow_db::Database;
use burrow_db::queries::users::NewUser;
use burrow_server::build_router;
use burrow_types::models::Role;

fn test_app() -> (Router, AppState) {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().expect("in-memory db"),
        jwt_secret: "test-secret".into(),
        notifier: Notifier::new(None),
    });
    (build_router(state.clone()), state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "first_name": "Test",
            "last_name": "User",
            "email": email,
            "password": "Str0ng!pw",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": "Str0ng!pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().expect("token").to_string()
}

/// Seed a global admin directly, then log in through the API.
async fn admin_token(app: &Router, state: &AppState, email: &str) -> String {
    let hash = hash_password("Str0ng!pw").expect("hash");
    state
        .db
        .create_user(&NewUser {
            first_name: "Site",
            last_name: "Admin",
            email,
            password_hash: &hash,
            role: Role::Admin,
            pf_img_url: "",
        })
        .expect("admin user");

    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": "Str0ng!pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn register_create_group_invite_accept() {
    let (app, _state) = test_app();

    let owner = register_and_login(&app, "owner@example.com").await;
    let invitee = register_and_login(&app, "invitee@example.com").await;

    // Create a public group; the owner's admin membership is implicit.
    let (status, body) = send(
        &app,
        "POST",
        "/group",
        Some(&owner),
        Some(json!({ "title": "hikers", "status": "public" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let group_id = body["id"].as_i64().expect("group id");

    let (status, body) = send(&app, "GET", &format!("/group/{group_id}"), Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group"]["members"], 1);
    assert_eq!(body["group"]["is_admin"], true);

    // Invite the second user.
    let invitee_id = {
        let (_, body) = send(&app, "GET", "/user", Some(&invitee), None).await;
        body["data"]["id"].as_i64().expect("user id")
    };
    let (status, _) = send(
        &app,
        "POST",
        &format!("/group/invite/{group_id}"),
        Some(&owner),
        Some(json!({ "user_id": invitee_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Duplicate invite conflicts.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/group/invite/{group_id}"),
        Some(&owner),
        Some(json!({ "user_id": invitee_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The invitee sees the invite and accepts it.
    let (status, body) = send(&app, "GET", "/group/pending/invite", Some(&invitee), None).await;
    assert_eq!(status, StatusCode::OK);
    let invite_id = body["invites"][0]["id"].as_i64().expect("invite id");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/group/invite/accept/{invite_id}"),
        Some(&invitee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Accepting again: the invite is gone.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/group/invite/accept/{invite_id}"),
        Some(&invitee),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", &format!("/group/{group_id}"), Some(&owner), None).await;
    assert_eq!(body["group"]["members"], 2);
}

#[tokio::test]
async fn private_group_request_flow() {
    let (app, state) = test_app();

    let owner = register_and_login(&app, "owner@example.com").await;
    let joiner = register_and_login(&app, "joiner@example.com").await;

    let (_, body) = send(
        &app,
        "POST",
        "/group",
        Some(&owner),
        Some(json!({ "title": "secret club", "status": "private" })),
    )
    .await;
    let group_id = body["id"].as_i64().expect("group id");

    // Direct join is rejected for private groups.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/group/public/join/{group_id}"),
        Some(&joiner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Request to join, toggled: create, cancel-by-repeat, create again.
    let (status, _) = send(
        &app,
        "POST",
        &format!("/group/request/{group_id}"),
        Some(&joiner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/group/request/{group_id}"),
        Some(&joiner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Request deleted successfully");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/group/request/{group_id}"),
        Some(&joiner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // The owner accepts; request row becomes a membership.
    let (_, body) = send(
        &app,
        "GET",
        &format!("/group/request/pending/{group_id}"),
        Some(&owner),
        None,
    )
    .await;
    let request_id = body["data"][0]["id"].as_i64().expect("request id");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/group/request/accept/{request_id}"),
        Some(&owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A second accept finds nothing.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/group/request/accept/{request_id}"),
        Some(&owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", &format!("/group/{group_id}"), Some(&joiner), None).await;
    assert_eq!(body["group"]["is_member"], true);
    assert_eq!(body["group"]["members"], 2);
    assert_eq!(body["group"]["is_requesting"], false);

    // The request row is gone from the database too.
    let joiner_row = state.db.get_user_by_email("joiner@example.com").unwrap().unwrap();
    assert!(state.db.get_request_by_pair(group_id, joiner_row.id).unwrap().is_none());
}

#[tokio::test]
async fn promote_requires_literal_owner() {
    let (app, _state) = test_app();

    let owner = register_and_login(&app, "owner@example.com").await;
    let deputy = register_and_login(&app, "deputy@example.com").await;
    let rookie = register_and_login(&app, "rookie@example.com").await;

    let (_, body) = send(
        &app,
        "POST",
        "/group",
        Some(&owner),
        Some(json!({ "title": "climbers", "status": "public" })),
    )
    .await;
    let group_id = body["id"].as_i64().expect("group id");

    for token in [&deputy, &rookie] {
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/group/public/join/{group_id}"),
            Some(token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    // Member ids from the roster.
    let (_, body) = send(
        &app,
        "GET",
        &format!("/group/member/{group_id}"),
        Some(&owner),
        None,
    )
    .await;
    let members = body["members"].as_array().expect("members");
    let member_id_of = |email: &str| {
        members
            .iter()
            .find(|m| m["email"] == email)
            .and_then(|m| m["id"].as_i64())
            .expect("member id")
    };
    let deputy_member = member_id_of("deputy@example.com");
    let rookie_member = member_id_of("rookie@example.com");

    // Owner promotes the deputy to group admin.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/group/promote/{deputy_member}"),
        Some(&owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The deputy holds group-admin authority now, but promote is still
    // owner-only.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/group/promote/{rookie_member}"),
        Some(&deputy),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn saving_a_post_toggles_per_folder() {
    let (app, _state) = test_app();
    let token = register_and_login(&app, "saver@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/post",
        Some(&token),
        Some(json!({ "title": "sunset", "status": "public", "img_url": "/p.jpg" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = body["id"].as_i64().expect("post id");

    for title in ["folder a", "folder b"] {
        let (status, _) = send(
            &app,
            "POST",
            "/folder",
            Some(&token),
            Some(json!({ "title": title, "status": "private" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, "GET", "/folder", Some(&token), None).await;
    let folder_a = body["folders"][0]["id"].as_i64().expect("folder a");
    let folder_b = body["folders"][1]["id"].as_i64().expect("folder b");

    // Save into A only.
    let (status, _) = send(
        &app,
        "POST",
        "/post/savepost",
        Some(&token),
        Some(json!({ "post_id": post_id, "folder_id": [folder_a] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Save into {A, B}: toggled out of A, into B.
    let (status, _) = send(
        &app,
        "POST",
        "/post/savepost",
        Some(&token),
        Some(json!({ "post_id": post_id, "folder_id": [folder_a, folder_b] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", &format!("/folder/post/{post_id}"), Some(&token), None).await;
    let flags = body["folders"].as_array().expect("folders");
    let saved_in = |id: i64| {
        flags
            .iter()
            .find(|f| f["id"] == id)
            .and_then(|f| f["is_saved"].as_bool())
            .expect("flag")
    };
    assert!(!saved_in(folder_a));
    assert!(saved_in(folder_b));
}

#[tokio::test]
async fn reply_to_reply_is_stored_but_not_listed() {
    let (app, _state) = test_app();
    let token = register_and_login(&app, "commenter@example.com").await;

    let (_, body) = send(
        &app,
        "POST",
        "/post",
        Some(&token),
        Some(json!({ "title": "thread", "status": "public" })),
    )
    .await;
    let post_id = body["id"].as_i64().expect("post id");

    let (_, body) = send(
        &app,
        "POST",
        "/comment",
        Some(&token),
        Some(json!({ "comment": "top level", "post_id": post_id })),
    )
    .await;
    let top_id = body["comment"]["id"].as_i64().expect("comment id");

    let (_, body) = send(
        &app,
        "POST",
        &format!("/comment/{top_id}/reply"),
        Some(&token),
        Some(json!({ "comment": "first reply" })),
    )
    .await;
    let reply_id = body["reply"]["id"].as_i64().expect("reply id");

    // A reply to the reply is accepted on write...
    let (status, _) = send(
        &app,
        "POST",
        "/comment",
        Some(&token),
        Some(json!({
            "comment": "nested reply",
            "post_id": post_id,
            "reply_cmt_id": reply_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // ...but the listing only surfaces one level.
    let (_, body) = send(&app, "GET", &format!("/comment/{post_id}"), Some(&token), None).await;
    let comments = body["comments"].as_array().expect("comments");
    assert_eq!(comments.len(), 1);
    let replies = comments[0]["replies"].as_array().expect("replies");
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["comment"], "first reply");
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let (app, _state) = test_app();
    let token = register_and_login(&app, "leaver@example.com").await;

    let (status, _) = send(&app, "GET", "/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_subtree_requires_global_admin() {
    let (app, state) = test_app();
    let user = register_and_login(&app, "plain@example.com").await;

    let (status, _) = send(&app, "GET", "/admin/users", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", "/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = admin_token(&app, &state, "root@example.com").await;
    let (status, body) = send(&app, "GET", "/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().expect("users").len(), 1);
}

#[tokio::test]
async fn group_status_update_rewrites_post_visibility() {
    let (app, state) = test_app();
    let owner = register_and_login(&app, "owner@example.com").await;
    let outsider = register_and_login(&app, "outsider@example.com").await;

    let (_, body) = send(
        &app,
        "POST",
        "/group",
        Some(&owner),
        Some(json!({ "title": "gallery", "status": "public" })),
    )
    .await;
    let group_id = body["id"].as_i64().expect("group id");

    let (_, body) = send(
        &app,
        "POST",
        "/post",
        Some(&owner),
        Some(json!({
            "title": "group shot",
            "status": "public",
            "group_id": group_id,
        })),
    )
    .await;
    let post_id = body["id"].as_i64().expect("post id");

    // Outsider can see the post while the group is public.
    let (status, _) = send(&app, "GET", &format!("/post/{post_id}"), Some(&outsider), None).await;
    assert_eq!(status, StatusCode::OK);

    // Flip the group private: its posts follow.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/group/{group_id}"),
        Some(&owner),
        Some(json!({ "title": "gallery", "status": "private" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/post/{post_id}"), Some(&outsider), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let row = state.db.get_post(post_id).unwrap().unwrap();
    assert_eq!(row.status, burrow_types::models::Visibility::Private);
}
