use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use burrow_api::auth::{self, AppState};
use burrow_api::middleware::{require_admin, require_auth};
use burrow_api::{
    comments, dashboard, folders, follows, groups, invites, likes, members, posts, reports,
    requests, search, tags, users,
};

/// Assemble the full route table around the shared state. Split out of
/// main so the integration tests can drive the router directly.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        // Account
        .route("/user", get(users::me))
        .route("/auth/logout", get(auth::logout))
        .route("/auth/logoutAll", get(auth::logout_all))
        .route("/auth/checkpassword", post(auth::check_password))
        .route("/user/password", put(users::update_password))
        .route("/user/edit", put(users::edit_profile))
        .route("/user/updatepf", put(users::update_profile_image))
        .route("/user/{id}", get(users::show))
        .route("/user/follow/{id}", put(follows::follow))
        .route("/user/unfollow/{id}", put(follows::unfollow))
        .route("/user/follower/{id}", get(follows::followers))
        .route("/user/following/{id}", get(follows::followings))
        // Posts
        .route("/post", get(posts::feed).post(posts::create))
        .route("/post/mypost", get(posts::my_posts))
        .route("/post/highlighted", get(posts::highlighted))
        .route("/post/latest", get(posts::latest))
        .route("/post/user/{id}", get(posts::user_posts))
        .route("/post/group/{id}", get(posts::group_posts))
        .route("/post/related/{id}", get(posts::related))
        .route("/post/like/{id}", put(likes::like).delete(likes::unlike))
        .route("/post/savepost", post(folders::save_post))
        .route("/post/savedPosts/{id}", get(folders::saved_posts))
        .route(
            "/post/{id}",
            get(posts::show).put(posts::update).delete(posts::destroy),
        )
        // Groups
        .route("/group", get(groups::index).post(groups::create))
        .route("/group/mygroups", get(groups::my_groups))
        .route("/group/user/{id}", get(groups::user_groups))
        .route("/group/public/join/{id}", put(groups::join_public))
        .route("/group/leave/{id}", put(groups::leave))
        .route("/group/transfer/{id}", post(groups::transfer))
        .route("/group/notmember/{id}", get(members::not_members))
        .route(
            "/group/member/{id}",
            get(members::index).put(members::update).delete(members::destroy),
        )
        .route("/group/promote/{id}", put(groups::promote))
        .route("/group/demote/{id}", put(groups::demote))
        // Invites
        .route(
            "/group/invite/{id}",
            get(invites::index).post(invites::create).delete(invites::destroy),
        )
        .route("/group/invite/{group_id}/{user_id}", delete(invites::destroy_by_pair))
        .route("/group/invite/accept/{id}", put(invites::accept))
        .route("/group/pending/invite", get(invites::pending))
        // Join requests
        .route("/group/request/{id}", post(requests::toggle).delete(requests::destroy))
        .route("/group/request/accept/{id}", put(requests::accept))
        .route("/group/request/pending/{id}", get(requests::pending))
        .route("/group/{id}", get(groups::show).put(groups::update).delete(groups::destroy))
        // Folders
        .route("/folder", get(folders::index).post(folders::create))
        .route("/folder/post/{id}", get(folders::for_post))
        .route(
            "/folder/{id}",
            get(folders::show).put(folders::update).delete(folders::destroy),
        )
        // Comments
        .route("/comment", post(comments::create))
        .route("/comment/{id}", get(comments::index).delete(comments::destroy))
        .route("/comment/{id}/reply", post(comments::reply))
        // Tags & reports
        .route("/tag", get(tags::index))
        .route("/tag/{id}", get(tags::show))
        .route("/report", post(reports::create))
        // Search & discovery
        .route("/search/user", get(search::users))
        .route("/search/group", get(search::groups))
        .route("/search/post", get(search::posts))
        .route("/random/user", get(search::random_users))
        .route("/random/group", get(search::random_groups))
        .route("/random/post", get(search::random_posts))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/admin/getTotalUsers", get(dashboard::total_users))
        .route("/admin/getTotalPosts", get(dashboard::total_posts))
        .route("/admin/getTotalGroups", get(dashboard::total_groups))
        .route("/admin/getWeeklyNewUsers", get(dashboard::weekly_new_users))
        .route("/admin/get10NewUsers", get(dashboard::newest_users))
        .route(
            "/admin/getTotalPostsOfLastSixMonths",
            get(dashboard::posts_last_six_months),
        )
        .route("/admin/users", get(dashboard::all_users))
        .route("/admin/admins", get(dashboard::all_admins))
        .route("/admin/user/{id}", put(users::admin_update_user))
        .route("/admin/createAdmin", post(users::create_admin))
        .route("/admin/removeAdmin/{id}", put(users::remove_admin))
        .route("/admin/deleteUser/{id}", delete(users::delete_user))
        .route("/admin/tag", get(tags::index).post(tags::create))
        .route("/admin/tag/{id}", put(tags::update).delete(tags::destroy))
        .route("/admin/group", get(groups::index))
        .route("/admin/comment", get(comments::admin_index))
        .route(
            "/admin/comment/{id}",
            get(comments::admin_show).delete(comments::admin_destroy),
        )
        .route("/admin/post", get(posts::admin_index))
        .route(
            "/admin/post/{id}",
            get(posts::admin_show).delete(posts::admin_destroy),
        )
        .route("/admin/report", get(reports::admin_index))
        .route("/admin/postId/{id}", get(reports::admin_show))
        .route("/admin/report/{id}", delete(reports::admin_destroy))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
