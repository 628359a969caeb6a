//! Group authorization rules, consolidated in one place so every
//! handler consults the same predicate instead of re-deriving it.

use burrow_db::models::{GroupInviteRow, GroupMemberRow, GroupRequestRow, GroupRow, PostRow, UserRow};
use burrow_types::models::{GroupRole, Role, Visibility};

/// The core predicate: global admins, the group owner, and admin-role
/// members all hold admin authority over a group.
pub fn is_group_admin(user: &UserRow, group: &GroupRow, membership: Option<&GroupMemberRow>) -> bool {
    user.role == Role::Admin
        || group.owner_id == user.id
        || membership.is_some_and(|m| m.role == GroupRole::Admin)
}

/// Promote/demote is reserved for the literal owner — an admin-role
/// member does not qualify.
pub fn can_promote(actor: &UserRow, group: &GroupRow) -> bool {
    group.owner_id == actor.id
}

/// Changing another member's role: group-admin authority, never on
/// yourself, and only a global admin may touch another admin member.
pub fn can_edit_member_role(
    actor: &UserRow,
    group: &GroupRow,
    actor_membership: Option<&GroupMemberRow>,
    target: &GroupMemberRow,
) -> bool {
    if target.user_id == actor.id {
        return false;
    }
    if !is_group_admin(actor, group, actor_membership) {
        return false;
    }
    actor.role == Role::Admin || target.role != GroupRole::Admin
}

/// Removing a member: self-removal is always allowed; otherwise
/// group-admin authority with the same admin-precedence rule as
/// [`can_edit_member_role`].
pub fn can_remove_member(
    actor: &UserRow,
    group: &GroupRow,
    actor_membership: Option<&GroupMemberRow>,
    target: &GroupMemberRow,
) -> bool {
    if target.user_id == actor.id {
        return true;
    }
    if !is_group_admin(actor, group, actor_membership) {
        return false;
    }
    actor.role == Role::Admin || target.role != GroupRole::Admin
}

/// Cancelling an invite: the invited user themself, or group-admin
/// authority.
pub fn can_cancel_invite(
    actor: &UserRow,
    group: &GroupRow,
    actor_membership: Option<&GroupMemberRow>,
    invite: &GroupInviteRow,
) -> bool {
    invite.user_id == actor.id || is_group_admin(actor, group, actor_membership)
}

/// Withdrawing a join request: the requester themself, or group-admin
/// authority.
pub fn can_delete_request(
    actor: &UserRow,
    group: &GroupRow,
    actor_membership: Option<&GroupMemberRow>,
    request: &GroupRequestRow,
) -> bool {
    request.user_id == actor.id || is_group_admin(actor, group, actor_membership)
}

/// Deleting a post: its owner, a global admin, or an admin of the group
/// it lives in.
pub fn can_delete_post(
    actor: &UserRow,
    post: &PostRow,
    group_membership: Option<&GroupMemberRow>,
) -> bool {
    post.user_id == actor.id
        || actor.role == Role::Admin
        || group_membership.is_some_and(|m| m.role == GroupRole::Admin)
}

/// Soft-redacting a comment: the comment's author, the post's owner, or
/// a global admin.
pub fn can_redact_comment(actor: &UserRow, comment_author: i64, post_owner: i64) -> bool {
    actor.role == Role::Admin || actor.id == comment_author || actor.id == post_owner
}

/// Private posts are visible to their owner and global admins only.
pub fn can_view_post(actor: &UserRow, post: &PostRow) -> bool {
    post.status == Visibility::Public || post.user_id == actor.id || actor.role == Role::Admin
}

/// A private group's feed is restricted to members and global admins.
pub fn can_view_group_posts(
    actor: &UserRow,
    group: &GroupRow,
    membership: Option<&GroupMemberRow>,
) -> bool {
    group.status == Visibility::Public || actor.role == Role::Admin || membership.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: Role) -> UserRow {
        UserRow {
            id,
            first_name: "T".into(),
            last_name: "U".into(),
            email: format!("u{id}@example.com"),
            password: "x".into(),
            role,
            pf_img_url: String::new(),
            provider: None,
            provider_id: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn group(id: i64, owner_id: i64, status: Visibility) -> GroupRow {
        GroupRow {
            id,
            title: "g".into(),
            img_url: String::new(),
            owner_id,
            status,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn member(group_id: i64, user_id: i64, role: GroupRole) -> GroupMemberRow {
        GroupMemberRow {
            id: user_id * 100,
            group_id,
            user_id,
            role,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn group_admin_truth_table() {
        let g = group(1, 10, Visibility::Public);

        let global_admin = user(99, Role::Admin);
        assert!(is_group_admin(&global_admin, &g, None));

        let owner = user(10, Role::User);
        assert!(is_group_admin(&owner, &g, None));

        let admin_member = user(20, Role::User);
        let m = member(1, 20, GroupRole::Admin);
        assert!(is_group_admin(&admin_member, &g, Some(&m)));

        let plain_member = user(30, Role::User);
        let m = member(1, 30, GroupRole::Member);
        assert!(!is_group_admin(&plain_member, &g, Some(&m)));

        let outsider = user(40, Role::User);
        assert!(!is_group_admin(&outsider, &g, None));
    }

    #[test]
    fn promote_is_owner_only() {
        let g = group(1, 10, Visibility::Public);

        assert!(can_promote(&user(10, Role::User), &g));
        // A group-admin member who is not the owner cannot promote,
        // even though the generic predicate says admin.
        assert!(!can_promote(&user(20, Role::User), &g));
        // Not even a global admin: the owner check is literal.
        assert!(!can_promote(&user(99, Role::Admin), &g));
    }

    #[test]
    fn member_role_edit_blocks_self_and_admin_targets() {
        let g = group(1, 10, Visibility::Public);
        let owner = user(10, Role::User);
        let owner_m = member(1, 10, GroupRole::Admin);

        let target_member = member(1, 30, GroupRole::Member);
        assert!(can_edit_member_role(&owner, &g, Some(&owner_m), &target_member));

        // "Cannot change yourself."
        let self_target = member(1, 10, GroupRole::Admin);
        assert!(!can_edit_member_role(&owner, &g, Some(&owner_m), &self_target));

        // A non-global-admin actor cannot edit an admin-role member.
        let target_admin = member(1, 40, GroupRole::Admin);
        assert!(!can_edit_member_role(&owner, &g, Some(&owner_m), &target_admin));

        // A global admin can.
        let root = user(99, Role::Admin);
        assert!(can_edit_member_role(&root, &g, None, &target_admin));
    }

    #[test]
    fn member_removal_allows_self_regardless_of_role() {
        let g = group(1, 10, Visibility::Public);
        let plain = user(30, Role::User);
        let own_row = member(1, 30, GroupRole::Member);

        assert!(can_remove_member(&plain, &g, Some(&own_row), &own_row));

        // But not someone else.
        let other = member(1, 40, GroupRole::Member);
        assert!(!can_remove_member(&plain, &g, Some(&own_row), &other));

        // Group admin removing an admin member: blocked unless global
        // admin.
        let group_admin = user(20, Role::User);
        let ga_row = member(1, 20, GroupRole::Admin);
        let target_admin = member(1, 40, GroupRole::Admin);
        assert!(!can_remove_member(&group_admin, &g, Some(&ga_row), &target_admin));
        assert!(can_remove_member(&user(99, Role::Admin), &g, None, &target_admin));
    }

    #[test]
    fn invite_cancellation_is_self_service_or_admin() {
        let g = group(1, 10, Visibility::Public);
        let invite = GroupInviteRow {
            id: 5,
            group_id: 1,
            user_id: 30,
            created_at: String::new(),
        };

        assert!(can_cancel_invite(&user(30, Role::User), &g, None, &invite));
        assert!(can_cancel_invite(&user(10, Role::User), &g, None, &invite));
        assert!(!can_cancel_invite(&user(40, Role::User), &g, None, &invite));
    }

    #[test]
    fn private_post_visibility() {
        let post = PostRow {
            id: 1,
            user_id: 30,
            group_id: None,
            title: String::new(),
            description: String::new(),
            img_url: String::new(),
            status: Visibility::Private,
            is_highlighted: false,
            created_at: String::new(),
            updated_at: String::new(),
        };

        assert!(can_view_post(&user(30, Role::User), &post));
        assert!(can_view_post(&user(99, Role::Admin), &post));
        assert!(!can_view_post(&user(40, Role::User), &post));
    }

    #[test]
    fn private_group_feed_requires_membership() {
        let g = group(1, 10, Visibility::Private);
        let m = member(1, 30, GroupRole::Member);

        assert!(can_view_group_posts(&user(30, Role::User), &g, Some(&m)));
        assert!(can_view_group_posts(&user(99, Role::Admin), &g, None));
        assert!(!can_view_group_posts(&user(40, Role::User), &g, None));
    }
}
