//! Access policy: a fixed decision table over (actor role, actor id, action,
//! target). Pure and stateless; evaluated fresh on every request because role
//! and identity can change between requests.

use crate::error::ApiError;
use crate::users::repo_types::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A single user record, identified by id.
    User(i64),
    UsersCollection,
}

/// Ordered disjunction; the first matching rule wins, no match denies.
pub fn is_allowed(actor: &User, action: Action, target: Target) -> bool {
    // Admins may do anything.
    if actor.is_admin() {
        return true;
    }
    match (action, target) {
        // Users own their record.
        (Action::Read | Action::Update | Action::Delete, Target::User(id)) => id == actor.id,
        // Listing stays admin-only; redundant with the first rule, kept for
        // explicitness.
        (Action::List, Target::UsersCollection) => actor.is_admin(),
        _ => false,
    }
}

pub fn ensure(actor: &User, action: Action, target: Target) -> Result<(), ApiError> {
    if is_allowed(actor, action, target) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::{ROLE_ADMIN, ROLE_USER};
    use time::OffsetDateTime;

    fn user_with(id: i64, role: &str) -> User {
        User {
            id,
            email: format!("u{id}@example.com"),
            password_hash: String::new(),
            full_name: None,
            role: role.into(),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn admin_is_allowed_everything() {
        let admin = user_with(1, ROLE_ADMIN);
        for action in [Action::Read, Action::Update, Action::Delete] {
            assert!(is_allowed(&admin, action, Target::User(42)));
        }
        assert!(is_allowed(&admin, Action::List, Target::UsersCollection));
    }

    #[test]
    fn user_owns_their_record() {
        let user = user_with(7, ROLE_USER);
        for action in [Action::Read, Action::Update, Action::Delete] {
            assert!(is_allowed(&user, action, Target::User(7)));
        }
    }

    #[test]
    fn user_is_denied_other_records() {
        let user = user_with(7, ROLE_USER);
        for action in [Action::Read, Action::Update, Action::Delete] {
            assert!(!is_allowed(&user, action, Target::User(8)));
        }
    }

    #[test]
    fn listing_is_admin_only() {
        let user = user_with(7, ROLE_USER);
        assert!(!is_allowed(&user, Action::List, Target::UsersCollection));
        assert!(matches!(
            ensure(&user, Action::List, Target::UsersCollection),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn unmatched_combinations_deny() {
        let user = user_with(7, ROLE_USER);
        assert!(!is_allowed(&user, Action::List, Target::User(7)));
        assert!(!is_allowed(&user, Action::Read, Target::UsersCollection));
    }
}
