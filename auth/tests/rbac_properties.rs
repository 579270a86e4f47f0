//! Property tests for the role helpers.

use auth_session::rbac::{has_all_roles, has_any_role, has_role};
use auth_session::{ProviderKind, Role, User};
use proptest::prelude::*;

fn role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Admin), Just(Role::Customer), Just(Role::Vendor)]
}

proptest! {
    #[test]
    fn any_role_matches_membership(user_role in role(), roles in prop::collection::vec(role(), 0..6)) {
        let user = User::new("u1", user_role, ProviderKind::Email);
        prop_assert_eq!(has_any_role(Some(&user), &roles), roles.contains(&user_role));
    }

    #[test]
    fn all_roles_implies_any_role(user_role in role(), roles in prop::collection::vec(role(), 0..6)) {
        let user = User::new("u1", user_role, ProviderKind::Email);
        if has_all_roles(Some(&user), &roles) {
            prop_assert!(has_any_role(Some(&user), &roles));
            prop_assert!(roles.iter().all(|r| has_role(Some(&user), *r)));
        }
    }

    #[test]
    fn anonymous_has_no_roles(roles in prop::collection::vec(role(), 0..6)) {
        prop_assert!(!has_any_role(None, &roles));
        prop_assert!(!has_all_roles(None, &roles));
        for r in roles {
            prop_assert!(!has_role(None, r));
        }
    }
}
