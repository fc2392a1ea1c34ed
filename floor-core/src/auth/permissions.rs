//! Permission Evaluator
//!
//! Pure functions of a profile and a capability. Nothing here reads the
//! store or any ambient session; the acting profile is always passed in.
//!
//! ## Rules
//! - `master` holds every capability regardless of its map
//! - everyone else holds exactly the capabilities mapped to `true`
//! - anything absent or unknown is denied

use crate::security_log;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Capability, PermissionMap, Role, UserProfile};

/// Default capability set granted when a profile is created with a role
pub fn default_capabilities(role: Role) -> &'static [Capability] {
    use Capability::*;
    match role {
        // master is implicit, the map is informational
        Role::Master | Role::Admin => &Capability::ALL,
        Role::Manager => &[Orders, Tables, Reports],
        Role::Waiter => &[Orders, Tables],
        Role::Kitchen => &[Orders],
        Role::Cashier => &[Payments, Reports],
    }
}

/// Role defaults as an explicit map (every capability present)
pub fn default_permissions(role: Role) -> PermissionMap {
    let granted = default_capabilities(role);
    Capability::ALL
        .into_iter()
        .map(|cap| (cap, granted.contains(&cap)))
        .collect()
}

pub fn has_permission(profile: &UserProfile, capability: Capability) -> bool {
    is_master(profile) || profile.permissions.get(capability)
}

/// String entry point for callers holding a raw capability name
pub fn has_permission_named(profile: &UserProfile, capability: &str) -> bool {
    if is_master(profile) {
        return true;
    }
    capability
        .parse::<Capability>()
        .map(|cap| profile.permissions.get(cap))
        .unwrap_or(false)
}

pub fn is_master(profile: &UserProfile) -> bool {
    profile.role == Role::Master
}

pub fn is_admin(profile: &UserProfile) -> bool {
    matches!(profile.role, Role::Admin | Role::Master)
}

/// Boundary check run before every mutation
///
/// Inactive profiles are refused outright, even a master.
pub fn authorize(profile: &UserProfile, capability: Capability) -> AppResult<()> {
    if !profile.is_active {
        security_log!(
            "account_disabled",
            profile_id = profile.id,
            capability = capability.as_str()
        );
        return Err(AppError::new(ErrorCode::AccountDisabled).with_detail("profile_id", profile.id));
    }

    if !has_permission(profile, capability) {
        security_log!(
            "permission_denied",
            profile_id = profile.id,
            role = profile.role.as_str(),
            capability = capability.as_str()
        );
        return Err(AppError::with_message(
            ErrorCode::PermissionDenied,
            format!("Permission denied: {}", capability),
        )
        .with_detail("capability", capability.as_str()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorKind;

    fn profile(role: Role, permissions: PermissionMap) -> UserProfile {
        UserProfile {
            id: 1,
            full_name: "Ana".into(),
            role,
            permissions,
            is_active: true,
        }
    }

    #[test]
    fn test_master_has_everything_with_empty_map() {
        let master = profile(Role::Master, PermissionMap::new());
        for cap in Capability::ALL {
            assert!(has_permission(&master, cap));
        }
        assert!(has_permission_named(&master, "integrations"));
    }

    #[test]
    fn test_master_ignores_explicit_denials() {
        let map = Capability::ALL.into_iter().map(|c| (c, false)).collect();
        let master = profile(Role::Master, map);
        assert!(has_permission(&master, Capability::Users));
    }

    #[test]
    fn test_deny_by_default() {
        let waiter = profile(Role::Waiter, [(Capability::Orders, true)].into_iter().collect());
        assert!(has_permission(&waiter, Capability::Orders));
        assert!(!has_permission(&waiter, Capability::Stock));
        assert!(!has_permission_named(&waiter, "stock"));
        assert!(!has_permission_named(&waiter, "integrations"));
        assert!(has_permission_named(&waiter, "orders"));
    }

    #[test]
    fn test_admin_flags() {
        assert!(is_admin(&profile(Role::Admin, PermissionMap::new())));
        assert!(is_admin(&profile(Role::Master, PermissionMap::new())));
        assert!(!is_admin(&profile(Role::Manager, PermissionMap::new())));
        assert!(!is_master(&profile(Role::Admin, PermissionMap::new())));
    }

    #[test]
    fn test_role_defaults() {
        let manager = default_permissions(Role::Manager);
        assert!(manager.get(Capability::Reports));
        assert!(!manager.get(Capability::Stock));

        let cashier = default_permissions(Role::Cashier);
        assert_eq!(
            cashier.granted().collect::<Vec<_>>(),
            vec![Capability::Reports, Capability::Payments]
        );

        let admin = default_permissions(Role::Admin);
        assert!(Capability::ALL.iter().all(|c| admin.get(*c)));
    }

    #[test]
    fn test_authorize_denied() {
        let waiter = profile(Role::Waiter, default_permissions(Role::Waiter));
        let err = authorize(&waiter, Capability::Stock).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(authorize(&waiter, Capability::Tables).is_ok());
    }

    #[test]
    fn test_authorize_inactive() {
        let mut master = profile(Role::Master, PermissionMap::new());
        master.is_active = false;
        let err = authorize(&master, Capability::Orders).unwrap_err();
        assert_eq!(err.code, ErrorCode::AccountDisabled);
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        // the pure evaluator is unaffected by activation
        assert!(has_permission(&master, Capability::Orders));
    }
}
