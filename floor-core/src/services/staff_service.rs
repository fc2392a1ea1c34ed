//! Staff Service - profile directory
//!
//! Capability checks happen at the facade; this service only enforces that
//! master profiles are touched by masters.

use crate::auth::permissions::{default_permissions, is_master};
use crate::db::{FloorStore, PROFILES, TxRead, TxWrite};
use crate::security_log;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use redb::WriteTransaction;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Capability, ProfileCreate, Role, UserProfile};
use shared::util::snowflake_id;

#[derive(Clone)]
pub struct StaffService {
    store: FloorStore,
}

fn guard_master(actor: &UserProfile, target_role: Role, target_id: Option<i64>) -> AppResult<()> {
    if target_role == Role::Master && !is_master(actor) {
        security_log!(
            "cannot_modify_master",
            actor_id = actor.id,
            target_id = target_id.unwrap_or_default()
        );
        return Err(AppError::new(ErrorCode::CannotModifyMaster)
            .with_detail("actor_id", actor.id));
    }
    Ok(())
}

impl StaffService {
    pub fn new(store: FloorStore) -> Self {
        Self { store }
    }

    fn profile_in(&self, txn: &WriteTransaction, id: i64) -> AppResult<UserProfile> {
        txn.record(PROFILES, id)?
            .ok_or_else(|| AppError::for_id(ErrorCode::ProfileNotFound, id))
    }

    /// Create a profile; role defaults apply unless a map is given
    pub fn create_profile(
        &self,
        actor: &UserProfile,
        payload: ProfileCreate,
    ) -> AppResult<UserProfile> {
        validate_required_text(&payload.full_name, "full_name", MAX_NAME_LEN)?;
        guard_master(actor, payload.role, None)?;

        let profile = UserProfile {
            id: snowflake_id(),
            full_name: payload.full_name.trim().to_string(),
            role: payload.role,
            permissions: payload
                .permissions
                .unwrap_or_else(|| default_permissions(payload.role)),
            is_active: true,
        };
        self.store
            .write(|txn| Ok(txn.put(PROFILES, profile.id, &profile)?))?;
        tracing::info!(
            profile_id = profile.id,
            role = profile.role.as_str(),
            created_by = actor.id,
            "Profile created"
        );
        Ok(profile)
    }

    /// Insert a profile as-is, used to seed the first master
    pub fn bootstrap(&self, full_name: &str) -> AppResult<UserProfile> {
        validate_required_text(full_name, "full_name", MAX_NAME_LEN)?;
        let profile = UserProfile {
            id: snowflake_id(),
            full_name: full_name.trim().to_string(),
            role: Role::Master,
            permissions: default_permissions(Role::Master),
            is_active: true,
        };
        self.store
            .write(|txn| Ok(txn.put(PROFILES, profile.id, &profile)?))?;
        tracing::info!(profile_id = profile.id, "Master profile bootstrapped");
        Ok(profile)
    }

    pub fn set_permission(
        &self,
        actor: &UserProfile,
        profile_id: i64,
        capability: Capability,
        granted: bool,
    ) -> AppResult<UserProfile> {
        let profile = self.store.write(|txn| {
            let mut profile = self.profile_in(txn, profile_id)?;
            guard_master(actor, profile.role, Some(profile_id))?;
            profile.permissions.set(capability, granted);
            txn.put(PROFILES, profile_id, &profile)?;
            Ok(profile)
        })?;
        security_log!(
            "permission_changed",
            actor_id = actor.id,
            profile_id = profile_id,
            capability = capability.as_str(),
            granted = granted
        );
        Ok(profile)
    }

    pub fn set_active(
        &self,
        actor: &UserProfile,
        profile_id: i64,
        is_active: bool,
    ) -> AppResult<UserProfile> {
        let profile = self.store.write(|txn| {
            let mut profile = self.profile_in(txn, profile_id)?;
            guard_master(actor, profile.role, Some(profile_id))?;
            profile.is_active = is_active;
            txn.put(PROFILES, profile_id, &profile)?;
            Ok(profile)
        })?;
        security_log!(
            "profile_active_changed",
            actor_id = actor.id,
            profile_id = profile_id,
            is_active = is_active
        );
        Ok(profile)
    }

    pub fn get(&self, profile_id: i64) -> AppResult<UserProfile> {
        self.store.read(|txn| {
            txn.record(PROFILES, profile_id)?
                .ok_or_else(|| AppError::for_id(ErrorCode::ProfileNotFound, profile_id))
        })
    }

    /// All profiles ordered by name
    pub fn list(&self) -> AppResult<Vec<UserProfile>> {
        let mut profiles: Vec<UserProfile> = self.store.read(|txn| Ok(txn.records(PROFILES)?))?;
        profiles.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permissions::has_permission;
    use shared::ErrorKind;
    use shared::models::PermissionMap;

    fn setup() -> (StaffService, UserProfile) {
        let staff = StaffService::new(FloorStore::open_in_memory().unwrap());
        let master = staff.bootstrap("Owner").unwrap();
        (staff, master)
    }

    fn create(staff: &StaffService, actor: &UserProfile, name: &str, role: Role) -> UserProfile {
        staff
            .create_profile(
                actor,
                ProfileCreate {
                    full_name: name.into(),
                    role,
                    permissions: None,
                },
            )
            .unwrap()
    }

    #[test]
    fn test_role_defaults_applied() {
        let (staff, master) = setup();
        let waiter = create(&staff, &master, "Ana", Role::Waiter);
        assert!(has_permission(&waiter, Capability::Orders));
        assert!(has_permission(&waiter, Capability::Tables));
        assert!(!has_permission(&waiter, Capability::Stock));
        assert!(waiter.is_active);
    }

    #[test]
    fn test_explicit_map_wins() {
        let (staff, master) = setup();
        let mut map = PermissionMap::new();
        map.set(Capability::Stock, true);
        let p = staff
            .create_profile(
                &master,
                ProfileCreate {
                    full_name: "Bruno".into(),
                    role: Role::Kitchen,
                    permissions: Some(map),
                },
            )
            .unwrap();
        assert!(has_permission(&p, Capability::Stock));
        assert!(!has_permission(&p, Capability::Orders));
    }

    #[test]
    fn test_set_permission_persists() {
        let (staff, master) = setup();
        let waiter = create(&staff, &master, "Ana", Role::Waiter);
        staff
            .set_permission(&master, waiter.id, Capability::Stock, true)
            .unwrap();
        assert!(has_permission(&staff.get(waiter.id).unwrap(), Capability::Stock));
    }

    #[test]
    fn test_only_master_touches_master() {
        let (staff, master) = setup();
        let admin = create(&staff, &master, "Carla", Role::Admin);

        let err = staff.set_active(&admin, master.id, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::CannotModifyMaster);
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(staff.get(master.id).unwrap().is_active);

        let err = staff
            .create_profile(
                &admin,
                ProfileCreate {
                    full_name: "Second owner".into(),
                    role: Role::Master,
                    permissions: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CannotModifyMaster);

        // admin may still manage non-master staff
        let waiter = create(&staff, &admin, "Ana", Role::Waiter);
        assert!(!staff.set_active(&admin, waiter.id, false).unwrap().is_active);
    }

    #[test]
    fn test_list_sorted_and_missing() {
        let (staff, master) = setup();
        create(&staff, &master, "Zoe", Role::Cashier);
        create(&staff, &master, "Ana", Role::Waiter);
        let names: Vec<_> = staff.list().unwrap().into_iter().map(|p| p.full_name).collect();
        assert_eq!(names, vec!["Ana", "Owner", "Zoe"]);
        assert_eq!(staff.get(1).unwrap_err().code, ErrorCode::ProfileNotFound);
    }
}
