//! Authorization
//!
//! - [`permissions`] - the permission evaluator and boundary check

pub mod permissions;

pub use permissions::{
    authorize, default_capabilities, default_permissions, has_permission, has_permission_named,
    is_admin, is_master,
};
