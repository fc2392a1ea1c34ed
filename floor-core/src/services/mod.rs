//! Service layer - record-keeping services without cross-entity effects
//!
//! # Services
//!
//! - [`CatalogService`] - menu items and recipes
//! - [`StaffService`] - staff profiles

pub mod catalog_service;
pub mod staff_service;

pub use catalog_service::CatalogService;
pub use staff_service::StaffService;
