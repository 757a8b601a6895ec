//! Services module
//!
//! Este módulo contiene la lógica que coordina escrituras sobre varios
//! registros a la vez.

pub mod role_change_service;

pub use role_change_service::{ProfileChange, RoleChangePlan, RoleChangeService, RoleChangeStep};
