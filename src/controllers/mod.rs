//! Controladores
//!
//! Reglas de negocio que cruzan registros y verificación de roles.

pub mod account_controller;
pub mod checklist_controller;
pub mod fleet_controller;
pub mod truck_controller;
