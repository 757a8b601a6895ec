//! Registros por entidad sobre el record store

pub mod account_repository;
pub mod checklist_repository;
pub mod fleet_code_repository;
pub mod fleet_member_repository;
pub mod truck_repository;
