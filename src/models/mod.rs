//! Modelos del sistema
//!
//! Este módulo contiene las entidades persistidas en el record store,
//! una colección por tipo.

pub mod checklist;
pub mod fleet;
pub mod user;
