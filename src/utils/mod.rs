//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación
//! y generación de códigos e identificadores.

pub mod code_generator;
pub mod errors;
pub mod validation;
