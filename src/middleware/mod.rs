//! Middleware del sistema
//!
//! Extracción de la identidad del llamador y CORS.

pub mod cors;
pub mod identity;

pub use cors::cors_layer;
pub use identity::CallerIdentity;
