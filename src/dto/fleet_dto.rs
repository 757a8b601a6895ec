use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::fleet::{FleetCode, FleetMembership};

// Request para ingresar a una flota
#[derive(Debug, Deserialize)]
pub struct JoinFleetRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct FleetCodeResponse {
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<FleetCode> for FleetCodeResponse {
    fn from(code: FleetCode) -> Self {
        Self {
            code: code.code,
            created_at: code.created_at,
            expires_at: code.expires_at,
            is_active: code.is_active,
        }
    }
}

// Miembro de la flota visto por el dueño
#[derive(Debug, Serialize)]
pub struct FleetMemberResponse {
    pub id: String,
    pub driver_id: String,
    pub owner_id: String,
    pub driver_email: String,
    pub driver_name: String,
    pub joined_at: DateTime<Utc>,
}

impl From<FleetMembership> for FleetMemberResponse {
    fn from(member: FleetMembership) -> Self {
        Self {
            id: member.id,
            driver_id: member.driver_id,
            owner_id: member.owner_id,
            driver_email: member.driver_email,
            driver_name: member.driver_name,
            joined_at: member.joined_at,
        }
    }
}
