use serde::Deserialize;
use validator::Validate;

use crate::models::fleet::{RegisterTruckInput, TruckStatus, TruckUpdate};
use crate::utils::validation::validate_not_empty;

// Request para registrar un camión
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTruckRequest {
    #[validate(custom = "validate_not_empty")]
    pub make: String,
    #[validate(custom = "validate_not_empty")]
    pub model: String,
    pub year: i32,
    #[validate(custom = "validate_not_empty")]
    pub vin: String,
    #[validate(custom = "validate_not_empty")]
    pub license_plate: String,
}

impl From<CreateTruckRequest> for RegisterTruckInput {
    fn from(request: CreateTruckRequest) -> Self {
        Self {
            make: request.make,
            model: request.model,
            year: request.year,
            vin: request.vin,
            license_plate: request.license_plate,
        }
    }
}

// Request para actualizar un camión
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTruckRequest {
    #[validate(custom = "validate_not_empty")]
    pub make: Option<String>,
    #[validate(custom = "validate_not_empty")]
    pub model: Option<String>,
    pub year: Option<i32>,
    #[validate(custom = "validate_not_empty")]
    pub vin: Option<String>,
    #[validate(custom = "validate_not_empty")]
    pub license_plate: Option<String>,
    pub status: Option<TruckStatus>,
}

impl From<UpdateTruckRequest> for TruckUpdate {
    fn from(request: UpdateTruckRequest) -> Self {
        Self {
            make: request.make,
            model: request.model,
            year: request.year,
            vin: request.vin,
            license_plate: request.license_plate,
            status: request.status,
        }
    }
}
