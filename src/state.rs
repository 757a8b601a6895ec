//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::account_repository::AccountRepository;
use crate::repositories::checklist_repository::ChecklistRepository;
use crate::repositories::fleet_code_repository::FleetCodeRepository;
use crate::repositories::fleet_member_repository::FleetMemberRepository;
use crate::repositories::truck_repository::TruckRepository;
use crate::services::role_change_service::RoleChangeService;
use crate::storage::{MemoryBackend, RecordStore};

/// Registros compartidos; cada uno es la única vía de escritura a su colección
#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub accounts: Arc<AccountRepository>,
    pub fleet_codes: Arc<FleetCodeRepository>,
    pub members: Arc<FleetMemberRepository>,
    pub trucks: Arc<TruckRepository>,
    pub checklists: Arc<ChecklistRepository>,
    pub role_changes: Arc<RoleChangeService>,
}

impl AppState {
    pub fn new(store: RecordStore, config: EnvironmentConfig) -> Self {
        let accounts = Arc::new(AccountRepository::new(store.clone(), config.bcrypt_cost));
        let fleet_codes = Arc::new(FleetCodeRepository::new(store.clone()));
        let members = Arc::new(FleetMemberRepository::new(store.clone()));
        let role_changes = Arc::new(RoleChangeService::new(
            accounts.clone(),
            fleet_codes.clone(),
            members.clone(),
        ));

        Self {
            accounts,
            fleet_codes,
            members,
            trucks: Arc::new(TruckRepository::new(store.clone())),
            checklists: Arc::new(ChecklistRepository::new(store)),
            role_changes,
            config,
        }
    }

    /// Estado sobre un backend en memoria, con hashing barato
    pub fn in_memory() -> Self {
        let config = EnvironmentConfig {
            bcrypt_cost: 4,
            ..EnvironmentConfig::default()
        };
        Self::new(RecordStore::new(Arc::new(MemoryBackend::new())), config)
    }
}
