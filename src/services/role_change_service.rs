//! Orquestador de cambio de rol
//!
//! Un cambio de rol toca varias colecciones sin transacción. Se modela como
//! un plan de pasos ordenados con clave de idempotencia: cada paso es una
//! escritura independiente y durable, y la escritura de la cuenta va siempre
//! al final para que un reintento recalcule el mismo plan.
//!
//! Es una operación al-menos-una-vez: cada ejecución corre todos los pasos del
//! plan y todos son idempotentes, así que reintentar tras una falla parcial es
//! seguro y además deshace lo que haya cambiado entre una corrida y otra.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::models::user::{Account, AccountRole, AccountUpdate};
use crate::repositories::account_repository::AccountRepository;
use crate::repositories::fleet_code_repository::FleetCodeRepository;
use crate::repositories::fleet_member_repository::FleetMemberRepository;
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChangeStep {
    /// Retirar la membresía activa del conductor
    RemoveMembership,
    /// Desactivar todos los códigos de flota del dueño
    InvalidateFleetCodes,
    /// Merge final sobre la cuenta (rol, perfil, fleet_owner_id)
    UpdateAccount,
}

impl fmt::Display for RoleChangeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoleChangeStep::RemoveMembership => "remove_membership",
            RoleChangeStep::InvalidateFleetCodes => "invalidate_fleet_codes",
            RoleChangeStep::UpdateAccount => "update_account",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleChangePlan {
    pub key: String,
    pub account_id: String,
    pub from: AccountRole,
    pub to: AccountRole,
    pub steps: Vec<RoleChangeStep>,
}

impl RoleChangePlan {
    pub fn new(account_id: &str, from: AccountRole, to: AccountRole) -> Self {
        let steps = match (from, to) {
            (AccountRole::Driver, AccountRole::Owner) => {
                vec![RoleChangeStep::RemoveMembership, RoleChangeStep::UpdateAccount]
            }
            (AccountRole::Owner, AccountRole::Driver) => {
                vec![RoleChangeStep::InvalidateFleetCodes, RoleChangeStep::UpdateAccount]
            }
            _ => vec![RoleChangeStep::UpdateAccount],
        };
        Self {
            key: format!("{}:{}->{}", account_id, from, to),
            account_id: account_id.to_string(),
            from,
            to,
            steps,
        }
    }

    pub fn changes_role(&self) -> bool {
        self.from != self.to
    }
}

/// Cambios de perfil que acompañan al cambio de rol
#[derive(Debug, Clone, Default)]
pub struct ProfileChange {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<AccountRole>,
}

pub struct RoleChangeService {
    accounts: Arc<AccountRepository>,
    fleet_codes: Arc<FleetCodeRepository>,
    members: Arc<FleetMemberRepository>,
    /// Último paso completado por clave de idempotencia; solo diagnóstico
    journal: Mutex<HashMap<String, usize>>,
}

impl RoleChangeService {
    pub fn new(
        accounts: Arc<AccountRepository>,
        fleet_codes: Arc<FleetCodeRepository>,
        members: Arc<FleetMemberRepository>,
    ) -> Self {
        Self {
            accounts,
            fleet_codes,
            members,
            journal: Mutex::new(HashMap::new()),
        }
    }

    /// Aplicar un cambio de perfil, ejecutando los efectos del cambio de rol si lo hay
    pub async fn apply(&self, account_id: &str, change: ProfileChange) -> AppResult<Account> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| not_found_error("Account", account_id))?;

        if let Some(email) = &change.email {
            if self.accounts.email_in_use_by_other(email, account_id).await? {
                return Err(AppError::Conflict(
                    "Email is already in use by another account".to_string(),
                ));
            }
        }

        let plan = RoleChangePlan::new(account_id, account.role, change.role.unwrap_or(account.role));
        self.execute(&plan, &account, &change).await
    }

    /// Pasos completados en una corrida que quedó a medias, si la hubo
    pub async fn pending_progress(&self, key: &str) -> Option<usize> {
        self.journal.lock().await.get(key).copied()
    }

    async fn execute(
        &self,
        plan: &RoleChangePlan,
        account: &Account,
        change: &ProfileChange,
    ) -> AppResult<Account> {
        if let Some(done) = self.pending_progress(&plan.key).await {
            warn!(
                "🔁 Cambio de rol {} interrumpido tras {} paso(s); se reejecuta completo",
                plan.key, done
            );
        } else if plan.changes_role() {
            info!("🔄 Cambio de rol {} ({} pasos)", plan.key, plan.steps.len());
        }

        let mut updated = None;
        for (index, step) in plan.steps.iter().enumerate() {
            let outcome = self.run_step(*step, plan, account, change).await;
            match outcome {
                Ok(result) => {
                    if result.is_some() {
                        updated = result;
                    }
                    if plan.changes_role() {
                        self.journal.lock().await.insert(plan.key.clone(), index + 1);
                    }
                }
                Err(e) if !plan.changes_role() => return Err(e),
                Err(e) => {
                    error!("❌ Cambio de rol {} falló en el paso {}: {}", plan.key, step, e);
                    return Err(AppError::Internal(format!(
                        "role change {} failed at step {}: {}",
                        plan.key, step, e
                    )));
                }
            }
        }

        self.journal.lock().await.remove(&plan.key);
        match updated {
            Some(account) => Ok(account),
            None => Err(AppError::Internal(format!(
                "role change {} finished without an account update",
                plan.key
            ))),
        }
    }

    async fn run_step(
        &self,
        step: RoleChangeStep,
        plan: &RoleChangePlan,
        account: &Account,
        change: &ProfileChange,
    ) -> AppResult<Option<Account>> {
        match step {
            RoleChangeStep::RemoveMembership => {
                let removed = self.members.remove_all_for_driver(&plan.account_id).await?;
                info!("🚪 {}: {} membresía(s) retiradas", plan.key, removed);
                Ok(None)
            }
            RoleChangeStep::InvalidateFleetCodes => {
                let invalidated = self.fleet_codes.invalidate_all_for_owner(&plan.account_id).await?;
                info!("🔒 {}: {} código(s) desactivados", plan.key, invalidated);
                Ok(None)
            }
            RoleChangeStep::UpdateAccount => {
                let fleet_owner_id = match (plan.from, plan.to) {
                    (AccountRole::Driver, AccountRole::Owner) => Some(None),
                    _ => None,
                };
                let update = AccountUpdate {
                    email: change.email.clone(),
                    name: change.name.clone(),
                    role: plan.changes_role().then_some(plan.to),
                    fleet_owner_id,
                };
                let updated = self.accounts.update(&account.id, update).await?;
                Ok(Some(updated))
            }
        }
    }
}
