use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::checklist::{progress_percent, Checklist, ChecklistItemInput};

// Request para crear un checklist
#[derive(Debug, Deserialize)]
pub struct CreateChecklistRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<ChecklistItemInput>,
}

// Request para actualizar un checklist
#[derive(Debug, Default, Deserialize)]
pub struct UpdateChecklistRequest {
    pub title: Option<String>,
    pub items: Option<Vec<ChecklistItemInput>>,
}

// Request de un conductor para marcar un ítem
#[derive(Debug, Deserialize)]
pub struct SetCompletionRequest {
    pub checklist_id: String,
    pub item_id: String,
    pub completed: bool,
}

/// Checklist tal como lo ve quien lo consulta; el avance solo aplica a conductores
#[derive(Debug, Serialize)]
pub struct ChecklistView {
    #[serde(flatten)]
    pub checklist: Checklist,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_status: Option<HashMap<String, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl ChecklistView {
    pub fn for_owner(checklist: Checklist) -> Self {
        Self {
            checklist,
            completion_status: None,
            progress: None,
        }
    }

    pub fn for_driver(checklist: Checklist, status: HashMap<String, bool>) -> Self {
        let completed = checklist
            .items
            .iter()
            .filter(|item| status.get(&item.id).copied().unwrap_or(false))
            .count();
        let progress = progress_percent(completed, checklist.items.len());
        Self {
            checklist,
            completion_status: Some(status),
            progress: Some(progress),
        }
    }
}
