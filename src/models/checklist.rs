//! Modelos de checklist
//!
//! Checklists creados por un dueño y el estado de completitud por conductor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Record;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistItem {
    pub id: String,
    pub description: String,
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checklist {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub items: Vec<ChecklistItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Checklist {
    pub fn has_item(&self, item_id: &str) -> bool {
        self.items.iter().any(|item| item.id == item_id)
    }
}

impl Record for Checklist {
    const COLLECTION: &'static str = "checklists";
}

/// Una fila por (checklist, ítem, conductor)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistCompletion {
    pub id: String,
    pub checklist_id: String,
    pub item_id: String,
    pub driver_id: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChecklistCompletion {
    pub fn matches(&self, checklist_id: &str, item_id: &str, driver_id: &str) -> bool {
        self.checklist_id == checklist_id && self.item_id == item_id && self.driver_id == driver_id
    }
}

impl Record for ChecklistCompletion {
    const COLLECTION: &'static str = "checklist_completions";
}

/// Ítem de entrada: sin id al crear; con o sin id al actualizar
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ChecklistItemInput {
    #[serde(default)]
    pub id: Option<String>,
    pub description: String,
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct CreateChecklistInput {
    pub title: String,
    pub items: Vec<ChecklistItemInput>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateChecklistInput {
    pub title: Option<String>,
    pub items: Option<Vec<ChecklistItemInput>>,
}

/// Porcentaje de avance redondeado; 0 para un checklist vacío
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (completed.min(total) as f64 / total as f64 * 100.0).round();
    percent as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent_rounds() {
        assert_eq!(progress_percent(0, 3), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(0, 0), 0);
    }

    #[test]
    fn test_completed_at_omitted_when_absent() {
        let completion = ChecklistCompletion {
            id: "completion_1".to_string(),
            checklist_id: "c".to_string(),
            item_id: "i".to_string(),
            driver_id: "d".to_string(),
            completed: false,
            completed_at: None,
        };
        let json = serde_json::to_value(&completion).unwrap();
        assert!(json.get("completed_at").is_none());
    }
}
