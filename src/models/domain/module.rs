use serde::{Deserialize, Serialize};

use crate::models::domain::ModuleProgress;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Module {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub questions_url: String, // absolute, or relative to the API base
}

impl Module {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize)]
pub enum ModuleStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// A fetched module joined with whatever progress the store holds for it.
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleWithProgress {
    pub module: Module,
    pub progress: Option<ModuleProgress>,
}

impl ModuleWithProgress {
    pub fn status(&self) -> ModuleStatus {
        match &self.progress {
            None => ModuleStatus::NotStarted,
            Some(p) if p.is_completed => ModuleStatus::Completed,
            Some(_) => ModuleStatus::InProgress,
        }
    }
}

/// Joins modules with progress records by module id, keeping module order.
pub fn join_progress(modules: &[Module], progress: &[ModuleProgress]) -> Vec<ModuleWithProgress> {
    modules
        .iter()
        .map(|module| ModuleWithProgress {
            module: module.clone(),
            progress: progress.iter().find(|p| p.module_id == module.id).cloned(),
        })
        .collect()
}
