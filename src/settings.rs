use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::WorkspaceError;
use crate::modules::routes::{default_route_specs, RouteSpec};

/// Identity of the pinned tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSettings {
    pub path: String,
    pub title: String,
    pub icon: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            path: "/dashboard".to_string(),
            title: "Dashboard".to_string(),
            icon: "dashboard".to_string(),
        }
    }
}

fn default_strict_invariants() -> bool {
    cfg!(debug_assertions)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkspaceSettings {
    pub dashboard: DashboardSettings,
    /// Capacity of the recently-closed archive.
    pub max_closed_tabs: usize,
    /// Report hard invariant violations to the caller instead of only logging.
    #[serde(default = "default_strict_invariants")]
    pub strict_invariants: bool,
    pub prompt_on_unload: bool,
    pub routes: Vec<RouteSpec>,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            dashboard: DashboardSettings::default(),
            max_closed_tabs: 25,
            strict_invariants: default_strict_invariants(),
            prompt_on_unload: true,
            routes: default_route_specs(),
        }
    }
}

impl WorkspaceSettings {
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    log::warn!("[Settings] Failed to parse settings: {}, returning defaults", e);
                    Self::default()
                }),
                Err(e) => {
                    log::warn!("[Settings] Failed to read file: {}, returning defaults", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), WorkspaceError> {
        let tmp_path = path.with_extension("tmp");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        // Write to tmp, then rename, so a crash never leaves a half-written file.
        fs::write(&tmp_path, json)?;
        fs::rename(tmp_path, path)?;

        Ok(())
    }
}
