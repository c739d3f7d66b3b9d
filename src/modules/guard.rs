// Unsaved-changes guard: the dirty-flag API page content talks to.

use std::sync::atomic::Ordering;

use serde::Serialize;

use crate::state::{WorkspaceState, WorkspaceTab};

/// Answer to a whole-page unload attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnloadDecision {
    Allow,
    /// Ask the host for its native "leave page?" confirmation.
    Confirm,
}

/// Operates on whichever tab is active at call time. Content components
/// call `mark_dirty`/`mark_clean` around their own edit and save events;
/// nothing here infers dirtiness.
#[derive(Clone)]
pub struct UnsavedChangesGuard {
    state: WorkspaceState,
}

impl UnsavedChangesGuard {
    pub fn new(state: WorkspaceState) -> Self {
        Self { state }
    }

    /// Returns false if there was no active tab to mark.
    pub fn mark_dirty(&self) -> bool {
        self.set_active(true)
    }

    pub fn mark_clean(&self) -> bool {
        self.set_active(false)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.state.read(|store| {
            store
                .get_active_tab()
                .map_or(false, |t| t.has_unsaved_changes)
        })
    }

    pub fn active_tab(&self) -> Option<WorkspaceTab> {
        self.state.read(|store| store.get_active_tab().cloned())
    }

    fn set_active(&self, flag: bool) -> bool {
        self.state.update(|store| {
            let Some(id) = store.active_tab_id().map(str::to_string) else {
                log::debug!("[Guard] No active tab to mark");
                return false;
            };
            store.set_unsaved_changes(&id, flag)
        })
    }

    /// Installs the page-unload hook for the hosting view.
    ///
    /// Only one hook exists per workspace; a second install returns `None`
    /// until the first is dropped.
    pub fn install_before_unload(&self) -> Option<BeforeUnloadHook> {
        if self
            .state
            .unload_hook_installed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("[Guard] beforeunload hook already installed");
            return None;
        }

        log::debug!("[Guard] beforeunload hook installed");
        Some(BeforeUnloadHook {
            guard: self.clone(),
        })
    }
}

/// Live `beforeunload` registration; dropping it uninstalls the hook.
pub struct BeforeUnloadHook {
    guard: UnsavedChangesGuard,
}

impl BeforeUnloadHook {
    /// Re-reads the active tab's flag at the moment the page tries to leave.
    pub fn on_before_unload(&self) -> UnloadDecision {
        if self.guard.state.prompt_on_unload() && self.guard.has_unsaved_changes() {
            log::info!("[Guard] Page unload with unsaved changes, asking for confirmation");
            UnloadDecision::Confirm
        } else {
            UnloadDecision::Allow
        }
    }
}

impl Drop for BeforeUnloadHook {
    fn drop(&mut self) {
        self.guard
            .state
            .unload_hook_installed
            .store(false, Ordering::Release);
        log::debug!("[Guard] beforeunload hook removed");
    }
}
