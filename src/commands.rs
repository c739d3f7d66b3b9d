// Tauri plugin surface. The only module that imports tauri; everything it
// does is delegated to the pure modules.

use std::sync::Arc;

use serde::Serialize;
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{AppHandle, Emitter, Manager, RunEvent, Runtime, State, WindowEvent};

use crate::modules::actions::{self, CloseOutcome, CloseRequest};
use crate::modules::dialogs::DialogTab;
use crate::modules::guard::{BeforeUnloadHook, UnloadDecision, UnsavedChangesGuard};
use crate::modules::sync::{Navigator, RouteSynchronizer, SyncOutcome};
use crate::settings::WorkspaceSettings;
use crate::state::{TabsSnapshot, WorkspaceState, WorkspaceTab};

const SETTINGS_FILE: &str = "workspace_settings.json";

/// Asks the frontend router to show a path.
struct EventNavigator<R: Runtime> {
    app: AppHandle<R>,
}

impl<R: Runtime> Navigator for EventNavigator<R> {
    fn navigate(&self, path: &str) {
        if let Err(e) = self.app.emit("workspace-navigate", path) {
            log::warn!("[Workspace] Failed to emit navigation to {}: {}", path, e);
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CloseResponse {
    Closed { tab: DialogTab },
    /// The frontend should show its confirmation dialog, then call
    /// `close_tab` again with `confirmed: true`.
    NeedsConfirmation { tab: DialogTab },
    Kept,
    /// The save ran and failed; the tab stays open and dirty.
    SaveFailed { error: String },
    NotClosable,
    Missing,
}

impl From<CloseOutcome> for CloseResponse {
    fn from(outcome: CloseOutcome) -> Self {
        match outcome {
            CloseOutcome::Closed(tab) => Self::Closed {
                tab: DialogTab::from(&tab),
            },
            CloseOutcome::Kept => Self::Kept,
            CloseOutcome::SaveFailed(e) => Self::SaveFailed {
                error: e.to_string(),
            },
            CloseOutcome::NotClosable => Self::NotClosable,
            CloseOutcome::Missing => Self::Missing,
        }
    }
}

#[tauri::command]
fn path_changed(sync: State<'_, Arc<RouteSynchronizer>>, path: String) -> SyncOutcome {
    sync.on_path_change(&path)
}

#[tauri::command]
fn get_tabs(state: State<'_, WorkspaceState>) -> TabsSnapshot {
    state.snapshot()
}

#[tauri::command]
fn focus_tab(sync: State<'_, Arc<RouteSynchronizer>>, id: String) -> bool {
    sync.focus_tab(&id)
}

#[tauri::command]
fn close_tab(sync: State<'_, Arc<RouteSynchronizer>>, id: String, confirmed: bool) -> CloseResponse {
    if confirmed {
        return actions::force_close(&sync, &id).into();
    }
    match actions::request_close(&sync, &id) {
        CloseRequest::Done(outcome) => outcome.into(),
        CloseRequest::NeedsConfirmation(tab) => CloseResponse::NeedsConfirmation {
            tab: DialogTab::from(&tab),
        },
    }
}

#[tauri::command]
fn set_unsaved_changes(state: State<'_, WorkspaceState>, id: String, flag: bool) -> bool {
    state.update(|store| store.set_unsaved_changes(&id, flag))
}

#[tauri::command]
fn mark_dirty(guard: State<'_, UnsavedChangesGuard>) -> bool {
    guard.mark_dirty()
}

#[tauri::command]
fn mark_clean(guard: State<'_, UnsavedChangesGuard>) -> bool {
    guard.mark_clean()
}

#[tauri::command]
fn has_unsaved_changes(guard: State<'_, UnsavedChangesGuard>) -> bool {
    guard.has_unsaved_changes()
}

#[tauri::command]
fn reorder_tabs(state: State<'_, WorkspaceState>, new_order: Vec<String>) -> bool {
    log::debug!("[Tab Reorder] Received new order: {:?}", new_order);
    let changed = state.update(|store| store.reorder(&new_order));
    log::debug!("[Tab Reorder] Changed: {}", changed);
    changed
}

#[tauri::command]
fn reopen_closed_tab(sync: State<'_, Arc<RouteSynchronizer>>) -> Option<String> {
    sync.reopen_closed_tab()
}

#[tauri::command]
fn dirty_tabs(state: State<'_, WorkspaceState>) -> Vec<WorkspaceTab> {
    state.read(|store| store.dirty_tabs())
}

/// Called by the frontend's `beforeunload` listener.
#[tauri::command]
fn before_unload(hook: State<'_, BeforeUnloadHook>) -> UnloadDecision {
    hook.on_before_unload()
}

/// The user confirmed leaving with unsaved changes.
#[tauri::command]
fn discard_and_exit<R: Runtime>(app: AppHandle<R>) {
    log::info!("[Workspace] Exiting and discarding unsaved changes");
    app.exit(0);
}

/// Emits every published snapshot as `update-tabs`.
fn forward_snapshots<R: Runtime>(app: AppHandle<R>, state: &WorkspaceState) {
    let mut rx = state.subscribe();
    tauri::async_runtime::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            if let Err(e) = app.emit("update-tabs", snapshot) {
                log::warn!("[Workspace] Failed to emit update-tabs: {}", e);
            }
        }
    });
}

/// The host app installs its own logger (e.g. `tauri-plugin-log`) before
/// registering this plugin.
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("workspace")
        .invoke_handler(tauri::generate_handler![
            path_changed,
            get_tabs,
            focus_tab,
            close_tab,
            set_unsaved_changes,
            mark_dirty,
            mark_clean,
            has_unsaved_changes,
            reorder_tabs,
            reopen_closed_tab,
            dirty_tabs,
            before_unload,
            discard_and_exit
        ])
        .setup(|app, _api| {
            let settings_path = app.path().app_data_dir()?.join(SETTINGS_FILE);
            let state = WorkspaceState::new(WorkspaceSettings::load(&settings_path))?;

            let navigator = Arc::new(EventNavigator { app: app.clone() });
            let sync = Arc::new(RouteSynchronizer::new(state.clone(), navigator));
            let guard = UnsavedChangesGuard::new(state.clone());
            if let Some(hook) = guard.install_before_unload() {
                app.manage(hook);
            }

            forward_snapshots(app.clone(), &state);
            app.manage(state);
            app.manage(sync);
            app.manage(guard);
            Ok(())
        })
        .on_event(|app, event| {
            // Native counterpart of beforeunload: closing the window.
            if let RunEvent::WindowEvent {
                event: WindowEvent::CloseRequested { api, .. },
                ..
            } = event
            {
                let Some(hook) = app.try_state::<BeforeUnloadHook>() else {
                    return;
                };
                if hook.on_before_unload() == UnloadDecision::Confirm {
                    api.prevent_close();
                    let dirty = app.state::<WorkspaceState>().read(|store| store.dirty_tabs());
                    if let Err(e) = app.emit("unsaved-changes-on-exit", dirty) {
                        log::warn!("[Workspace] Failed to emit unsaved-changes-on-exit: {}", e);
                    }
                }
            }
        })
        .build()
}
