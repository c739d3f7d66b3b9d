// Confirmation-gated workspace actions.
// Each flow reads the store, asks through a dialog when data would be lost,
// awaits the answer, and only then acts.

use futures_util::future::BoxFuture;

use crate::error::WorkspaceError;
use crate::modules::dialogs::{CloseDecision, LogoutDecision, PendingDecision, UnsavedChangesChoice};
use crate::modules::sync::RouteSynchronizer;
use crate::state::{WorkspaceState, WorkspaceTab};

pub type SaveFuture = BoxFuture<'static, Result<(), WorkspaceError>>;

/// Caller-supplied save for "save and close". It must only resolve `Ok`
/// once the data is actually persisted.
pub type SaveHandler = Box<dyn FnOnce() -> SaveFuture + Send>;

#[derive(Debug)]
pub enum CloseOutcome {
    Closed(WorkspaceTab),
    /// The user backed out; nothing changed.
    Kept,
    /// The pinned Dashboard tab.
    NotClosable,
    /// No such tab, usually because it was closed in the meantime.
    Missing,
    /// Saving failed, so the tab stays open and dirty.
    SaveFailed(WorkspaceError),
}

impl CloseOutcome {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

#[derive(Debug)]
pub enum CloseRequest {
    Done(CloseOutcome),
    /// The tab is dirty; ask the user before calling [`force_close`].
    NeedsConfirmation(WorkspaceTab),
}

/// Closes a clean tab right away, or reports that confirmation is needed.
pub fn request_close(sync: &RouteSynchronizer, id: &str) -> CloseRequest {
    let Some(tab) = sync.state().read(|store| store.get(id).cloned()) else {
        log::debug!("[Workspace] Close requested for unknown tab {}", id);
        return CloseRequest::Done(CloseOutcome::Missing);
    };

    if tab.is_dashboard() {
        return CloseRequest::Done(CloseOutcome::NotClosable);
    }
    if tab.has_unsaved_changes {
        return CloseRequest::NeedsConfirmation(tab);
    }
    CloseRequest::Done(force_close(sync, id))
}

/// Closes without looking at the dirty flag. Only call this once the user
/// has confirmed, or for tabs known to be clean.
pub fn force_close(sync: &RouteSynchronizer, id: &str) -> CloseOutcome {
    match sync.close_tab(id) {
        Ok(Some(tab)) => CloseOutcome::Closed(tab),
        Ok(None) => CloseOutcome::Missing,
        Err(e) => {
            log::warn!("[Workspace] Refused to close {}: {}", id, e);
            CloseOutcome::NotClosable
        }
    }
}

/// Close with a yes/no confirmation for dirty tabs.
pub async fn close_tab_with_confirmation<F>(
    sync: &RouteSynchronizer,
    id: &str,
    ask: F,
) -> CloseOutcome
where
    F: FnOnce(&WorkspaceTab) -> PendingDecision<CloseDecision>,
{
    let tab = match request_close(sync, id) {
        CloseRequest::Done(outcome) => return outcome,
        CloseRequest::NeedsConfirmation(tab) => tab,
    };

    match ask(&tab).await {
        CloseDecision::Close => force_close(sync, id),
        CloseDecision::Keep => {
            log::debug!("[Workspace] Close of {} cancelled", id);
            CloseOutcome::Kept
        }
    }
}

/// Close with the three-way unsaved-changes prompt.
///
/// For "save and close" the save is awaited first. The tab is closed only
/// if it succeeds; a failed save comes back as `SaveFailed` with the tab
/// still open and still dirty.
pub async fn close_tab_with_unsaved_dialog<F>(
    sync: &RouteSynchronizer,
    id: &str,
    save: Option<SaveHandler>,
    ask: F,
) -> CloseOutcome
where
    F: FnOnce(&WorkspaceTab, bool) -> PendingDecision<UnsavedChangesChoice>,
{
    let tab = match request_close(sync, id) {
        CloseRequest::Done(outcome) => return outcome,
        CloseRequest::NeedsConfirmation(tab) => tab,
    };

    match ask(&tab, save.is_some()).await {
        UnsavedChangesChoice::Cancel => CloseOutcome::Kept,
        UnsavedChangesChoice::Discard => {
            log::info!("[Workspace] Discarding unsaved changes in {}", id);
            force_close(sync, id)
        }
        UnsavedChangesChoice::SaveAndClose => {
            let Some(save) = save else {
                log::warn!("[Workspace] Save chosen for {} without a save handler", id);
                return CloseOutcome::Kept;
            };

            match save().await {
                Ok(()) => {
                    sync.state().update(|store| store.set_unsaved_changes(id, false));
                    force_close(sync, id)
                }
                Err(e) => {
                    log::error!("[Workspace] Save failed for {}, keeping tab open: {}", id, e);
                    CloseOutcome::SaveFailed(e)
                }
            }
        }
    }
}

/// Decides whether logout may go ahead.
///
/// Every dirty tab is presented, not just the active one, since logout
/// discards the whole session. The store is left as-is either way.
pub async fn logout_with_confirmation<F>(state: &WorkspaceState, ask: F) -> LogoutDecision
where
    F: FnOnce(&[WorkspaceTab]) -> PendingDecision<LogoutDecision>,
{
    let dirty = state.read(|store| store.dirty_tabs());
    if dirty.is_empty() {
        return LogoutDecision::Proceed;
    }

    log::info!("[Workspace] Logout requested with {} dirty tab(s)", dirty.len());
    let decision = ask(&dirty).await;
    if decision == LogoutDecision::Abort {
        log::debug!("[Workspace] Logout aborted");
    }
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::dialogs::{LogoutWarningDialog, TabCloseConfirmDialog, UnsavedChangesDialog};
    use crate::modules::sync::Navigator;
    use crate::settings::WorkspaceSettings;
    use crate::state::DASHBOARD_TAB_ID;
    use futures_util::FutureExt;
    use std::sync::{Arc, Mutex};
    use tokio::task::yield_now;

    struct NullNavigator;

    impl Navigator for NullNavigator {
        fn navigate(&self, _path: &str) {}
    }

    fn sync_with(paths: &[&str]) -> Arc<RouteSynchronizer> {
        let state = WorkspaceState::new(WorkspaceSettings::default()).unwrap();
        let sync = Arc::new(RouteSynchronizer::new(state, Arc::new(NullNavigator)));
        for path in paths {
            sync.on_path_change(path);
        }
        sync
    }

    fn dirty(sync: &RouteSynchronizer, id: &str) -> Option<bool> {
        sync.state().read(|s| s.get(id).map(|t| t.has_unsaved_changes))
    }

    #[test]
    fn test_request_close_clean_tab_closes() {
        let sync = sync_with(&["/payroll"]);
        assert!(matches!(
            request_close(&sync, "tab-1"),
            CloseRequest::Done(CloseOutcome::Closed(_))
        ));
        assert!(matches!(
            request_close(&sync, "tab-1"),
            CloseRequest::Done(CloseOutcome::Missing)
        ));
        assert!(matches!(
            request_close(&sync, DASHBOARD_TAB_ID),
            CloseRequest::Done(CloseOutcome::NotClosable)
        ));
    }

    #[test]
    fn test_request_close_dirty_tab_needs_confirmation() {
        let sync = sync_with(&["/payroll"]);
        sync.state().update(|s| s.set_unsaved_changes("tab-1", true));

        match request_close(&sync, "tab-1") {
            CloseRequest::NeedsConfirmation(tab) => assert_eq!(tab.id, "tab-1"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(sync.state().snapshot().tabs.len(), 2);
    }

    #[tokio::test]
    async fn test_confirmed_close() {
        let sync = sync_with(&["/payroll"]);
        sync.state().update(|s| s.set_unsaved_changes("tab-1", true));
        let dialog = Arc::new(Mutex::new(TabCloseConfirmDialog::new()));

        let task = {
            let (sync, dialog) = (sync.clone(), dialog.clone());
            tokio::spawn(async move {
                close_tab_with_confirmation(&sync, "tab-1", |tab| dialog.lock().unwrap().open(tab))
                    .await
            })
        };
        while !dialog.lock().unwrap().is_open() {
            yield_now().await;
        }
        dialog.lock().unwrap().confirm();

        assert!(task.await.unwrap().is_closed());
        assert!(dirty(&sync, "tab-1").is_none());
    }

    #[tokio::test]
    async fn test_save_failure_keeps_tab_dirty() {
        let sync = sync_with(&["/payroll"]);
        sync.state().update(|s| s.set_unsaved_changes("tab-1", true));
        let dialog = Arc::new(Mutex::new(UnsavedChangesDialog::new()));

        let save: SaveHandler = Box::new(|| -> SaveFuture {
            async { Err(WorkspaceError::SaveFailed("db offline".into())) }.boxed()
        });

        let task = {
            let (sync, dialog) = (sync.clone(), dialog.clone());
            tokio::spawn(async move {
                close_tab_with_unsaved_dialog(&sync, "tab-1", Some(save), |tab, can_save| {
                    dialog.lock().unwrap().open(tab, can_save)
                })
                .await
            })
        };
        while !dialog.lock().unwrap().is_open() {
            yield_now().await;
        }
        dialog
            .lock()
            .unwrap()
            .choose(UnsavedChangesChoice::SaveAndClose)
            .unwrap();

        assert!(matches!(task.await.unwrap(), CloseOutcome::SaveFailed(_)));
        assert_eq!(dirty(&sync, "tab-1"), Some(true));
        assert_eq!(sync.state().snapshot().tabs.len(), 2);
    }

    #[tokio::test]
    async fn test_save_success_closes() {
        let sync = sync_with(&["/payroll", "/leave"]);
        sync.state().update(|s| s.set_unsaved_changes("tab-2", true));
        let saved = Arc::new(Mutex::new(false));

        let save: SaveHandler = {
            let saved = saved.clone();
            Box::new(move || -> SaveFuture {
                async move {
                    *saved.lock().unwrap() = true;
                    Ok(())
                }
                .boxed()
            })
        };

        let outcome = close_tab_with_unsaved_dialog(&sync, "tab-2", Some(save), |tab, can_save| {
            assert!(can_save);
            let mut dialog = UnsavedChangesDialog::new();
            let pending = dialog.open(tab, can_save);
            dialog.choose(UnsavedChangesChoice::SaveAndClose).unwrap();
            pending
        })
        .await;

        assert!(*saved.lock().unwrap());
        match outcome {
            CloseOutcome::Closed(tab) => assert!(!tab.has_unsaved_changes),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            sync.state().snapshot().active_tab_id.as_deref(),
            Some("tab-1")
        );
    }

    #[tokio::test]
    async fn test_discard_closes_without_saving() {
        let sync = sync_with(&["/payroll"]);
        sync.state().update(|s| s.set_unsaved_changes("tab-1", true));

        let outcome = close_tab_with_unsaved_dialog(&sync, "tab-1", None, |tab, can_save| {
            let mut dialog = UnsavedChangesDialog::new();
            let pending = dialog.open(tab, can_save);
            dialog.choose(UnsavedChangesChoice::Discard).unwrap();
            pending
        })
        .await;

        assert!(outcome.is_closed());
    }

    #[tokio::test]
    async fn test_clean_tab_skips_the_dialog() {
        let sync = sync_with(&["/payroll"]);
        let outcome = close_tab_with_confirmation(&sync, "tab-1", |_| {
            panic!("dialog must not open for a clean tab")
        })
        .await;
        assert!(outcome.is_closed());
    }

    #[tokio::test]
    async fn test_logout_without_dirty_tabs_proceeds() {
        let sync = sync_with(&["/payroll"]);
        let decision = logout_with_confirmation(sync.state(), |_| {
            panic!("dialog must not open without dirty tabs")
        })
        .await;
        assert_eq!(decision, LogoutDecision::Proceed);
    }

    #[tokio::test]
    async fn test_logout_cancel_changes_nothing() {
        let sync = sync_with(&["/payroll", "/leave"]);
        sync.state().update(|s| s.set_unsaved_changes("tab-1", true));
        let before = sync.state().snapshot();

        let decision = logout_with_confirmation(sync.state(), |tabs| {
            let mut dialog = LogoutWarningDialog::new();
            let pending = dialog.open(tabs);
            assert_eq!(dialog.dirty_tabs().len(), 1);
            dialog.cancel();
            pending
        })
        .await;

        assert_eq!(decision, LogoutDecision::Abort);
        assert_eq!(sync.state().snapshot(), before);
    }
}
