// End-to-end scenarios driven through the public API only.

use std::sync::{Arc, Mutex};

use portal_workspace_lib::modules::actions::{close_tab_with_confirmation, logout_with_confirmation};
use portal_workspace_lib::{
    CloseOutcome, LogoutDecision, LogoutWarningDialog, Navigator, RouteSpec, RouteSynchronizer,
    SyncOutcome, TabCloseConfirmDialog, UnsavedChangesGuard, WorkspaceSettings, WorkspaceState,
    DASHBOARD_TAB_ID,
};
use rstest::rstest;
use tokio::task::yield_now;

#[derive(Default)]
struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.visited.lock().unwrap().push(path.to_string());
    }
}

fn payroll_only_settings() -> WorkspaceSettings {
    WorkspaceSettings {
        routes: vec![
            RouteSpec::new(r"^/payroll(/.*)?$", "Payroll", "payroll", "wallet"),
            RouteSpec::new(r"^/leave(/.*)?$", "Leave", "leave", "calendar"),
            RouteSpec::new(r"^/appraisals(/.*)?$", "Appraisals", "appraisals", "star"),
        ],
        ..WorkspaceSettings::default()
    }
}

fn workspace() -> (Arc<RouteSynchronizer>, Arc<RecordingNavigator>) {
    let state = WorkspaceState::new(payroll_only_settings()).unwrap();
    let navigator = Arc::new(RecordingNavigator::default());
    let sync = Arc::new(RouteSynchronizer::new(state, navigator.clone()));
    (sync, navigator)
}

#[test]
fn new_module_path_opens_a_tab() {
    let (sync, _) = workspace();
    assert_eq!(sync.state().snapshot().tabs.len(), 1);

    let outcome = sync.on_path_change("/payroll/runs");

    let snapshot = sync.state().snapshot();
    assert!(matches!(outcome, SyncOutcome::Opened(_)));
    assert_eq!(snapshot.tabs.len(), 2);
    let tab = &snapshot.tabs[1];
    assert_eq!(tab.route, "/payroll/runs");
    assert_eq!(tab.title, "Payroll");
    assert_eq!(tab.module_code, "payroll");
    assert_eq!(snapshot.active_tab_id.as_deref(), Some(tab.id.as_str()));
}

#[test]
fn sub_route_reuses_inactive_module_tab() {
    let (sync, _) = workspace();
    sync.on_path_change("/payroll");
    sync.on_path_change("/");
    let payroll_id = sync.state().snapshot().tabs[1].id.clone();

    let outcome = sync.on_path_change("/payroll/runs");

    let snapshot = sync.state().snapshot();
    assert_eq!(outcome, SyncOutcome::Updated(payroll_id.clone()));
    assert_eq!(snapshot.tabs.len(), 2);
    assert_eq!(snapshot.tabs[1].route, "/payroll/runs");
    assert_eq!(snapshot.active_tab_id, Some(payroll_id));
}

#[rstest]
#[case("/payroll")]
#[case("/payroll/runs/2024?sort=desc")]
#[case("/login")]
#[case("/")]
fn repeated_path_change_is_idempotent(#[case] path: &str) {
    let (sync, _) = workspace();
    sync.on_path_change("/leave");

    sync.on_path_change(path);
    let once = sync.state().snapshot();
    sync.on_path_change(path);

    assert_eq!(sync.state().snapshot(), once);
}

#[test]
fn dashboard_survives_close() {
    let (sync, _) = workspace();
    sync.on_path_change("/payroll");
    let count = sync.state().snapshot().tabs.len();

    let _ = sync.close_tab(DASHBOARD_TAB_ID);

    let snapshot = sync.state().snapshot();
    assert_eq!(snapshot.tabs.len(), count);
    assert!(snapshot.tabs.iter().any(|t| t.id == DASHBOARD_TAB_ID));
}

#[test]
fn closing_active_tab_activates_left_neighbour_and_navigates() {
    let (sync, navigator) = workspace();
    sync.on_path_change("/payroll");
    sync.on_path_change("/leave");
    sync.on_path_change("/appraisals");
    let ids: Vec<String> = sync.state().snapshot().tabs.iter().map(|t| t.id.clone()).collect();

    sync.close_tab(&ids[3]).unwrap();

    assert_eq!(sync.state().snapshot().active_tab_id.as_deref(), Some(ids[2].as_str()));
    assert_eq!(*navigator.visited.lock().unwrap(), vec!["/leave".to_string()]);
    // The router's echo of that navigation does nothing.
    assert_eq!(sync.on_path_change("/leave"), SyncOutcome::Ignored);
}

#[tokio::test]
async fn cancelling_close_of_dirty_tab_changes_nothing() {
    let (sync, _) = workspace();
    sync.on_path_change("/payroll");
    let guard = UnsavedChangesGuard::new(sync.state().clone());
    guard.mark_dirty();
    let active = guard.active_tab().unwrap();
    let before = sync.state().snapshot();

    let dialog = Arc::new(Mutex::new(TabCloseConfirmDialog::new()));
    let task = {
        let (sync, dialog, id) = (sync.clone(), dialog.clone(), active.id.clone());
        tokio::spawn(async move {
            close_tab_with_confirmation(&sync, &id, |tab| dialog.lock().unwrap().open(tab)).await
        })
    };
    while !dialog.lock().unwrap().is_open() {
        yield_now().await;
    }
    assert_eq!(dialog.lock().unwrap().candidate().unwrap().id, active.id);
    dialog.lock().unwrap().cancel();

    assert!(matches!(task.await.unwrap(), CloseOutcome::Kept));
    assert!(!dialog.lock().unwrap().is_open());
    let after = sync.state().snapshot();
    assert_eq!(after.tabs.len(), before.tabs.len());
    assert_eq!(after.active_tab_id, before.active_tab_id);
    assert!(guard.has_unsaved_changes());
}

#[tokio::test]
async fn logout_lists_every_dirty_tab() {
    let (sync, _) = workspace();
    for path in ["/payroll", "/leave", "/appraisals"] {
        sync.on_path_change(path);
        UnsavedChangesGuard::new(sync.state().clone()).mark_dirty();
    }

    let dialog = Arc::new(Mutex::new(LogoutWarningDialog::new()));
    let task = {
        let (state, dialog) = (sync.state().clone(), dialog.clone());
        tokio::spawn(async move {
            logout_with_confirmation(&state, |tabs| dialog.lock().unwrap().open(tabs)).await
        })
    };
    while !dialog.lock().unwrap().is_open() {
        yield_now().await;
    }
    let listed: Vec<String> = dialog
        .lock()
        .unwrap()
        .dirty_tabs()
        .iter()
        .map(|t| t.route.clone())
        .collect();
    assert_eq!(listed, vec!["/payroll", "/leave", "/appraisals"]);
    dialog.lock().unwrap().confirm();

    assert_eq!(task.await.unwrap(), LogoutDecision::Proceed);
    // Logout is the caller's business; the store keeps its flags.
    assert_eq!(sync.state().read(|s| s.dirty_tabs().len()), 3);
}
