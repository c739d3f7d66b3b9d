// Route <-> tab synchronizer.
// Reacts to router path changes by driving the tab store, and turns tab
// actions that change what is shown back into navigation requests.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::error::WorkspaceError;
use crate::modules::navigation::{is_dashboard_path, module_root, normalize_path};
use crate::modules::tabs::{OpenOutcome, OpenTabRequest};
use crate::state::{TabId, WorkspaceState, WorkspaceTab};

/// The router collaborator's "go to this path" entry point.
///
/// Implementations may dispatch the resulting path change synchronously,
/// straight back into [`RouteSynchronizer::on_path_change`].
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// What a path change did to the tab store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "tabId", rename_all = "camelCase")]
pub enum SyncOutcome {
    /// Same path as the last handled one.
    Ignored,
    /// Root or dashboard path.
    Dashboard,
    /// No route entry matched; the path lives outside the tab system.
    Untracked,
    Opened(TabId),
    Focused(TabId),
    Updated(TabId),
    /// The path's tab was already active on that route.
    Unchanged(TabId),
}

impl From<OpenOutcome> for SyncOutcome {
    fn from(outcome: OpenOutcome) -> Self {
        match outcome {
            OpenOutcome::Opened(id) => Self::Opened(id),
            OpenOutcome::Focused(id) => Self::Focused(id),
            OpenOutcome::Updated(id) => Self::Updated(id),
            OpenOutcome::Unchanged(id) => Self::Unchanged(id),
        }
    }
}

pub struct RouteSynchronizer {
    state: WorkspaceState,
    navigator: Arc<dyn Navigator>,
    last_handled: Mutex<Option<String>>,
}

impl RouteSynchronizer {
    pub fn new(state: WorkspaceState, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            state,
            navigator,
            last_handled: Mutex::new(None),
        }
    }

    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    pub fn last_handled_path(&self) -> Option<String> {
        self.last_handled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records `path` as handled. Returns false if it already was.
    ///
    /// Compares normalized values, so a duplicate delivered with a different
    /// query string or trailing slash is still a duplicate.
    fn claim(&self, path: &str) -> bool {
        let mut last = self.last_handled.lock().unwrap_or_else(PoisonError::into_inner);
        if last.as_deref() == Some(path) {
            return false;
        }
        *last = Some(path.to_string());
        true
    }

    /// Handles one router notification.
    ///
    /// No lock is held while calling out, so a navigator that dispatches
    /// synchronously re-enters here and is answered with `Ignored`.
    pub fn on_path_change(&self, location: &str) -> SyncOutcome {
        let path = normalize_path(location);

        if !self.claim(&path) {
            log::trace!("[Sync] Ignoring repeated path {}", path);
            return SyncOutcome::Ignored;
        }

        let dashboard_path = self.state.dashboard_path();
        if is_dashboard_path(&path, &dashboard_path) {
            self.state.update(|store| store.focus_dashboard());
            return SyncOutcome::Dashboard;
        }

        let routes = self.state.routes();
        let Some(config) = routes.find_route_tab_config(&path) else {
            log::debug!("[Sync] {} has no tab affinity", path);
            return SyncOutcome::Untracked;
        };

        log::debug!(
            "[Sync] {} resolved to module {} (root {:?})",
            path,
            config.module_code,
            module_root(&path)
        );

        let request = OpenTabRequest::from_config(&path, config);
        let outcome = self.state.update(|store| store.open_tab(request));
        SyncOutcome::from(outcome)
    }

    /// Tab strip click: activate the tab and show its route.
    pub fn focus_tab(&self, id: &str) -> bool {
        let route = self.state.update(|store| {
            if store.focus_tab(id) {
                store.get(id).map(|t| t.route.clone())
            } else {
                None
            }
        });

        match route {
            Some(route) => {
                self.navigate_to(&route);
                true
            }
            None => false,
        }
    }

    /// Closes a tab (the caller has already confirmed any unsaved changes)
    /// and shows whichever tab became active.
    pub fn close_tab(&self, id: &str) -> Result<Option<WorkspaceTab>, WorkspaceError> {
        let (closed, new_route) = self.state.update(|store| -> Result<_, WorkspaceError> {
            let was_active = store.active_tab_id() == Some(id);
            let closed = store.close_tab(id)?;
            let new_route = match (&closed, was_active) {
                (Some(_), true) => store.get_active_tab().map(|t| t.route.clone()),
                _ => None,
            };
            Ok((closed, new_route))
        })?;

        if let Some(route) = new_route {
            self.navigate_to(&route);
        }
        Ok(closed)
    }

    /// Reopens the most recently closed tab and shows it.
    pub fn reopen_closed_tab(&self) -> Option<TabId> {
        let reopened = self.state.update(|store| {
            let outcome = store.reopen_closed_tab()?;
            let id = outcome.tab_id().to_string();
            let route = store.get(&id).map(|t| t.route.clone())?;
            Some((id, route))
        });

        let (id, route) = reopened?;
        self.navigate_to(&route);
        Some(id)
    }

    fn navigate_to(&self, route: &str) {
        // Claim first: the router's echo of this navigation must be a no-op.
        self.claim(route);
        log::debug!("[Sync] Navigating to {}", route);
        self.navigator.navigate(route);
    }
}
