// Tab store - pure logic, no Tauri imports.
// Owns the ordered tab list, the active pointer and the dirty flags.

use std::collections::HashMap;

use chrono::Utc;

use crate::error::WorkspaceError;
use crate::modules::closed_tabs::ClosedTabs;
use crate::modules::navigation::{is_segment_prefix, module_root, normalize_path};
use crate::modules::routes::RouteTabConfig;
use crate::settings::WorkspaceSettings;
use crate::state::{ClosedTab, TabId, TabsSnapshot, WorkspaceTab, DASHBOARD_TAB_ID};

/// Arguments of [`TabStore::open_tab`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenTabRequest {
    pub route: String,
    pub title: String,
    pub module_code: String,
    pub icon: String,
}

impl OpenTabRequest {
    pub fn new(route: &str, title: &str, module_code: &str, icon: &str) -> Self {
        Self {
            route: route.to_string(),
            title: title.to_string(),
            module_code: module_code.to_string(),
            icon: icon.to_string(),
        }
    }

    pub fn from_config(route: &str, config: &RouteTabConfig) -> Self {
        Self::new(route, &config.title, &config.module_code, &config.icon)
    }
}

impl From<ClosedTab> for OpenTabRequest {
    fn from(tab: ClosedTab) -> Self {
        Self {
            route: tab.route,
            title: tab.title,
            module_code: tab.module_code,
            icon: tab.icon,
        }
    }
}

/// What [`TabStore::open_tab`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpenOutcome {
    /// No tab matched; a new one was appended and activated.
    Opened(TabId),
    /// A matching tab was activated as-is.
    Focused(TabId),
    /// A matching tab took over the new route/title and was activated.
    Updated(TabId),
    /// The matching tab was already active on that route.
    Unchanged(TabId),
}

impl OpenOutcome {
    pub fn tab_id(&self) -> &str {
        match self {
            Self::Opened(id) | Self::Focused(id) | Self::Updated(id) | Self::Unchanged(id) => id,
        }
    }
}

#[derive(Debug)]
pub struct TabStore {
    tabs: Vec<WorkspaceTab>,
    active_tab_id: Option<TabId>,
    closed: ClosedTabs,
    next_tab_id: u64,
    revision: u64,
    strict_invariants: bool,
    dashboard: WorkspaceTab,
}

impl TabStore {
    /// A fresh store holds only the Dashboard tab, active.
    pub fn new(settings: &WorkspaceSettings) -> Self {
        let dashboard = WorkspaceTab {
            id: DASHBOARD_TAB_ID.to_string(),
            route: normalize_path(&settings.dashboard.path),
            title: settings.dashboard.title.clone(),
            module_code: module_root(&normalize_path(&settings.dashboard.path))
                .unwrap_or(DASHBOARD_TAB_ID)
                .to_string(),
            icon: settings.dashboard.icon.clone(),
            has_unsaved_changes: false,
            opened_at: Utc::now(),
        };

        Self {
            tabs: vec![dashboard.clone()],
            active_tab_id: Some(DASHBOARD_TAB_ID.to_string()),
            closed: ClosedTabs::new(settings.max_closed_tabs),
            next_tab_id: 1,
            revision: 0,
            strict_invariants: settings.strict_invariants,
            dashboard,
        }
    }

    pub fn tabs(&self) -> &[WorkspaceTab] {
        &self.tabs
    }

    pub fn active_tab_id(&self) -> Option<&str> {
        self.active_tab_id.as_deref()
    }

    /// `None` only transiently, while a mutation is being recovered.
    pub fn get_active_tab(&self) -> Option<&WorkspaceTab> {
        let id = self.active_tab_id.as_deref()?;
        self.get(id)
    }

    pub fn get(&self, id: &str) -> Option<&WorkspaceTab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn closed_tabs(&self) -> &ClosedTabs {
        &self.closed
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn dirty_tabs(&self) -> Vec<WorkspaceTab> {
        self.tabs
            .iter()
            .filter(|t| t.has_unsaved_changes)
            .cloned()
            .collect()
    }

    /// Finds the open tab a path belongs to.
    ///
    /// Precedence: exact route, then the longest open route that is a
    /// segment-wise prefix of `route`, then any tab sharing the module root.
    pub fn find_matching_tab(&self, route: &str) -> Option<&WorkspaceTab> {
        let route = normalize_path(route);

        if let Some(tab) = self.tabs.iter().find(|t| t.route == route) {
            return Some(tab);
        }

        let longest_prefix = self
            .tabs
            .iter()
            .filter(|t| is_segment_prefix(&t.route, &route))
            .max_by_key(|t| t.route.len());
        if longest_prefix.is_some() {
            return longest_prefix;
        }

        let root = module_root(&route)?;
        self.tabs.iter().find(|t| t.module_root() == Some(root))
    }

    /// Focuses the tab the route belongs to, or appends a new one.
    pub fn open_tab(&mut self, request: OpenTabRequest) -> OpenOutcome {
        let route = normalize_path(&request.route);

        let existing = self
            .find_matching_tab(&route)
            .map(|t| (t.id.clone(), t.route != route));

        match existing {
            Some((id, route_changed)) => {
                let was_active = self.active_tab_id.as_deref() == Some(id.as_str());

                if route_changed {
                    if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) {
                        log::debug!("[TabStore] Tab {} moves {} -> {}", id, tab.route, route);
                        tab.route = route;
                        tab.title = request.title;
                    }
                }
                if !was_active {
                    self.active_tab_id = Some(id.clone());
                }

                if route_changed {
                    self.bump();
                    OpenOutcome::Updated(id)
                } else if !was_active {
                    self.bump();
                    OpenOutcome::Focused(id)
                } else {
                    OpenOutcome::Unchanged(id)
                }
            }
            None => {
                let id = format!("tab-{}", self.next_tab_id);
                self.next_tab_id += 1;

                log::info!("[TabStore] Opened tab {} '{}' at {}", id, request.title, route);

                self.tabs.push(WorkspaceTab {
                    id: id.clone(),
                    route,
                    title: request.title,
                    module_code: request.module_code,
                    icon: request.icon,
                    has_unsaved_changes: false,
                    opened_at: Utc::now(),
                });
                self.active_tab_id = Some(id.clone());
                self.bump();
                OpenOutcome::Opened(id)
            }
        }
    }

    /// Returns true if the active tab changed. Unknown ids are a benign race
    /// with a concurrent close and are ignored.
    pub fn focus_tab(&mut self, id: &str) -> bool {
        if self.active_tab_id.as_deref() == Some(id) {
            return false;
        }
        if self.get(id).is_none() {
            log::debug!("[TabStore] focus_tab: no tab {}, ignoring", id);
            return false;
        }

        self.active_tab_id = Some(id.to_string());
        self.bump();
        log::debug!("[TabStore] Focused tab {}", id);
        true
    }

    /// Activates the Dashboard and puts it back on its own route if a
    /// sub-page had moved it. Returns true if anything changed.
    pub fn focus_dashboard(&mut self) -> bool {
        let mut changed = false;
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == DASHBOARD_TAB_ID) {
            if tab.route != self.dashboard.route {
                log::debug!("[TabStore] Dashboard returns to {}", self.dashboard.route);
                tab.route = self.dashboard.route.clone();
                tab.title = self.dashboard.title.clone();
                changed = true;
            }
        }
        if self.active_tab_id.as_deref() != Some(DASHBOARD_TAB_ID) {
            self.active_tab_id = Some(DASHBOARD_TAB_ID.to_string());
            changed = true;
        }

        if changed {
            self.bump();
        }
        changed
    }

    /// Removes a tab. The caller is trusted to have confirmed any unsaved
    /// changes already.
    ///
    /// If the closed tab was active, its left neighbour becomes active, or
    /// the Dashboard when it was leftmost. Closing the Dashboard never
    /// mutates anything; with strict invariants it is reported as an error.
    pub fn close_tab(&mut self, id: &str) -> Result<Option<WorkspaceTab>, WorkspaceError> {
        if id == DASHBOARD_TAB_ID {
            self.invariant_violation(format!("tab '{}' is pinned and cannot be closed", id))?;
            return Ok(None);
        }

        let Some(index) = self.tabs.iter().position(|t| t.id == id) else {
            log::debug!("[TabStore] close_tab: no tab {}, ignoring", id);
            return Ok(None);
        };

        let tab = self.tabs.remove(index);
        if tab.has_unsaved_changes {
            log::info!("[TabStore] Closing tab {} with unsaved changes (confirmed by caller)", id);
        } else {
            log::info!("[TabStore] Closed tab {} '{}'", id, tab.title);
        }

        if self.active_tab_id.as_deref() == Some(id) {
            let fallback = if index > 0 {
                self.tabs[index - 1].id.clone()
            } else {
                DASHBOARD_TAB_ID.to_string()
            };
            self.active_tab_id = Some(fallback);
        }

        self.closed.archive_tab(&tab);
        self.bump();
        Ok(Some(tab))
    }

    /// Returns false if the tab does not exist.
    pub fn set_unsaved_changes(&mut self, id: &str, flag: bool) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) else {
            log::debug!("[TabStore] set_unsaved_changes: no tab {}, ignoring", id);
            return false;
        };

        if tab.has_unsaved_changes != flag {
            tab.has_unsaved_changes = flag;
            self.bump();
        }
        true
    }

    /// Drag-and-drop move. Leaves the active tab and dirty flags alone.
    /// Returns true if the tab actually moved.
    pub fn move_tab_to_index(&mut self, id: &str, target_index: usize) -> bool {
        let Some(current) = self.tabs.iter().position(|t| t.id == id) else {
            return false;
        };

        let target = target_index.min(self.tabs.len().saturating_sub(1));
        if target == current {
            return false;
        }

        let tab = self.tabs.remove(current);
        self.tabs.insert(target, tab);
        self.bump();
        log::debug!("[TabStore] Moved tab {} from index {} to {}", id, current, target);
        true
    }

    /// Applies a full ordering coming from the tab strip.
    /// Returns true if the order changed, false otherwise.
    ///
    /// Algorithm:
    /// 1. Map existing tabs by ID for O(1) lookup
    /// 2. Rebuild vector based on new_order
    /// 3. Append any missing tabs in their previous relative order, so a
    ///    stale order from the UI can never drop a tab
    pub fn reorder(&mut self, new_order: &[String]) -> bool {
        if self.tabs.is_empty() || new_order.is_empty() {
            return false;
        }

        let old_order: Vec<TabId> = self.tabs.iter().map(|t| t.id.clone()).collect();

        let mut tab_map: HashMap<TabId, WorkspaceTab> =
            self.tabs.drain(..).map(|t| (t.id.clone(), t)).collect();

        let mut reordered = Vec::with_capacity(old_order.len());
        for id in new_order {
            if let Some(tab) = tab_map.remove(id) {
                reordered.push(tab);
            }
        }
        for id in &old_order {
            if let Some(tab) = tab_map.remove(id) {
                reordered.push(tab);
            }
        }

        let changed = reordered.iter().map(|t| &t.id).ne(old_order.iter());
        self.tabs = reordered;

        if changed {
            self.bump();
        }
        changed
    }

    /// Reopens the most recently closed tab through the normal
    /// open-or-focus path. The dirty flag is not restored.
    pub fn reopen_closed_tab(&mut self) -> Option<OpenOutcome> {
        let closed = self.closed.pop_closed_tab()?;
        // Popping the archive alone changes what subscribers see.
        self.bump();
        Some(self.open_tab(OpenTabRequest::from(closed)))
    }

    /// Checks the hard invariants and repairs them if broken: the Dashboard
    /// must exist and the active pointer must name a live tab.
    ///
    /// The store is always left consistent; the error only reports that a
    /// repair happened and is returned when strict invariants are on.
    pub fn verify_invariants(&mut self) -> Result<(), WorkspaceError> {
        let mut problems = Vec::new();

        if self.get(DASHBOARD_TAB_ID).is_none() {
            problems.push("dashboard tab missing".to_string());
            self.tabs.insert(0, self.dashboard.clone());
        }

        let active_is_live = self
            .active_tab_id
            .as_deref()
            .map_or(false, |id| self.get(id).is_some());
        if !active_is_live {
            problems.push(format!(
                "active tab {:?} does not exist",
                self.active_tab_id
            ));
            self.active_tab_id = Some(DASHBOARD_TAB_ID.to_string());
        }

        if problems.is_empty() {
            return Ok(());
        }

        self.bump();
        let message = problems.join("; ");
        if self.strict_invariants {
            Err(WorkspaceError::InvariantViolation(message))
        } else {
            log::warn!("[TabStore] Recovered: {}", message);
            Ok(())
        }
    }

    pub fn snapshot(&self) -> TabsSnapshot {
        TabsSnapshot {
            tabs: self.tabs.clone(),
            active_tab_id: self.active_tab_id.clone(),
            closed_tab_count: self.closed.closed_tab_count(),
            revision: self.revision,
        }
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    fn invariant_violation(&self, message: String) -> Result<(), WorkspaceError> {
        if self.strict_invariants {
            Err(WorkspaceError::InvariantViolation(message))
        } else {
            log::warn!("[TabStore] {} (ignored)", message);
            Ok(())
        }
    }
}
