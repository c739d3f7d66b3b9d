// Shared state structs to avoid circular dependencies.
// The data model lives here together with the cloneable handle every
// component (synchronizer, guard, command layer) holds on to.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::WorkspaceError;
use crate::modules::navigation;
use crate::modules::routes::{RouteSpec, RouteTable};
use crate::modules::tabs::TabStore;
use crate::settings::WorkspaceSettings;

pub type TabId = String;

/// Reserved id of the pinned Dashboard tab.
pub const DASHBOARD_TAB_ID: &str = "dashboard";

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceTab {
    pub id: TabId,
    pub route: String,
    pub title: String,
    pub module_code: String,
    pub icon: String,
    pub has_unsaved_changes: bool,
    pub opened_at: DateTime<Utc>,
}

impl WorkspaceTab {
    pub fn is_dashboard(&self) -> bool {
        self.id == DASHBOARD_TAB_ID
    }

    pub fn module_root(&self) -> Option<&str> {
        navigation::module_root(&self.route)
    }
}

/// What survives of a tab after it is closed. Dirty state is not kept.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTab {
    pub route: String,
    pub title: String,
    pub module_code: String,
    pub icon: String,
    pub closed_at: DateTime<Utc>,
}

impl From<&WorkspaceTab> for ClosedTab {
    fn from(tab: &WorkspaceTab) -> Self {
        Self {
            route: tab.route.clone(),
            title: tab.title.clone(),
            module_code: tab.module_code.clone(),
            icon: tab.icon.clone(),
            closed_at: Utc::now(),
        }
    }
}

/// Payload handed to subscribers (and emitted as `update-tabs`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabsSnapshot {
    pub tabs: Vec<WorkspaceTab>,
    pub active_tab_id: Option<TabId>,
    pub closed_tab_count: usize,
    pub revision: u64,
}

/// Handle to one authenticated session's workspace.
///
/// Cloning is cheap and every clone refers to the same store. The store is
/// only ever mutated through [`WorkspaceState::update`], which re-checks the
/// invariants and publishes a fresh snapshot when something changed.
#[derive(Clone)]
pub struct WorkspaceState {
    pub settings: Arc<RwLock<WorkspaceSettings>>,
    routes: Arc<ArcSwap<RouteTable>>,
    store: Arc<Mutex<TabStore>>,
    snapshots: Arc<watch::Sender<TabsSnapshot>>,
    pub(crate) unload_hook_installed: Arc<AtomicBool>,
}

impl WorkspaceState {
    pub fn new(settings: WorkspaceSettings) -> Result<Self, WorkspaceError> {
        let routes = RouteTable::new(&settings.routes)?;
        let store = TabStore::new(&settings);
        let (snapshots, _) = watch::channel(store.snapshot());

        log::info!(
            "[Workspace] Session started with {} routes, dashboard at {}",
            routes.len(),
            settings.dashboard.path
        );

        Ok(Self {
            settings: Arc::new(RwLock::new(settings)),
            routes: Arc::new(ArcSwap::from_pointee(routes)),
            store: Arc::new(Mutex::new(store)),
            snapshots: Arc::new(snapshots),
            unload_hook_installed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn routes(&self) -> Arc<RouteTable> {
        self.routes.load_full()
    }

    /// Swaps in a new route table. The current one stays in place if any
    /// pattern fails to compile.
    pub fn replace_routes(&self, specs: &[RouteSpec]) -> Result<(), WorkspaceError> {
        let table = RouteTable::new(specs)?;
        log::info!("[Workspace] Route table replaced ({} routes)", table.len());
        self.routes.store(Arc::new(table));
        self.settings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .routes = specs.to_vec();
        Ok(())
    }

    /// Normalized the same way as the Dashboard tab's route.
    pub fn dashboard_path(&self) -> String {
        let settings = self.settings.read().unwrap_or_else(PoisonError::into_inner);
        navigation::normalize_path(&settings.dashboard.path)
    }

    pub fn prompt_on_unload(&self) -> bool {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .prompt_on_unload
    }

    pub fn read<T>(&self, f: impl FnOnce(&TabStore) -> T) -> T {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&*store)
    }

    /// Runs a mutation against the store, then recovers from any broken
    /// invariant and notifies subscribers if the revision moved.
    pub fn update<T>(&self, f: impl FnOnce(&mut TabStore) -> T) -> T {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let before = store.revision();
        let result = f(&mut *store);

        if let Err(e) = store.verify_invariants() {
            log::error!("[Workspace] Recovered from {}", e);
        }

        if store.revision() != before {
            self.snapshots.send_replace(store.snapshot());
        }
        result
    }

    pub fn snapshot(&self) -> TabsSnapshot {
        self.read(|store| store.snapshot())
    }

    pub fn subscribe(&self) -> watch::Receiver<TabsSnapshot> {
        self.snapshots.subscribe()
    }
}
