// Portal Workspace Library Entry Point
// Tab manager for the HR portal: lets a user keep several pages open at
// once, tracks which of them hold unsaved edits, keeps that in step with
// the router, and gates tab close / logout behind confirmation.

pub mod error;
pub mod settings;

// Shared state
pub mod state;

// Pure logic modules (no Tauri imports)
pub mod modules;

// Tauri command layer
#[cfg(feature = "tauri-plugin")]
pub mod commands;

pub use error::WorkspaceError;
pub use modules::actions::{CloseOutcome, CloseRequest, SaveFuture, SaveHandler};
pub use modules::dialogs::{
    CloseDecision, LogoutDecision, LogoutWarningDialog, PendingDecision, TabCloseConfirmDialog,
    UnsavedChangesChoice, UnsavedChangesDialog,
};
pub use modules::guard::{BeforeUnloadHook, UnloadDecision, UnsavedChangesGuard};
pub use modules::routes::{RouteSpec, RouteTable, RouteTabConfig};
pub use modules::sync::{Navigator, RouteSynchronizer, SyncOutcome};
pub use modules::tabs::{OpenOutcome, OpenTabRequest, TabStore};
pub use settings::WorkspaceSettings;
pub use state::{TabsSnapshot, WorkspaceState, WorkspaceTab, DASHBOARD_TAB_ID};

#[cfg(feature = "tauri-plugin")]
pub use commands::init;
