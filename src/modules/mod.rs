// Module exports for pure logic (no Tauri imports)
pub mod navigation;
pub mod routes;              // Route table
pub mod tabs;                // Tab store: open/focus/close/reorder/dirty flags
pub mod closed_tabs;         // Recently-closed archive
pub mod sync;                // Router <-> tab synchronizer
pub mod guard;               // Unsaved-changes guard + beforeunload hook
pub mod dialogs;             // Confirmation dialogs
pub mod actions;             // Confirmation-gated close/logout flows
