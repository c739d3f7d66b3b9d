// Confirmation dialogs for destructive workspace actions.
// Each dialog is a closed -> open -> closed state machine whose `open` hands
// back a future the caller awaits; none of them touch the tab store.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::WorkspaceError;
use crate::state::{TabId, WorkspaceTab};

/// A decision type with a well-defined "nothing happened" value, used when
/// a dialog is dropped or replaced before the user answers.
pub trait DialogDecision: Send + 'static {
    fn dismissed() -> Self;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CloseDecision {
    Close,
    Keep,
}

impl DialogDecision for CloseDecision {
    fn dismissed() -> Self {
        Self::Keep
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnsavedChangesChoice {
    Cancel,
    Discard,
    SaveAndClose,
}

impl UnsavedChangesChoice {
    fn label(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::Discard => "discard",
            Self::SaveAndClose => "save and close",
        }
    }
}

impl DialogDecision for UnsavedChangesChoice {
    fn dismissed() -> Self {
        Self::Cancel
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LogoutDecision {
    Proceed,
    Abort,
}

impl DialogDecision for LogoutDecision {
    fn dismissed() -> Self {
        Self::Abort
    }
}

/// The user's eventual answer to an open dialog.
#[derive(Debug)]
pub struct PendingDecision<D> {
    rx: oneshot::Receiver<D>,
}

impl<D: DialogDecision> PendingDecision<D> {
    /// Non-blocking check for UIs that poll instead of awaiting.
    pub fn try_resolve(&mut self) -> Option<D> {
        match self.rx.try_recv() {
            Ok(decision) => Some(decision),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(D::dismissed()),
        }
    }
}

impl<D: DialogDecision> Future for PendingDecision<D> {
    type Output = D;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<D> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| D::dismissed()))
    }
}

/// Shared `closed | open(subject)` state plus the responder for the
/// decision in flight.
#[derive(Debug)]
struct DialogSlot<S, D> {
    subject: Option<S>,
    responder: Option<oneshot::Sender<D>>,
}

impl<S, D: DialogDecision> DialogSlot<S, D> {
    fn new() -> Self {
        Self {
            subject: None,
            responder: None,
        }
    }

    fn open(&mut self, subject: S) -> PendingDecision<D> {
        // A still-open dialog being replaced counts as dismissed.
        self.resolve(D::dismissed());

        let (tx, rx) = oneshot::channel();
        self.subject = Some(subject);
        self.responder = Some(tx);
        PendingDecision { rx }
    }

    /// Closes the dialog with `decision`. Returns false if it was not open.
    fn resolve(&mut self, decision: D) -> bool {
        self.subject = None;
        match self.responder.take() {
            Some(tx) => {
                // The awaiting caller may have given up; that is fine.
                let _ = tx.send(decision);
                true
            }
            None => false,
        }
    }

    fn is_open(&self) -> bool {
        self.subject.is_some()
    }
}

/// Display data for a tab shown inside a dialog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogTab {
    pub id: TabId,
    pub title: String,
    pub route: String,
}

impl From<&WorkspaceTab> for DialogTab {
    fn from(tab: &WorkspaceTab) -> Self {
        Self {
            id: tab.id.clone(),
            title: tab.title.clone(),
            route: tab.route.clone(),
        }
    }
}

/// "Close this tab? Unsaved changes will be lost."
#[derive(Debug)]
pub struct TabCloseConfirmDialog {
    slot: DialogSlot<DialogTab, CloseDecision>,
}

impl Default for TabCloseConfirmDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl TabCloseConfirmDialog {
    pub fn new() -> Self {
        Self {
            slot: DialogSlot::new(),
        }
    }

    pub fn open(&mut self, tab: &WorkspaceTab) -> PendingDecision<CloseDecision> {
        self.slot.open(DialogTab::from(tab))
    }

    pub fn is_open(&self) -> bool {
        self.slot.is_open()
    }

    pub fn candidate(&self) -> Option<&DialogTab> {
        self.slot.subject.as_ref()
    }

    pub fn confirm(&mut self) -> bool {
        self.slot.resolve(CloseDecision::Close)
    }

    pub fn cancel(&mut self) -> bool {
        self.slot.resolve(CloseDecision::Keep)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsavedChangesPrompt {
    pub tab: DialogTab,
    pub can_save: bool,
}

/// Three-way prompt: cancel, discard, or save and close. The save option
/// only exists when the caller supplied a save handler.
#[derive(Debug)]
pub struct UnsavedChangesDialog {
    slot: DialogSlot<UnsavedChangesPrompt, UnsavedChangesChoice>,
}

impl Default for UnsavedChangesDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl UnsavedChangesDialog {
    pub fn new() -> Self {
        Self {
            slot: DialogSlot::new(),
        }
    }

    pub fn open(
        &mut self,
        tab: &WorkspaceTab,
        can_save: bool,
    ) -> PendingDecision<UnsavedChangesChoice> {
        self.slot.open(UnsavedChangesPrompt {
            tab: DialogTab::from(tab),
            can_save,
        })
    }

    pub fn is_open(&self) -> bool {
        self.slot.is_open()
    }

    pub fn prompt(&self) -> Option<&UnsavedChangesPrompt> {
        self.slot.subject.as_ref()
    }

    /// Choices to render, in display order.
    pub fn offered_choices(&self) -> Vec<UnsavedChangesChoice> {
        match &self.slot.subject {
            None => Vec::new(),
            Some(prompt) if prompt.can_save => vec![
                UnsavedChangesChoice::Cancel,
                UnsavedChangesChoice::Discard,
                UnsavedChangesChoice::SaveAndClose,
            ],
            Some(_) => vec![UnsavedChangesChoice::Cancel, UnsavedChangesChoice::Discard],
        }
    }

    /// Resolves the dialog. Picking a choice that was not offered leaves it
    /// open. Returns `Ok(false)` if the dialog was not open.
    pub fn choose(&mut self, choice: UnsavedChangesChoice) -> Result<bool, WorkspaceError> {
        if self.is_open() && !self.offered_choices().contains(&choice) {
            return Err(WorkspaceError::ChoiceNotOffered(choice.label()));
        }
        Ok(self.slot.resolve(choice))
    }

    pub fn cancel(&mut self) -> bool {
        self.slot.resolve(UnsavedChangesChoice::Cancel)
    }
}

/// Logout with dirty tabs: lists every one of them, since logout ends the
/// whole session and not just the active tab.
#[derive(Debug)]
pub struct LogoutWarningDialog {
    slot: DialogSlot<Vec<DialogTab>, LogoutDecision>,
}

impl Default for LogoutWarningDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl LogoutWarningDialog {
    pub fn new() -> Self {
        Self {
            slot: DialogSlot::new(),
        }
    }

    pub fn open(&mut self, dirty_tabs: &[WorkspaceTab]) -> PendingDecision<LogoutDecision> {
        self.slot.open(dirty_tabs.iter().map(DialogTab::from).collect())
    }

    pub fn is_open(&self) -> bool {
        self.slot.is_open()
    }

    pub fn dirty_tabs(&self) -> &[DialogTab] {
        self.slot.subject.as_deref().unwrap_or(&[])
    }

    pub fn confirm(&mut self) -> bool {
        self.slot.resolve(LogoutDecision::Proceed)
    }

    pub fn cancel(&mut self) -> bool {
        self.slot.resolve(LogoutDecision::Abort)
    }
}
