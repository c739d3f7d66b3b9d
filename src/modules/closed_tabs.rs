use std::collections::VecDeque;

use crate::state::{ClosedTab, WorkspaceTab};

/// Bounded archive of recently closed tabs.
#[derive(Debug, Clone)]
pub struct ClosedTabs {
    entries: VecDeque<ClosedTab>,
    capacity: usize,
}

impl ClosedTabs {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Archives a tab to the closed tabs stack
    pub fn archive_tab(&mut self, tab: &WorkspaceTab) {
        if self.capacity == 0 {
            return;
        }

        self.entries.push_back(ClosedTab::from(tab));

        // Oldest entries fall off first (FIFO)
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        log::debug!("[ClosedTabs] Archived tab '{}' at route: {}", tab.title, tab.route);
    }

    /// Retrieves last closed tab (LIFO)
    pub fn pop_closed_tab(&mut self) -> Option<ClosedTab> {
        let tab = self.entries.pop_back();

        if let Some(ref t) = tab {
            log::debug!("[ClosedTabs] Restored tab '{}' at route: {}", t.title, t.route);
        }

        tab
    }

    /// Gets count of closed tabs (for UI)
    pub fn closed_tab_count(&self) -> usize {
        self.entries.len()
    }

    /// Most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &ClosedTab> {
        self.entries.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tab(n: usize) -> WorkspaceTab {
        WorkspaceTab {
            id: format!("tab-{}", n),
            route: format!("/module{}", n),
            title: format!("Module {}", n),
            module_code: format!("module{}", n),
            icon: "box".to_string(),
            has_unsaved_changes: n % 2 == 0,
            opened_at: Utc::now(),
        }
    }

    #[test]
    fn test_archive_restore_cycle() {
        let mut closed = ClosedTabs::new(25);
        closed.archive_tab(&tab(1));
        closed.archive_tab(&tab(2));

        assert_eq!(closed.closed_tab_count(), 2);
        assert_eq!(closed.pop_closed_tab().unwrap().route, "/module2");
        assert_eq!(closed.pop_closed_tab().unwrap().route, "/module1");
        assert!(closed.pop_closed_tab().is_none());
    }

    #[test]
    fn test_max_size_drops_oldest() {
        let mut closed = ClosedTabs::new(3);
        for n in 1..=5 {
            closed.archive_tab(&tab(n));
        }

        assert_eq!(closed.closed_tab_count(), 3);
        let routes: Vec<&str> = closed.iter().map(|t| t.route.as_str()).collect();
        assert_eq!(routes, vec!["/module5", "/module4", "/module3"]);
    }

    #[test]
    fn test_zero_capacity_disables_archive() {
        let mut closed = ClosedTabs::new(0);
        closed.archive_tab(&tab(1));
        assert_eq!(closed.closed_tab_count(), 0);
    }
}
