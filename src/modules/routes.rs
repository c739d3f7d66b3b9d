// Route table: ordered (pattern, tab config) pairs, first match wins.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::WorkspaceError;

/// What a path contributes to the tab it opens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTabConfig {
    pub title: String,
    pub module_code: String,
    pub icon: String,
}

/// Declarative, serializable form of one route entry (settings file).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub pattern: String,
    pub title: String,
    pub module_code: String,
    pub icon: String,
}

impl RouteSpec {
    pub fn new(pattern: &str, title: &str, module_code: &str, icon: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            title: title.to_string(),
            module_code: module_code.to_string(),
            icon: icon.to_string(),
        }
    }
}

#[derive(Debug)]
struct RouteEntry {
    pattern: Regex,
    config: RouteTabConfig,
}

#[derive(Debug)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Compiles the specs in order. A single bad pattern rejects the whole table.
    pub fn new(specs: &[RouteSpec]) -> Result<Self, WorkspaceError> {
        let entries = specs
            .iter()
            .map(|spec| {
                let pattern = Regex::new(&spec.pattern).map_err(|source| {
                    WorkspaceError::InvalidRoutePattern {
                        pattern: spec.pattern.clone(),
                        source,
                    }
                })?;
                Ok(RouteEntry {
                    pattern,
                    config: RouteTabConfig {
                        title: spec.title.clone(),
                        module_code: spec.module_code.clone(),
                        icon: spec.icon.clone(),
                    },
                })
            })
            .collect::<Result<Vec<_>, WorkspaceError>>()?;

        Ok(Self { entries })
    }

    /// Returns the config of the first entry whose pattern matches.
    ///
    /// `None` is a normal answer: the path has no tab affinity (login,
    /// password reset and the like).
    pub fn find_route_tab_config(&self, pathname: &str) -> Option<&RouteTabConfig> {
        self.entries
            .iter()
            .find(|entry| entry.pattern.is_match(pathname))
            .map(|entry| &entry.config)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The portal's built-in modules. Specific sub-routes must precede their
/// module's catch-all.
pub fn default_route_specs() -> Vec<RouteSpec> {
    vec![
        RouteSpec::new(r"^/dashboard(/.*)?$", "Dashboard", "dashboard", "dashboard"),
        RouteSpec::new(r"^/employees/new$", "New Employee", "employees", "user-plus"),
        RouteSpec::new(r"^/employees(/.*)?$", "Employees", "employees", "users"),
        RouteSpec::new(r"^/payroll(/.*)?$", "Payroll", "payroll", "wallet"),
        RouteSpec::new(r"^/leave(/.*)?$", "Leave", "leave", "calendar"),
        RouteSpec::new(r"^/attendance(/.*)?$", "Attendance", "attendance", "clock"),
        RouteSpec::new(r"^/appraisals(/.*)?$", "Appraisals", "appraisals", "star"),
        RouteSpec::new(r"^/recruitment(/.*)?$", "Recruitment", "recruitment", "briefcase"),
        RouteSpec::new(r"^/reports(/.*)?$", "Reports", "reports", "bar-chart"),
        RouteSpec::new(r"^/settings(/.*)?$", "Settings", "settings", "settings"),
    ]
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(&default_route_specs()).unwrap_or_else(|e| {
            log::error!("[Routes] Built-in route table rejected: {}", e);
            Self { entries: Vec::new() }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/payroll", Some("payroll"))]
    #[case("/payroll/runs", Some("payroll"))]
    #[case("/employees/42/edit", Some("employees"))]
    #[case("/leave", Some("leave"))]
    #[case("/login", None)]
    #[case("/payrolls", None)]
    #[case("/", None)]
    fn test_default_table_lookup(#[case] path: &str, #[case] module: Option<&str>) {
        let table = RouteTable::default();
        assert_eq!(
            table.find_route_tab_config(path).map(|c| c.module_code.as_str()),
            module
        );
    }

    #[test]
    fn test_first_match_wins() {
        let table = RouteTable::default();
        let config = table.find_route_tab_config("/employees/new").unwrap();
        assert_eq!(config.title, "New Employee");

        let config = table.find_route_tab_config("/employees/7").unwrap();
        assert_eq!(config.title, "Employees");
    }

    #[test]
    fn test_generic_entry_first_hides_specific() {
        let table = RouteTable::new(&[
            RouteSpec::new(r"^/employees(/.*)?$", "Employees", "employees", "users"),
            RouteSpec::new(r"^/employees/new$", "New Employee", "employees", "user-plus"),
        ])
        .unwrap();
        assert_eq!(
            table.find_route_tab_config("/employees/new").unwrap().title,
            "Employees"
        );
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = RouteTable::new(&[RouteSpec::new(r"^/payroll(", "Payroll", "payroll", "wallet")])
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidRoutePattern { .. }));
    }

    #[test]
    fn test_default_table_compiles_every_entry() {
        assert_eq!(RouteTable::default().len(), default_route_specs().len());
        assert!(RouteTable::new(&default_route_specs()).is_ok());
    }
}
