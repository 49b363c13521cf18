//! Employee directory
//!
//! A built-in demo table, optionally replaced by a roster text file of
//! alternating name and code lines.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use super::{AuthError, EmployeeCode};

static ROSTER_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{3,20}$").expect("valid roster code regex"));

/// Lines containing any of these are separators or file headers
const ROSTER_SKIP_MARKERS: &[&str] = &["===", "---", "СПИСОК", "Обновлено", "Updated:"];

const ROSTER_POSITION: &str = "Employee";
const ROSTER_DEPARTMENT: &str = "Logistics";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Employee {
    pub(crate) code: EmployeeCode,
    pub(crate) full_name: String,
    pub(crate) position: String,
    pub(crate) department: String,
}

impl Employee {
    fn new(code: &str, full_name: &str, position: &str, department: &str) -> Option<Self> {
        Some(Employee {
            code: EmployeeCode::from_token(code)?,
            full_name: full_name.to_string(),
            position: position.to_string(),
            department: department.to_string(),
        })
    }

    /// Rosters list surname first
    pub(crate) fn last_name(&self) -> &str {
        self.full_name.split(' ').next().unwrap_or(&self.full_name)
    }

    pub(crate) fn first_name(&self) -> &str {
        self.full_name.split(' ').nth(1).unwrap_or(&self.full_name)
    }
}

/// Result of reading a roster file
#[derive(Debug, Default)]
pub(crate) struct RosterParse {
    pub(crate) employees: Vec<Employee>,
    /// Code lines that are not valid employee codes
    pub(crate) skipped: Vec<String>,
}

/// Parse roster text: a name line followed by its code line.
pub(crate) fn parse_roster(text: &str) -> RosterParse {
    let mut result = RosterParse::default();
    let mut pending_name: Option<&str> = None;

    for line in text.lines().map(str::trim) {
        if line.is_empty() || ROSTER_SKIP_MARKERS.iter().any(|m| line.contains(m)) {
            continue;
        }

        if !ROSTER_CODE_RE.is_match(line) {
            pending_name = Some(line);
            continue;
        }

        let Some(name) = pending_name.take() else {
            debug!(line, "roster code without a name line");
            continue;
        };
        match Employee::new(line, name, ROSTER_POSITION, ROSTER_DEPARTMENT) {
            Some(employee) => result.employees.push(employee),
            None => {
                warn!(code = line, name, "roster code is not an EMP### code, skipped");
                result.skipped.push(line.to_string());
            }
        }
    }

    result
}

#[derive(Debug, Clone)]
pub(crate) struct Directory {
    employees: BTreeMap<EmployeeCode, Employee>,
    /// Roster codes that could not be used
    skipped: Vec<String>,
}

impl Directory {
    pub(crate) fn demo() -> Self {
        let employees = [
            ("EMP001", "Ivanov Aleksei", "Senior storekeeper", "Warehouse 1"),
            ("EMP002", "Petrova Maria", "Forklift operator", "Warehouse 2"),
            ("EMP003", "Sidorov Dmitry", "Loader", "Dispatch"),
        ]
        .into_iter()
        .filter_map(|(code, name, position, department)| {
            Employee::new(code, name, position, department)
        });
        Self::from_employees(employees)
    }

    fn from_employees(employees: impl IntoIterator<Item = Employee>) -> Self {
        Directory {
            employees: employees
                .into_iter()
                .map(|e| (e.code.clone(), e))
                .collect(),
            skipped: Vec::new(),
        }
    }

    /// Roster contents replace the demo table; an empty roster falls back to it
    pub(crate) fn from_roster(text: &str) -> Self {
        let RosterParse { employees, skipped } = parse_roster(text);
        let mut directory = if employees.is_empty() {
            warn!("roster has no usable entries, using demo directory");
            Self::demo()
        } else {
            debug!(count = employees.len(), "roster loaded");
            Self::from_employees(employees)
        };
        directory.skipped = skipped;
        directory
    }

    pub(crate) fn load(path: &Path) -> Result<Self, AuthError> {
        let text = std::fs::read_to_string(path).map_err(|source| AuthError::Roster {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_roster(&text))
    }

    pub(crate) fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub(crate) fn lookup(&self, code: &EmployeeCode) -> Option<&Employee> {
        self.employees.get(code)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Employee> {
        self.employees.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.employees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = "============================================================
СПИСОК КОДОВ ДОСТУПА СОТРУДНИКОВ
Обновлено: 15.01.2026 09:54:24
============================================================

Leontiev Dmitry
EMP010
------------------------------
Orlova Anna
EMP011
------------------------------
Smirnov Pavel
K9CM4CRF
------------------------------
";

    #[test]
    fn demo_has_three_employees() {
        let dir = Directory::demo();
        assert_eq!(dir.len(), 3);
        let code = EmployeeCode::parse("EMP002").unwrap();
        assert_eq!(dir.lookup(&code).unwrap().full_name, "Petrova Maria");
    }

    #[test]
    fn roster_binds_names_to_following_codes() {
        let parsed = parse_roster(ROSTER);
        let names: Vec<_> = parsed.employees.iter().map(|e| e.full_name.as_str()).collect();
        assert_eq!(names, ["Leontiev Dmitry", "Orlova Anna"]);
        assert_eq!(parsed.employees[0].code.as_str(), "EMP010");
        assert_eq!(parsed.employees[1].department, "Logistics");
        assert_eq!(parsed.skipped, ["K9CM4CRF"]);
    }

    #[test]
    fn roster_code_without_name_is_ignored() {
        let parsed = parse_roster("EMP001\nEMP002\n");
        assert!(parsed.employees.is_empty());
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn later_name_line_replaces_pending_one() {
        let parsed = parse_roster("First Person\nSecond Person\nEMP005\n");
        assert_eq!(parsed.employees.len(), 1);
        assert_eq!(parsed.employees[0].full_name, "Second Person");
    }

    #[test]
    fn roster_replaces_demo_table() {
        let dir = Directory::from_roster(ROSTER);
        assert_eq!(dir.len(), 2);
        assert!(dir.lookup(&EmployeeCode::parse("EMP001").unwrap()).is_none());
        assert_eq!(dir.skipped(), ["K9CM4CRF"]);
        assert!(Directory::demo().skipped().is_empty());
    }

    #[test]
    fn unusable_roster_keeps_skipped_codes() {
        let dir = Directory::from_roster("Smirnov Pavel\nK9CM4CRF\n");
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.skipped(), ["K9CM4CRF"]);
    }

    #[test]
    fn empty_roster_falls_back_to_demo() {
        let dir = Directory::from_roster("=====\n\n");
        assert_eq!(dir.len(), 3);
    }

    #[test]
    fn name_parts() {
        let dir = Directory::demo();
        let e = dir.lookup(&EmployeeCode::parse("EMP003").unwrap()).unwrap();
        assert_eq!(e.last_name(), "Sidorov");
        assert_eq!(e.first_name(), "Dmitry");
    }

    #[test]
    fn load_missing_file_is_roster_error() {
        let err = Directory::load(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, AuthError::Roster { .. }));
    }
}
