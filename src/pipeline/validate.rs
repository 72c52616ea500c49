//! Advisory checks on an extracted table.
//!
//! The instruction asks the model for sixteen columns and ISO dates, but the
//! answer is never rejected for breaking that contract. This module reports
//! where it was broken so the CLI can warn; the table itself is unchanged.

use crate::pipeline::table::Table;
use crate::prompts::{COLUMNS, CONSTANT_COLUMNS, DATE_COLUMNS};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Value the model uses for a missing dynamic field.
pub const MISSING: &str = "-";

/// One contract violation, located by 0-indexed row (header = 0) and column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    /// Row has a different number of cells than expected.
    ColumnCount { row: usize, expected: usize, found: usize },
    /// Date column is neither `YYYY-MM-DD` nor `-`.
    BadDate { row: usize, column: usize, value: String },
    /// Constant column does not hold its literal.
    UnexpectedConstant {
        row: usize,
        column: usize,
        expected: String,
        found: String,
    },
}

/// Result of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub rows_checked: usize,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check every row's width, and the date and constant columns of data rows.
pub fn validate(table: &Table) -> ValidationReport {
    let expected = COLUMNS.len();
    let mut issues = Vec::new();

    for (row_idx, row) in table.rows().iter().enumerate() {
        if row.len() != expected {
            issues.push(Issue::ColumnCount {
                row: row_idx,
                expected,
                found: row.len(),
            });
        }
        if row_idx == 0 {
            continue;
        }

        for &col in &DATE_COLUMNS {
            if let Some(value) = row.get(col) {
                if value != MISSING && !RE_ISO_DATE.is_match(value) {
                    issues.push(Issue::BadDate {
                        row: row_idx,
                        column: col,
                        value: value.clone(),
                    });
                }
            }
        }

        for (col, literal) in CONSTANT_COLUMNS {
            if let Some(value) = row.get(col) {
                if value != literal {
                    issues.push(Issue::UnexpectedConstant {
                        row: row_idx,
                        column: col,
                        expected: literal.to_string(),
                        found: value.clone(),
                    });
                }
            }
        }
    }

    ValidationReport {
        rows_checked: table.len(),
        issues,
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Issue::ColumnCount { row, expected, found } => {
                write!(f, "row {row}: {found} columns, expected {expected}")
            }
            Issue::BadDate { row, column, value } => write!(
                f,
                "row {row}, column '{}': '{value}' is not YYYY-MM-DD",
                COLUMNS[*column]
            ),
            Issue::UnexpectedConstant {
                row,
                column,
                expected,
                found,
            } => write!(
                f,
                "row {row}, column '{}': expected '{expected}', found '{found}'",
                COLUMNS[*column]
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: [&str; 16]) -> String {
        format!("| {} |", cells.join(" | "))
    }

    fn good_row() -> [&'static str; 16] {
        [
            "IM250001", "年度維護", "12345678", "範例股份有限公司", "直客", "IMAG", "IMAG", "專案",
            "NA", "2025-01-15", "2025-02-01", "2025-12-31", "一期", "月結30天", "NT$100,000",
            "NT$105,000",
        ]
    }

    fn table_with(body: &[String]) -> Table {
        let header = format!("| {} |", COLUMNS.join(" | "));
        let rule = format!("|{}", "---|".repeat(16));
        Table::parse(&format!("{header}\n{rule}\n{}", body.join("\n")))
    }

    #[test]
    fn well_formed_table_is_clean() {
        let report = validate(&table_with(&[row(good_row())]));
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.rows_checked, 2);
    }

    #[test]
    fn missing_marker_is_accepted_for_dates() {
        let mut cells = good_row();
        cells[10] = "-";
        assert!(validate(&table_with(&[row(cells)])).is_clean());
    }

    #[test]
    fn slash_date_is_reported() {
        let mut cells = good_row();
        cells[11] = "2025/12/31";
        let report = validate(&table_with(&[row(cells)]));
        assert_eq!(
            report.issues,
            vec![Issue::BadDate {
                row: 1,
                column: 11,
                value: "2025/12/31".into()
            }]
        );
        assert!(report.issues[0].to_string().contains("迄"));
    }

    #[test]
    fn ragged_row_is_reported() {
        let report = validate(&table_with(&["| IM250002 | 只有兩欄 |".to_string()]));
        assert!(report.issues.contains(&Issue::ColumnCount {
            row: 1,
            expected: 16,
            found: 2
        }));
    }

    #[test]
    fn wrong_constant_is_reported() {
        let mut cells = good_row();
        cells[4] = "經銷";
        let report = validate(&table_with(&[row(cells)]));
        assert!(matches!(
            report.issues.as_slice(),
            [Issue::UnexpectedConstant { column: 4, .. }]
        ));
    }
}
