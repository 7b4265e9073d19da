// src/statement/mod.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::InputError;

pub mod schema;

pub use schema::{build_table, RaggedRowPolicy, RawStatement};

static TICKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9^][A-Z0-9.=^-]*$").expect("ticker regex should compile"));

/* ─────────────────────────── keys ─────────────────────────── */

/// Upper-cased ticker symbol, e.g. `KO` or `SAP.DE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker(String);

impl Ticker {
    /// Trim and upper-case user input, rejecting anything that could not
    /// sit in a quote URL path.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(InputError::EmptyTicker);
        }
        if !TICKER_RE.is_match(&symbol) {
            return Err(InputError::InvalidTicker(symbol));
        }
        Ok(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Statement type as it appears in the provider's URL scheme.
///
/// The set is open: any string is accepted and simply substituted into the
/// request path. Unknown categories fail upstream, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(String);

impl Category {
    pub const BALANCE_SHEET: &'static str = "balance-sheet";
    pub const CASH_FLOW: &'static str = "cash-flow";
    pub const FINANCIALS: &'static str = "financials";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn balance_sheet() -> Self {
        Self::new(Self::BALANCE_SHEET)
    }

    pub fn cash_flow() -> Self {
        Self::new(Self::CASH_FLOW)
    }

    pub fn financials() -> Self {
        Self::new(Self::FINANCIALS)
    }

    /// Categories fetched when the caller names none.
    pub fn default_set() -> Vec<Self> {
        vec![Self::balance_sheet()]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/* ─────────────────────────── tables ─────────────────────────── */

/// One scraped row: trimmed cell texts, the first usually the line-item label.
pub type StatementRow = Vec<String>;

/// A rectangular statement: every row has exactly `columns.len()` cells.
/// `None` marks a cell the page did not provide or left empty; a present
/// cell is never the empty string.
///
/// Each row remembers its position among the scraped rows, which survives
/// rows being rejected in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementTable {
    columns: Vec<String>,
    positions: Vec<usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl StatementTable {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<(usize, Vec<Option<String>>)>) -> Self {
        debug_assert!(rows.iter().all(|(_, r)| r.len() == columns.len()));
        let (positions, rows) = rows.into_iter().unzip();
        Self {
            columns,
            positions,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Scraped position of the row stored at `row`.
    pub fn position(&self, row: usize) -> Option<usize> {
        self.positions.get(row).copied()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` under the column named `column`, if both exist and the
    /// cell is present.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }
}

/// Per-category tables for one ticker, in request order.
///
/// Rows are addressed by `(category, index)` where `index` is the row's
/// scraped position inside its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedStatements {
    ticker: Ticker,
    sections: Vec<(Category, StatementTable)>,
}

/// Borrowed view of one row of a [`CombinedStatements`].
#[derive(Debug, Clone, Copy)]
pub struct CombinedRow<'a> {
    pub category: &'a Category,
    pub index: usize,
    slot: usize,
    table: &'a StatementTable,
}

impl<'a> CombinedRow<'a> {
    pub fn value(&self, column: &str) -> Option<&'a str> {
        self.table.value(self.slot, column)
    }
}

impl CombinedStatements {
    pub(crate) fn new(ticker: Ticker) -> Self {
        Self {
            ticker,
            sections: Vec::new(),
        }
    }

    /// Append a category; a category already present is left untouched.
    pub(crate) fn push(&mut self, category: Category, table: StatementTable) -> bool {
        if self.contains(&category) {
            return false;
        }
        self.sections.push((category, table));
        true
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.sections.iter().any(|(c, _)| c == category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.sections.iter().map(|(c, _)| c)
    }

    pub fn get(&self, category: &Category) -> Option<&StatementTable> {
        self.sections
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, t)| t)
    }

    /// Total number of rows across all categories.
    pub fn len(&self) -> usize {
        self.sections.iter().map(|(_, t)| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = CombinedRow<'_>> {
        self.sections.iter().flat_map(|(category, table)| {
            table
                .positions
                .iter()
                .enumerate()
                .map(move |(slot, &index)| CombinedRow {
                    category,
                    index,
                    slot,
                    table,
                })
        })
    }

    /// Project every row onto `columns`. Columns a category does not have
    /// come out as missing values.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Selection {
        let rows = self
            .iter()
            .map(|row| SelectedRow {
                category: row.category.clone(),
                index: row.index,
                values: columns
                    .iter()
                    .map(|c| {
                        row.value(c.as_ref())
                            .filter(|v| !v.is_empty())
                            .map(str::to_owned)
                    })
                    .collect(),
            })
            .collect();
        Selection {
            columns: columns.iter().map(|c| c.as_ref().to_owned()).collect(),
            rows,
        }
    }
}

/* ─────────────────────────── selection ─────────────────────────── */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRow {
    pub category: Category,
    pub index: usize,
    pub values: Vec<Option<String>>,
}

/// The narrowed table that gets printed and persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub columns: Vec<String>,
    pub rows: Vec<SelectedRow>,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.values.get(idx)?.as_deref()
    }

    /// Drop rows with no value under `column`; returns how many were dropped.
    /// An empty string is no value, as it cannot be told apart from a
    /// missing one once written to CSV.
    pub fn drop_missing(&mut self, column: &str) -> usize {
        let before = self.rows.len();
        match self.columns.iter().position(|c| c == column) {
            Some(idx) => self
                .rows
                .retain(|r| matches!(r.values.get(idx), Some(Some(v)) if !v.is_empty())),
            None => self.rows.clear(),
        }
        before - self.rows.len()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MISSING: &str = "NaN";

        let mut header = vec!["Data Type".to_owned(), "Index".to_owned()];
        header.extend(self.columns.iter().cloned());

        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                let mut line = vec![r.category.to_string(), r.index.to_string()];
                line.extend(
                    r.values
                        .iter()
                        .map(|v| v.as_deref().unwrap_or(MISSING).to_owned()),
                );
                line
            })
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for line in &body {
            for (w, cell) in widths.iter_mut().zip(line) {
                *w = (*w).max(cell.chars().count());
            }
        }

        write_padded(f, &header, &widths)?;
        for line in &body {
            write_padded(f, line, &widths)?;
        }
        write!(f, "[{} rows x {} columns]", self.rows.len(), self.columns.len())
    }
}

fn write_padded(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    for (i, (cell, &width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            f.write_str("  ")?;
        }
        write!(f, "{cell:<width$}")?;
    }
    writeln!(f)
}

/* ─────────────────────────── tests ─────────────────────────── */
