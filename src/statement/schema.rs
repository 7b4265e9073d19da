// src/statement/schema.rs
//
// Turns the loosely shaped rows scraped from a page into a rectangular
// `StatementTable`.
//
// ── Rules ──
//  • Labels are `[label_column] ++ header`. Cells are positional, so the
//    first row's cell count decides the width.
//  • Surplus labels are dropped; missing labels become `Column N`.
//  • Rows of a different width follow `RaggedRowPolicy`.
//  • Empty cells are stored as missing; rows keep their scraped position.

use serde::Deserialize;
use tracing::{debug, warn};

use super::{StatementRow, StatementTable};
use crate::error::ParseError;

/// What a page yielded before any shaping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawStatement {
    /// Header labels in page order, `None` when the page had no header row.
    pub header: Option<Vec<String>>,
    /// Non-empty rows in page order.
    pub rows: Vec<StatementRow>,
}

/// How to treat a row whose cell count differs from the table width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaggedRowPolicy {
    /// Pad short rows with missing cells, cut long rows to the width.
    #[default]
    Fit,
    /// Drop the row.
    Reject,
}

/// Column labels for a table `width` cells wide.
pub fn infer_columns(label_column: &str, header: Option<&[String]>, width: usize) -> Vec<String> {
    let mut labels = Vec::with_capacity(width.max(1));
    labels.push(label_column.to_owned());
    labels.extend(header.unwrap_or_default().iter().cloned());

    if labels.len() > width {
        debug!(
            dropped = ?&labels[width..],
            width,
            "header has more labels than the first row has cells"
        );
        labels.truncate(width);
    }
    for position in labels.len()..width {
        labels.push(format!("Column {}", position + 1));
    }
    labels
}

/// Shape `raw` into a table, or report that it has no data rows.
pub fn build_table(
    raw: RawStatement,
    label_column: &str,
    policy: RaggedRowPolicy,
) -> Result<StatementTable, ParseError> {
    let width = match raw.rows.first() {
        Some(first) => first.len(),
        None => return Err(ParseError::NoRows),
    };
    let columns = infer_columns(label_column, raw.header.as_deref(), width);

    let mut rows = Vec::with_capacity(raw.rows.len());
    for (position, row) in raw.rows.into_iter().enumerate() {
        let len = row.len();
        if len != width {
            match policy {
                RaggedRowPolicy::Reject => {
                    warn!(position, cells = len, width, "rejecting ragged row");
                    continue;
                }
                RaggedRowPolicy::Fit => {
                    debug!(position, cells = len, width, "fitting ragged row");
                }
            }
        }
        let mut cells: Vec<Option<String>> = row
            .into_iter()
            .take(width)
            .map(|c| (!c.is_empty()).then_some(c))
            .collect();
        cells.resize(width, None);
        rows.push((position, cells));
    }

    Ok(StatementTable::new(columns, rows))
}
