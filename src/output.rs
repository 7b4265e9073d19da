// src/output.rs

use csv::{ReaderBuilder, Writer};
use std::{fs, path::Path};
use tracing::info;

use crate::error::OutputError;
use crate::statement::{Category, SelectedRow, Selection};

/// Names of the two index columns leading every record.
pub const INDEX_COLUMNS: [&str; 2] = ["Data Type", "Index"];

/// Write `selection` as CSV: index columns first, then the selected columns.
/// Missing values become empty fields, so a selection holding no empty
/// strings reads back unchanged. Returns the number of rows written.
pub fn write_csv(path: &Path, selection: &Selection) -> Result<usize, OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| OutputError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(
        INDEX_COLUMNS
            .iter()
            .copied()
            .chain(selection.columns.iter().map(String::as_str)),
    )?;
    for row in &selection.rows {
        let index = row.index.to_string();
        wtr.write_record(
            [row.category.as_str(), index.as_str()]
                .into_iter()
                .chain(row.values.iter().map(|v| v.as_deref().unwrap_or(""))),
        )?;
    }
    wtr.flush().map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), rows = selection.len(), "wrote CSV");
    Ok(selection.len())
}

/// Read back a file produced by [`write_csv`]. Empty fields become missing
/// values.
pub fn read_csv(path: &Path) -> Result<Selection, OutputError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let headers = rdr.headers()?.clone();
    if headers.len() < INDEX_COLUMNS.len()
        || headers.iter().take(INDEX_COLUMNS.len()).ne(INDEX_COLUMNS)
    {
        return Err(OutputError::Malformed {
            line: 1,
            reason: format!("expected leading columns {INDEX_COLUMNS:?}"),
        });
    }
    let columns: Vec<String> = headers.iter().skip(2).map(str::to_owned).collect();

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = i + 2;
        let index = record
            .get(1)
            .unwrap_or_default()
            .parse()
            .map_err(|_| OutputError::Malformed {
                line,
                reason: "index is not a row number".into(),
            })?;
        rows.push(SelectedRow {
            category: Category::new(record.get(0).unwrap_or_default()),
            index,
            values: record
                .iter()
                .skip(2)
                .map(|v| (!v.is_empty()).then(|| v.to_owned()))
                .collect(),
        });
    }

    Ok(Selection { columns, rows })
}
