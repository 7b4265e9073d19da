// src/parse/mod.rs

//! Site-specific HTML adapter: everything that knows which class names the
//! provider uses lives here, behind [`StatementPageParser::parse`].

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use crate::config::PageLayout;
use crate::error::{ConfigError, ParseError};
use crate::statement::{RawStatement, StatementRow};

/// Compiled selectors for one page layout.
#[derive(Debug, Clone)]
pub struct StatementPageParser {
    container: Selector,
    row: Selector,
    cell: Selector,
    header: Selector,
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::Selector {
        field,
        selector: selector.to_owned(),
        reason: format!("{e:?}"),
    })
}

fn cell_texts(parent: ElementRef<'_>, cell: &Selector) -> StatementRow {
    parent
        .select(cell)
        .map(|c| c.text().collect::<String>().trim().to_owned())
        .collect()
}

impl StatementPageParser {
    pub fn new(layout: &PageLayout) -> Result<Self, ConfigError> {
        Ok(Self {
            container: compile("layout.container", &layout.container)?,
            row: compile("layout.row", &layout.row)?,
            cell: compile("layout.cell", &layout.cell)?,
            header: compile("layout.header", &layout.header)?,
        })
    }

    /// Extract header labels and rows from the first statement container.
    ///
    /// Rows without cells are skipped. A page with no container, or with a
    /// container whose rows are all empty, is a [`ParseError`].
    pub fn parse(&self, html: &str) -> Result<RawStatement, ParseError> {
        let doc = Html::parse_document(html);
        let container = doc
            .select(&self.container)
            .next()
            .ok_or(ParseError::MissingContainer)?;

        let mut rows = Vec::new();
        for (position, row) in container.select(&self.row).enumerate() {
            let cells = cell_texts(row, &self.cell);
            if cells.is_empty() {
                trace!(position, "skipping row without cells");
                continue;
            }
            rows.push(cells);
        }
        if rows.is_empty() {
            return Err(ParseError::NoRows);
        }

        let header = container
            .select(&self.header)
            .next()
            .map(|h| cell_texts(h, &self.cell));
        debug!(
            rows = rows.len(),
            header = header.as_ref().map_or(0, Vec::len),
            "parsed statement container"
        );

        Ok(RawStatement { header, rows })
    }
}
