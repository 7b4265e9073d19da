// src/lib.rs

//! Scrape a ticker's financial statements (balance sheet, cash flow, income
//! statement) from a finance site's quote pages, combine them into one table
//! keyed by `(category, row)`, and persist the selected columns as CSV.
//!
//! The pipeline is strictly sequential: for each category, fetch the page,
//! parse the statement container, shape it into a table. Categories that
//! fail are logged and left out; only a run where every category fails is
//! an error.

pub mod config;
pub mod error;
pub mod fetch;
pub mod fetcher;
pub mod output;
pub mod parse;
pub mod statement;

pub use config::Config;
pub use fetcher::{assemble, StatementFetcher};
pub use statement::{Category, CombinedStatements, Selection, StatementTable, Ticker};
