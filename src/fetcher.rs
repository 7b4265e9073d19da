// src/fetcher.rs

use tracing::{info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::error::{AssemblyError, CategoryError, ConfigError, TransportError};
use crate::fetch::{urls::statement_url, HttpSource, PageSource};
use crate::parse::StatementPageParser;
use crate::statement::{
    build_table, Category, CombinedStatements, RaggedRowPolicy, StatementTable, Ticker,
};

/// One category's fate: its table, or why it is absent.
pub type CategoryOutcome = (Category, Result<StatementTable, CategoryError>);

/// Fetch → parse → shape, one category at a time.
#[derive(Debug)]
pub struct StatementFetcher<S: PageSource = HttpSource> {
    source: S,
    base: Url,
    path_template: String,
    parser: StatementPageParser,
    label_column: String,
    ragged_rows: RaggedRowPolicy,
}

impl StatementFetcher<HttpSource> {
    /// Fetcher over HTTP, configured from `config.http`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let source = HttpSource::new(&config.http)?;
        Ok(Self::new(source, config)?)
    }
}

impl<S: PageSource> StatementFetcher<S> {
    pub fn new(source: S, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            source,
            base: config.base_url()?,
            path_template: config.http.path_template.clone(),
            parser: StatementPageParser::new(&config.layout)?,
            label_column: config.layout.label_column.clone(),
            ragged_rows: config.ragged_rows,
        })
    }

    /// Fetch and parse a single category's statement page.
    ///
    /// Every failure is returned as a [`CategoryError`] for the caller to
    /// skip; nothing here aborts the run.
    #[instrument(level = "info", skip_all, fields(ticker = %ticker, category = %category))]
    pub fn fetch_category(
        &self,
        ticker: &Ticker,
        category: &Category,
    ) -> Result<StatementTable, CategoryError> {
        let transport = |source: TransportError| CategoryError::Transport {
            category: category.clone(),
            source,
        };

        let url = statement_url(&self.base, &self.path_template, ticker, category)
            .map_err(transport)?;
        let page = self.source.get(&url).map_err(transport)?;
        if !page.is_ok() {
            return Err(transport(TransportError::Status {
                url,
                status: page.status,
            }));
        }

        self.parser
            .parse(&page.body)
            .and_then(|raw| build_table(raw, &self.label_column, self.ragged_rows))
            .map_err(|source| CategoryError::Parse {
                category: category.clone(),
                source,
            })
    }

    /// Fetch every category in order and combine the ones that succeeded.
    ///
    /// An empty `categories` slice means [`Category::default_set`]. A repeated
    /// category is fetched once and keeps the position of its first
    /// occurrence; later repeats are skipped without a request.
    pub fn fetch_all(
        &self,
        ticker: &Ticker,
        categories: &[Category],
    ) -> Result<CombinedStatements, AssemblyError> {
        let defaults;
        let categories = if categories.is_empty() {
            defaults = Category::default_set();
            &defaults[..]
        } else {
            categories
        };

        let mut outcomes: Vec<CategoryOutcome> = Vec::with_capacity(categories.len());
        for category in categories {
            if outcomes.iter().any(|(c, _)| c == category) {
                continue;
            }
            let result = self.fetch_category(ticker, category);
            outcomes.push((category.clone(), result));
        }
        assemble(ticker, outcomes)
    }
}

/// Keep the successful categories, in order; log and drop the rest.
pub fn assemble(
    ticker: &Ticker,
    outcomes: Vec<CategoryOutcome>,
) -> Result<CombinedStatements, AssemblyError> {
    let tried: Vec<String> = outcomes.iter().map(|(c, _)| c.to_string()).collect();
    let mut combined = CombinedStatements::new(ticker.clone());

    for (category, outcome) in outcomes {
        match outcome {
            Ok(table) => {
                info!(%category, rows = table.len(), "statement retrieved");
                combined.push(category, table);
            }
            Err(err) => warn!(%category, error = %err, "skipping category"),
        }
    }

    if combined.categories().next().is_none() {
        return Err(AssemblyError::NoData {
            ticker: ticker.clone(),
            tried: tried.join(", "),
        });
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::fetch::Page;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    const KO_BALANCE_SHEET: &str = r#"<html><body>
<div class="tableContainer">
  <div class="tableHeader">
    <div class="column">Aufschlüsselung</div>
    <div class="column">TTM</div>
    <div class="column">12/31/2023</div>
  </div>
  <div class="row"><div class="column">Total Assets</div><div class="column">100</div><div class="column">90</div></div>
  <div class="row"><div class="column">Total Liabilities</div><div class="column">40</div><div class="column">35</div></div>
</div>
</body></html>"#;

    const KO_CASH_FLOW: &str = r#"<div class="tableContainer">
  <div class="tableHeader"><div class="column">Aufschlüsselung</div><div class="column">TTM</div></div>
  <div class="row"><div class="column">Operating Cash Flow</div><div class="column">11</div></div>
</div>"#;

    const DYNAMIC_PAGE: &str = r#"<html><body><div id="root"></div></body></html>"#;

    /// Canned pages keyed by URL path; records every request. Paths in
    /// `unreachable` fail before any response arrives.
    #[derive(Default)]
    struct StubSource {
        pages: HashMap<String, Page>,
        unreachable: HashSet<String>,
        requested: RefCell<Vec<String>>,
    }

    impl StubSource {
        fn with(mut self, path: &str, page: Page) -> Self {
            self.pages.insert(path.to_owned(), page);
            self
        }

        fn unreachable(mut self, path: &str) -> Self {
            self.unreachable.insert(path.to_owned());
            self
        }
    }

    impl PageSource for StubSource {
        fn get(&self, url: &Url) -> Result<Page, TransportError> {
            self.requested.borrow_mut().push(url.path().to_owned());
            if self.unreachable.contains(url.path()) {
                return Err(TransportError::Url(url::ParseError::EmptyHost));
            }
            Ok(self
                .pages
                .get(url.path())
                .cloned()
                .unwrap_or_else(|| Page::status(404)))
        }
    }

    fn ko() -> Ticker {
        Ticker::parse("KO").unwrap()
    }

    fn fetcher(source: &StubSource) -> StatementFetcher<&StubSource> {
        StatementFetcher::new(source, &Config::default()).unwrap()
    }

    #[test]
    fn test_fetch_category_pins_header_truncation() {
        let source =
            StubSource::default().with("/quote/KO/balance-sheet/", Page::ok(KO_BALANCE_SHEET));
        let table = fetcher(&source)
            .fetch_category(&ko(), &Category::balance_sheet())
            .unwrap();
        assert_eq!(table.columns(), &["Description", "Aufschlüsselung", "TTM"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "Description"), Some("Total Assets"));
        assert_eq!(table.value(0, "Aufschlüsselung"), Some("100"));
        assert_eq!(table.value(1, "TTM"), Some("35"));
    }

    #[test]
    fn test_non_200_is_transport_error() {
        let source = StubSource::default().with("/quote/KO/cash-flow/", Page::status(503));
        let err = fetcher(&source)
            .fetch_category(&ko(), &Category::cash_flow())
            .unwrap_err();
        match err {
            CategoryError::Transport {
                category,
                source: TransportError::Status { status, .. },
            } => {
                assert_eq!(category, Category::cash_flow());
                assert_eq!(status, 503);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_dynamic_page_is_parse_error() {
        let source = StubSource::default().with("/quote/KO/financials/", Page::ok(DYNAMIC_PAGE));
        let err = fetcher(&source)
            .fetch_category(&ko(), &Category::financials())
            .unwrap_err();
        assert!(matches!(
            err,
            CategoryError::Parse {
                source: ParseError::MissingContainer,
                ..
            }
        ));
    }

    #[test]
    fn test_fetch_all_skips_failed_categories() {
        let source = StubSource::default()
            .with("/quote/KO/balance-sheet/", Page::status(404))
            .with("/quote/KO/cash-flow/", Page::ok(KO_CASH_FLOW));
        let combined = fetcher(&source)
            .fetch_all(&ko(), &[Category::balance_sheet(), Category::cash_flow()])
            .unwrap();
        assert_eq!(
            combined.categories().cloned().collect::<Vec<_>>(),
            vec![Category::cash_flow()]
        );
        assert_eq!(combined.len(), 1);
    }

    #[test]
    fn test_network_failure_skips_only_its_category() {
        let source = StubSource::default()
            .unreachable("/quote/KO/balance-sheet/")
            .with("/quote/KO/cash-flow/", Page::ok(KO_CASH_FLOW));
        let f = fetcher(&source);

        let err = f
            .fetch_category(&ko(), &Category::balance_sheet())
            .unwrap_err();
        assert!(matches!(
            err,
            CategoryError::Transport {
                source: TransportError::Url(_),
                ..
            }
        ));

        let combined = f
            .fetch_all(&ko(), &[Category::balance_sheet(), Category::cash_flow()])
            .unwrap();
        assert_eq!(
            combined.categories().cloned().collect::<Vec<_>>(),
            vec![Category::cash_flow()]
        );
    }

    #[test]
    fn test_network_failure_alone_is_no_data() {
        let source = StubSource::default().unreachable("/quote/KO/balance-sheet/");
        let err = fetcher(&source)
            .fetch_all(&ko(), &[Category::balance_sheet()])
            .unwrap_err();
        let AssemblyError::NoData { ticker, tried } = err;
        assert_eq!(ticker, ko());
        assert_eq!(tried, "balance-sheet");
    }

    #[test]
    fn test_fetch_all_preserves_request_order() {
        let source = StubSource::default()
            .with("/quote/KO/balance-sheet/", Page::ok(KO_BALANCE_SHEET))
            .with("/quote/KO/cash-flow/", Page::ok(KO_CASH_FLOW));
        let combined = fetcher(&source)
            .fetch_all(&ko(), &[Category::cash_flow(), Category::balance_sheet()])
            .unwrap();
        let keys: Vec<_> = combined
            .iter()
            .map(|r| (r.category.to_string(), r.index))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("cash-flow".to_owned(), 0),
                ("balance-sheet".to_owned(), 0),
                ("balance-sheet".to_owned(), 1),
            ]
        );
    }

    #[test]
    fn test_fetch_all_fails_when_nothing_succeeds() {
        let source = StubSource::default().with("/quote/KO/cash-flow/", Page::ok(DYNAMIC_PAGE));
        let err = fetcher(&source)
            .fetch_all(&ko(), &[Category::balance_sheet(), Category::cash_flow()])
            .unwrap_err();
        let AssemblyError::NoData { ticker, tried } = err;
        assert_eq!(ticker, ko());
        assert_eq!(tried, "balance-sheet, cash-flow");
    }

    #[test]
    fn test_fetch_all_defaults_and_dedupes() {
        let source =
            StubSource::default().with("/quote/KO/balance-sheet/", Page::ok(KO_BALANCE_SHEET));
        let f = fetcher(&source);

        let combined = f.fetch_all(&ko(), &[]).unwrap();
        assert!(combined.contains(&Category::balance_sheet()));

        f.fetch_all(&ko(), &[Category::balance_sheet(), Category::balance_sheet()])
            .unwrap();
        assert_eq!(
            *source.requested.borrow(),
            vec!["/quote/KO/balance-sheet/", "/quote/KO/balance-sheet/"]
        );
    }

    #[test]
    fn test_repeated_category_keeps_first_position() {
        let source = StubSource::default()
            .with("/quote/KO/balance-sheet/", Page::ok(KO_BALANCE_SHEET))
            .with("/quote/KO/cash-flow/", Page::ok(KO_CASH_FLOW));
        let combined = fetcher(&source)
            .fetch_all(
                &ko(),
                &[
                    Category::cash_flow(),
                    Category::balance_sheet(),
                    Category::cash_flow(),
                ],
            )
            .unwrap();
        assert_eq!(
            combined.categories().cloned().collect::<Vec<_>>(),
            vec![Category::cash_flow(), Category::balance_sheet()]
        );
        assert_eq!(
            *source.requested.borrow(),
            vec!["/quote/KO/cash-flow/", "/quote/KO/balance-sheet/"]
        );
    }

    #[test]
    fn test_assemble_filters_errors() {
        let ok = build_table(
            crate::statement::RawStatement {
                header: None,
                rows: vec![vec!["Revenue".into()]],
            },
            "Description",
            RaggedRowPolicy::Fit,
        )
        .unwrap();
        let outcomes = vec![
            (
                Category::financials(),
                Err(CategoryError::Parse {
                    category: Category::financials(),
                    source: ParseError::NoRows,
                }),
            ),
            (Category::cash_flow(), Ok(ok)),
        ];
        let combined = assemble(&ko(), outcomes).unwrap();
        assert!(!combined.contains(&Category::financials()));
        assert_eq!(combined.get(&Category::cash_flow()).unwrap().len(), 1);
    }

    #[test]
    fn test_assemble_empty_is_error() {
        assert!(assemble(&ko(), vec![]).is_err());
    }
}
