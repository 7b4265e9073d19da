// src/fetch/urls.rs

use url::Url;

use crate::error::TransportError;
use crate::statement::{Category, Ticker};

/// Fill `template` with the ticker and category and resolve it against `base`.
///
/// `https://de.finance.yahoo.com/` + `quote/{ticker}/{category}/` gives
/// `https://de.finance.yahoo.com/quote/KO/balance-sheet/`.
pub fn statement_url(
    base: &Url,
    template: &str,
    ticker: &Ticker,
    category: &Category,
) -> Result<Url, TransportError> {
    let path = template
        .replace("{ticker}", ticker.as_str())
        .replace("{category}", category.as_str());
    Ok(base.join(&path)?)
}
