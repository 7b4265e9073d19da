use anyhow::{Context, Result};
use finscraper::{output, statement::Ticker, Config, StatementFetcher};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn prompt_ticker() -> Result<Ticker> {
    print!("Gib das Tickersymbol der Aktie ein (z. B. KO für Coca-Cola): ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading ticker from stdin")?;
    Ok(Ticker::parse(&line)?)
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) config ───────────────────────────────────────────────────
    let config = Config::load().context("loading configuration")?;

    // ─── 3) ticker ───────────────────────────────────────────────────
    println!("Willkommen zur Finanzdatenanalyse!");
    let ticker = match std::env::args().nth(1) {
        Some(arg) => Ticker::parse(&arg)?,
        None => prompt_ticker()?,
    };

    // ─── 4) fetch & combine ──────────────────────────────────────────
    let categories = config.categories();
    let names: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
    println!("\nAbrufen von '{}'-Daten für {}...\n", names.join(", "), ticker);

    let fetcher = StatementFetcher::from_config(&config)?;
    let combined = fetcher.fetch_all(&ticker, &categories)?;
    info!(
        categories = combined.categories().count(),
        rows = combined.len(),
        "combined statements"
    );

    // ─── 5) select columns, drop unlabelled rows ─────────────────────
    let mut selection = combined.select(&config.output.columns);
    let dropped = selection.drop_missing(&config.output.required_column);
    info!(dropped, kept = selection.len(), "filtered rows");
    if selection.is_empty() {
        warn!(
            column = %config.output.required_column,
            "no rows carry the required column; nothing written"
        );
        return Ok(());
    }
    println!("{selection}");

    // ─── 6) persist ──────────────────────────────────────────────────
    let path = config.output.path_for(&ticker);
    output::write_csv(&path, &selection)
        .with_context(|| format!("writing {}", path.display()))?;
    println!(
        "\nDie Daten wurden in der Datei '{}' gespeichert.",
        path.display()
    );
    Ok(())
}
