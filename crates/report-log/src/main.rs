//! report-log: end-of-day report runner.
//!
//! Loads `<DATA_DIR>/<TICKER>.csv` for each ticker on the watchlist, reruns
//! the standard strategies over the window, and writes one row per symbol to
//! the `daily_reports` table.
//!
//! Environment:
//!   DATABASE_URL    sqlite URL, default sqlite://quantfolio.db?mode=rwc
//!   DATA_DIR        directory of per-ticker CSV files, default ./data
//!   REPORT_TICKERS  comma-separated watchlist, default AAPL,MSFT,SPY

use std::path::PathBuf;

use report_log::{run_daily_report, ReportDb};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "report_log=info".into()),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://quantfolio.db?mode=rwc".to_string());
    let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
    let tickers: Vec<String> = std::env::var("REPORT_TICKERS")
        .unwrap_or_else(|_| "AAPL,MSFT,SPY".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    info!(db = %database_url, dir = %data_dir.display(), tickers = tickers.len(), "starting report run");

    let db = ReportDb::connect(&database_url).await?;
    db.init_tables().await?;

    let written = run_daily_report(&db, &data_dir, &tickers).await?;
    info!(written, "report run finished");
    Ok(())
}
