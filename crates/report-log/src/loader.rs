use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use quant_core::{Bar, PriceHistory};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Load a daily OHLCV CSV (header: date,open,high,low,close,volume) into a
/// normalized price history. Validation happens in the history constructor.
pub fn load_history_csv(path: &Path, symbol: &str) -> Result<PriceHistory, anyhow::Error> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening price file {}", path.display()))?;

    let mut bars = Vec::new();
    for record in reader.deserialize() {
        let row: CsvBar =
            record.with_context(|| format!("parsing price file {}", path.display()))?;
        bars.push(Bar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    PriceHistory::from_bars(symbol, &bars)
        .with_context(|| format!("normalizing price file {}", path.display()))
}
