use std::path::Path;

use metrics_engine::{annualized_volatility, summarize, TRADING_DAYS_PER_YEAR};
use quant_core::{PriceHistory, QuantError, StrategyConfig};
use strategy_engine::run_backtest;
use tracing::{info, warn};

use crate::db::ReportSink;
use crate::loader::load_history_csv;
use crate::models::ReportRow;

/// Notional capital the report strategies are run with. Only the relative
/// statistics land in the report, so the absolute level is arbitrary.
const REPORT_CAPITAL: f64 = 10_000.0;

const VOL_WINDOW: usize = 20;

/// Build one report row for a symbol: last session's OHLCV, trailing 20-day
/// volatility, and buy-and-hold vs momentum statistics over the full window.
pub fn build_report_row(history: &PriceHistory) -> Result<ReportRow, QuantError> {
    let last = history
        .rows()
        .last()
        .ok_or_else(|| QuantError::InsufficientData(format!("{}: empty history", history.symbol)))?
        .clone();

    let returns = history.returns();
    let tail = &returns[returns.len().saturating_sub(VOL_WINDOW)..];
    let vol20_annualized = annualized_volatility(tail, TRADING_DAYS_PER_YEAR);

    let bh = run_backtest(history, &StrategyConfig::BuyAndHold, REPORT_CAPITAL)?;
    let bh_summary = summarize(&bh, REPORT_CAPITAL, TRADING_DAYS_PER_YEAR, 0.0);

    let momentum = run_backtest(history, &StrategyConfig::momentum_default(), REPORT_CAPITAL)?;
    let momentum_summary = summarize(&momentum, REPORT_CAPITAL, TRADING_DAYS_PER_YEAR, 0.0);

    Ok(ReportRow {
        date: last.date,
        symbol: history.symbol.clone(),
        period_label: format!("{}d", history.len()),
        open: last.open,
        high: last.high,
        low: last.low,
        close: last.close,
        volume: last.volume,
        last_return: last.simple_return,
        vol20_annualized,
        bh_total_return: bh_summary.total_return,
        bh_sharpe: bh_summary.sharpe_ratio,
        bh_max_drawdown: bh_summary.max_drawdown,
        momentum_total_return: momentum_summary.total_return,
        momentum_sharpe: momentum_summary.sharpe_ratio,
        momentum_max_drawdown: momentum_summary.max_drawdown,
    })
}

/// Run the report over a watchlist: load `<data_dir>/<TICKER>.csv` for each
/// ticker and persist one row per symbol. A symbol that fails to load or
/// backtest is logged and skipped; sink failures abort the run.
pub async fn run_daily_report(
    sink: &dyn ReportSink,
    data_dir: &Path,
    tickers: &[String],
) -> Result<usize, anyhow::Error> {
    let mut written = 0;
    for ticker in tickers {
        let path = data_dir.join(format!("{ticker}.csv"));
        let row = match load_history_csv(&path, ticker)
            .and_then(|history| build_report_row(&history).map_err(Into::into))
        {
            Ok(row) => row,
            Err(error) => {
                warn!(%ticker, %error, "skipping symbol");
                continue;
            }
        };
        sink.record_report(&row).await?;
        written += 1;
    }
    info!(written, requested = tickers.len(), "daily report complete");
    Ok(written)
}
