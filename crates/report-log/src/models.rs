use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One line of the daily report: the last session's OHLCV plus rolling and
/// strategy statistics over the loaded window.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub symbol: String,
    /// Label of the window the statistics cover, e.g. "250d".
    pub period_label: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Simple return of the last session.
    pub last_return: f64,
    /// Annualized volatility of the trailing 20 sessions, when defined.
    pub vol20_annualized: Option<f64>,
    pub bh_total_return: f64,
    pub bh_sharpe: Option<f64>,
    pub bh_max_drawdown: f64,
    pub momentum_total_return: f64,
    pub momentum_sharpe: Option<f64>,
    pub momentum_max_drawdown: f64,
}

/// Audit trail of one portfolio simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestAuditRecord {
    pub run_date: NaiveDate,
    pub symbols: Vec<String>,
    pub weights: HashMap<String, f64>,
    pub horizon_years: u32,
    pub rebalance_mode: String,
    pub stop_loss_pct: f64,
    pub initial_capital: f64,
    pub total_return: f64,
    pub annualized_volatility: Option<f64>,
    pub sharpe_ratio: Option<f64>,
}
