use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::models::{BacktestAuditRecord, ReportRow};

/// Destination for report rows and audit records. The production impl writes
/// to SQLite; tests can substitute an in-memory collector.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn record_report(&self, row: &ReportRow) -> Result<(), anyhow::Error>;
    async fn record_audit(&self, record: &BacktestAuditRecord) -> Result<(), anyhow::Error>;
}

/// Persists daily report rows and portfolio audit records.
pub struct ReportDb {
    pool: SqlitePool,
}

impl ReportDb {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        Ok(Self::new(SqlitePool::connect(database_url).await?))
    }

    /// Create report tables if they don't exist.
    pub async fn init_tables(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS daily_reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                symbol TEXT NOT NULL,
                period_label TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL NOT NULL,
                last_return REAL NOT NULL,
                vol20_annualized REAL,
                bh_total_return REAL NOT NULL,
                bh_sharpe REAL,
                bh_max_drawdown REAL NOT NULL,
                momentum_total_return REAL NOT NULL,
                momentum_sharpe REAL,
                momentum_max_drawdown REAL NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS backtest_audit (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_date TEXT NOT NULL,
                symbols_json TEXT NOT NULL,
                weights_json TEXT NOT NULL,
                horizon_years INTEGER NOT NULL,
                rebalance_mode TEXT NOT NULL,
                stop_loss_pct REAL NOT NULL,
                initial_capital REAL NOT NULL,
                total_return REAL NOT NULL,
                annualized_volatility REAL,
                sharpe_ratio REAL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert one report row. Returns the row ID.
    pub async fn insert_report(&self, row: &ReportRow) -> Result<i64, anyhow::Error> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO daily_reports (
                date, symbol, period_label, open, high, low, close, volume,
                last_return, vol20_annualized,
                bh_total_return, bh_sharpe, bh_max_drawdown,
                momentum_total_return, momentum_sharpe, momentum_max_drawdown
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id",
        )
        .bind(row.date)
        .bind(&row.symbol)
        .bind(&row.period_label)
        .bind(row.open)
        .bind(row.high)
        .bind(row.low)
        .bind(row.close)
        .bind(row.volume)
        .bind(row.last_return)
        .bind(row.vol20_annualized)
        .bind(row.bh_total_return)
        .bind(row.bh_sharpe)
        .bind(row.bh_max_drawdown)
        .bind(row.momentum_total_return)
        .bind(row.momentum_sharpe)
        .bind(row.momentum_max_drawdown)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Insert one portfolio audit record. Returns the row ID.
    pub async fn insert_audit(&self, record: &BacktestAuditRecord) -> Result<i64, anyhow::Error> {
        let symbols_json = serde_json::to_string(&record.symbols)?;
        let weights_json = serde_json::to_string(&record.weights)?;

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO backtest_audit (
                run_date, symbols_json, weights_json, horizon_years,
                rebalance_mode, stop_loss_pct, initial_capital, total_return,
                annualized_volatility, sharpe_ratio
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id",
        )
        .bind(record.run_date)
        .bind(&symbols_json)
        .bind(&weights_json)
        .bind(record.horizon_years)
        .bind(&record.rebalance_mode)
        .bind(record.stop_loss_pct)
        .bind(record.initial_capital)
        .bind(record.total_return)
        .bind(record.annualized_volatility)
        .bind(record.sharpe_ratio)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Most recent report rows, newest first.
    pub async fn recent_reports(&self, limit: i64) -> Result<Vec<ReportRow>, anyhow::Error> {
        let rows = sqlx::query_as::<_, ReportRow>(
            "SELECT date, symbol, period_label, open, high, low, close, volume,
                    last_return, vol20_annualized,
                    bh_total_return, bh_sharpe, bh_max_drawdown,
                    momentum_total_return, momentum_sharpe, momentum_max_drawdown
             FROM daily_reports ORDER BY date DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Most recent audit records, newest first.
    pub async fn recent_audits(
        &self,
        limit: i64,
    ) -> Result<Vec<BacktestAuditRecord>, anyhow::Error> {
        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT run_date, symbols_json, weights_json, horizon_years,
                    rebalance_mode, stop_loss_pct, initial_capital, total_return,
                    annualized_volatility, sharpe_ratio
             FROM backtest_audit ORDER BY run_date DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AuditRow::into_record).collect())
    }
}

#[async_trait]
impl ReportSink for ReportDb {
    async fn record_report(&self, row: &ReportRow) -> Result<(), anyhow::Error> {
        self.insert_report(row).await.map(|_| ())
    }

    async fn record_audit(&self, record: &BacktestAuditRecord) -> Result<(), anyhow::Error> {
        self.insert_audit(record).await.map(|_| ())
    }
}

/// Internal row type for sqlx deserialization.
#[derive(sqlx::FromRow)]
struct AuditRow {
    run_date: NaiveDate,
    symbols_json: String,
    weights_json: String,
    horizon_years: u32,
    rebalance_mode: String,
    stop_loss_pct: f64,
    initial_capital: f64,
    total_return: f64,
    annualized_volatility: Option<f64>,
    sharpe_ratio: Option<f64>,
}

impl AuditRow {
    fn into_record(self) -> BacktestAuditRecord {
        BacktestAuditRecord {
            run_date: self.run_date,
            symbols: serde_json::from_str(&self.symbols_json).unwrap_or_default(),
            weights: serde_json::from_str(&self.weights_json).unwrap_or_default(),
            horizon_years: self.horizon_years,
            rebalance_mode: self.rebalance_mode,
            stop_loss_pct: self.stop_loss_pct,
            initial_capital: self.initial_capital,
            total_return: self.total_return,
            annualized_volatility: self.annualized_volatility,
            sharpe_ratio: self.sharpe_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    async fn memory_db() -> ReportDb {
        let db = ReportDb::connect("sqlite::memory:").await.unwrap();
        db.init_tables().await.unwrap();
        db
    }

    fn report_row(symbol: &str, date: &str) -> ReportRow {
        ReportRow {
            date: date.parse().unwrap(),
            symbol: symbol.to_string(),
            period_label: "250d".to_string(),
            open: 101.0,
            high: 103.0,
            low: 100.5,
            close: 102.5,
            volume: 1_200_000.0,
            last_return: 0.0123,
            vol20_annualized: Some(0.18),
            bh_total_return: 0.21,
            bh_sharpe: Some(1.2),
            bh_max_drawdown: -0.08,
            momentum_total_return: 0.15,
            momentum_sharpe: None,
            momentum_max_drawdown: -0.05,
        }
    }

    #[tokio::test]
    async fn test_report_row_round_trip() {
        let db = memory_db().await;

        let id = db.insert_report(&report_row("AAPL", "2024-06-03")).await.unwrap();
        assert!(id > 0);
        db.insert_report(&report_row("MSFT", "2024-06-04")).await.unwrap();

        let rows = db.recent_reports(10).await.unwrap();
        assert_eq!(rows.len(), 2);
        // Newest first.
        assert_eq!(rows[0].symbol, "MSFT");
        assert_eq!(rows[1].symbol, "AAPL");
        assert!((rows[1].close - 102.5).abs() < 1e-12);
        assert_eq!(rows[1].vol20_annualized, Some(0.18));
        assert_eq!(rows[0].momentum_sharpe, None);
    }

    #[tokio::test]
    async fn test_audit_record_round_trip() {
        let db = memory_db().await;

        let mut weights = HashMap::new();
        weights.insert("AAPL".to_string(), 0.6);
        weights.insert("MSFT".to_string(), 0.4);
        let record = BacktestAuditRecord {
            run_date: "2024-06-03".parse().unwrap(),
            symbols: vec!["AAPL".to_string(), "MSFT".to_string()],
            weights,
            horizon_years: 5,
            rebalance_mode: "monthly".to_string(),
            stop_loss_pct: 10.0,
            initial_capital: 10_000.0,
            total_return: 0.08,
            annualized_volatility: Some(0.16),
            sharpe_ratio: Some(0.5),
        };

        db.insert_audit(&record).await.unwrap();
        let loaded = db.recent_audits(5).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].symbols, record.symbols);
        assert!((loaded[0].weights["AAPL"] - 0.6).abs() < 1e-12);
        assert_eq!(loaded[0].rebalance_mode, "monthly");
        assert_eq!(loaded[0].sharpe_ratio, Some(0.5));
    }

    #[tokio::test]
    async fn test_recent_reports_respects_limit() {
        let db = memory_db().await;
        for day in 1..=5 {
            let date = format!("2024-06-{day:02}");
            db.insert_report(&report_row("SPY", &date)).await.unwrap();
        }
        let rows = db.recent_reports(3).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date.to_string(), "2024-06-05");
    }
}
