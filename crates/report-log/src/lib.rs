//! End-of-day reporting: load price files, rerun the standard strategies over
//! the window, and persist one summary row per symbol to SQLite.

pub mod db;
pub mod loader;
pub mod models;
pub mod report;

pub use db::{ReportDb, ReportSink};
pub use loader::load_history_csv;
pub use models::{BacktestAuditRecord, ReportRow};
pub use report::{build_report_row, run_daily_report};
