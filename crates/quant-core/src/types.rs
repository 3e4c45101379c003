use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::QuantError;

/// Raw OHLCV bar as delivered by a market-data provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// One row of a normalized price history: OHLCV plus the simple daily return
/// `close[t] / close[t-1] - 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub simple_return: f64,
}

/// Normalized daily price history for a single asset.
///
/// The date index is strictly increasing and unique. The first provider row
/// is dropped during construction because its return is undefined, so every
/// surviving record carries a finite `simple_return`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    rows: Vec<DailyRecord>,
}

impl PriceHistory {
    /// Build a history from raw bars. Requires at least two bars (the first
    /// is consumed by the return computation), strictly increasing dates, and
    /// positive closes.
    pub fn from_bars(symbol: &str, bars: &[Bar]) -> Result<Self, QuantError> {
        if bars.len() < 2 {
            return Err(QuantError::InsufficientData(format!(
                "{}: need at least 2 bars to compute returns, got {}",
                symbol,
                bars.len()
            )));
        }

        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(QuantError::InvalidData(format!(
                    "{}: dates must be strictly increasing ({} then {})",
                    symbol, pair[0].date, pair[1].date
                )));
            }
        }
        if let Some(bad) = bars.iter().find(|b| !(b.close > 0.0)) {
            return Err(QuantError::InvalidData(format!(
                "{}: non-positive close {} on {}",
                symbol, bad.close, bad.date
            )));
        }

        let rows = bars
            .windows(2)
            .map(|pair| DailyRecord {
                date: pair[1].date,
                open: pair[1].open,
                high: pair[1].high,
                low: pair[1].low,
                close: pair[1].close,
                volume: pair[1].volume,
                simple_return: pair[1].close / pair[0].close - 1.0,
            })
            .collect();

        Ok(Self {
            symbol: symbol.to_string(),
            rows,
        })
    }

    pub fn rows(&self) -> &[DailyRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }

    pub fn returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.simple_return).collect()
    }
}

/// Strategy selection plus its parameters. Dispatch is by pattern match, so
/// an unknown or misspelled parameter cannot be silently ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StrategyConfig {
    BuyAndHold,
    MomentumSma { window: usize },
    Macd { fast: usize, slow: usize, signal: usize },
}

impl StrategyConfig {
    pub fn momentum_default() -> Self {
        StrategyConfig::MomentumSma { window: 50 }
    }

    pub fn macd_default() -> Self {
        StrategyConfig::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }

    /// Short label for chart legends and log lines.
    pub fn label(&self) -> String {
        match self {
            StrategyConfig::BuyAndHold => "B&H".to_string(),
            StrategyConfig::MomentumSma { window } => format!("SMA({window})"),
            StrategyConfig::Macd { fast, slow, signal } => {
                format!("MACD({fast},{slow},{signal})")
            }
        }
    }
}

/// Per-strategy auxiliary series, aligned to the result's date index.
/// Positions are 0.0 (cash) or 1.0 (invested).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StrategyIndicators {
    BuyAndHold,
    MomentumSma {
        sma: Vec<f64>,
        position: Vec<f64>,
    },
    Macd {
        macd_line: Vec<f64>,
        signal_line: Vec<f64>,
        position: Vec<f64>,
    },
}

/// Output of one backtest invocation. All series share the date index.
/// Produced fresh per call and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyResult {
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    pub strategy_equity: Vec<f64>,
    /// `close / close[0]` over the result window.
    pub price_normalized: Vec<f64>,
    /// `strategy_equity / initial_capital`.
    pub strategy_normalized: Vec<f64>,
    pub strategy_return: Vec<f64>,
    pub indicators: StrategyIndicators,
}

/// Snapshot of performance statistics for one equity/return series.
/// `None` marks a statistic that is mathematically undefined for the input
/// (zero volatility, too few observations) so the caller can render "N/A".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub final_equity: f64,
    pub total_return: f64,
    pub annualized_return: Option<f64>,
    pub annualized_volatility: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
}

/// Portfolio rebalancing cadence. Non-`None` frequencies reset allocations
/// to target weights at each calendar boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceFrequency {
    None,
    Monthly,
    Quarterly,
    Yearly,
}

impl RebalanceFrequency {
    pub fn parse(label: &str) -> Result<Self, QuantError> {
        match label.to_ascii_lowercase().as_str() {
            "none" => Ok(RebalanceFrequency::None),
            "monthly" => Ok(RebalanceFrequency::Monthly),
            "quarterly" => Ok(RebalanceFrequency::Quarterly),
            "yearly" => Ok(RebalanceFrequency::Yearly),
            other => Err(QuantError::InvalidData(format!(
                "unknown rebalancing mode {other:?}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RebalanceFrequency::None => "none",
            RebalanceFrequency::Monthly => "monthly",
            RebalanceFrequency::Quarterly => "quarterly",
            RebalanceFrequency::Yearly => "yearly",
        }
    }
}
