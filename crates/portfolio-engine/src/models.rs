use std::collections::HashMap;

use chrono::NaiveDate;
use quant_core::RebalanceFrequency;
use serde::{Deserialize, Serialize};

/// Multi-asset close prices inner-joined on date: only dates present in
/// every input series survive, so the common backtest window starts at the
/// latest first date among the assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedPrices {
    pub symbols: Vec<String>,
    pub dates: Vec<NaiveDate>,
    /// `closes[asset][t]`, indexed like `symbols` and `dates`.
    pub closes: Vec<Vec<f64>>,
}

impl AlignedPrices {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Daily simple returns per asset; one fewer entry than dates.
    pub fn simple_returns(&self) -> Vec<Vec<f64>> {
        self.closes
            .iter()
            .map(|series| series.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
            .collect()
    }
}

/// Parameters of one portfolio simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioConfig {
    pub initial_capital: f64,
    pub rebalance: RebalanceFrequency,
    /// Flat fee charged at each rebalance, as a percent of portfolio equity.
    pub fee_pct: f64,
    /// Drawdown threshold in percent that freezes the position; 0 or less
    /// disables the overlay.
    pub stop_loss_pct: f64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            rebalance: RebalanceFrequency::None,
            fee_pct: 0.0,
            stop_loss_pct: 0.0,
        }
    }
}

/// Output of one portfolio simulation. Lifetime is a single run; nothing is
/// shared or mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub dates: Vec<NaiveDate>,
    pub equity: Vec<f64>,
    /// Daily simple returns of the equity curve; one fewer entry than dates.
    pub returns: Vec<f64>,
    /// Normalized target weights actually applied.
    pub weights: HashMap<String, f64>,
    /// Capital allocated per asset at the start: `weight * initial_capital`.
    pub allocation: HashMap<String, f64>,
}

/// Pearson correlation of daily returns between every asset pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub symbols: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        Some(self.values[i][j])
    }
}
