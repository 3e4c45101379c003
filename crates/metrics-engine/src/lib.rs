//! Performance statistics over equity and return series.
//! Stateless functions — no storage, no async, no shared state.

use quant_core::{StrategyResult, Summary};
use statrs::statistics::Statistics;

pub const TRADING_DAYS_PER_YEAR: u32 = 252;

fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Maximum drawdown of an equity curve: the most negative value of
/// `equity[t] / running_max[t] - 1`. Always <= 0; exactly 0 when the curve
/// never declines.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &v in equity.iter().filter(|v| !v.is_nan()) {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = v / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Annualized return from periodic simple returns:
/// `(1 + mean(returns))^periods_per_year - 1`.
///
/// The arithmetic mean is scaled rather than compounding the observed path,
/// which diverges from the geometric figure for volatile series.
pub fn annualized_return(returns: &[f64], periods_per_year: u32) -> Option<f64> {
    let r = finite(returns);
    if r.is_empty() {
        return None;
    }
    let mean = r.as_slice().mean();
    Some((1.0 + mean).powi(periods_per_year as i32) - 1.0)
}

/// Annualized volatility: sample standard deviation (n-1 denominator) of
/// periodic returns scaled by sqrt(periods_per_year). Needs at least two
/// observations.
pub fn annualized_volatility(returns: &[f64], periods_per_year: u32) -> Option<f64> {
    let r = finite(returns);
    if r.len() < 2 {
        return None;
    }
    Some(r.as_slice().std_dev() * (periods_per_year as f64).sqrt())
}

/// Annualized Sharpe ratio: (annualized return − risk-free rate) / annualized
/// volatility. `None` when volatility is zero or the series is too short —
/// the statistic is undefined, not an error.
pub fn sharpe_ratio(
    returns: &[f64],
    risk_free_rate: f64,
    periods_per_year: u32,
) -> Option<f64> {
    let ar = annualized_return(returns, periods_per_year)?;
    let vol = annualized_volatility(returns, periods_per_year)?;
    if vol == 0.0 || vol.is_nan() {
        return None;
    }
    Some((ar - risk_free_rate) / vol)
}

/// Compose a [`Summary`] from an equity curve and its per-period returns.
pub fn summarize_series(
    equity: &[f64],
    returns: &[f64],
    initial_capital: f64,
    periods_per_year: u32,
    risk_free_rate: f64,
) -> Summary {
    let final_equity = equity.last().copied().unwrap_or(initial_capital);
    Summary {
        final_equity,
        total_return: final_equity / initial_capital - 1.0,
        annualized_return: annualized_return(returns, periods_per_year),
        annualized_volatility: annualized_volatility(returns, periods_per_year),
        sharpe_ratio: sharpe_ratio(returns, risk_free_rate, periods_per_year),
        max_drawdown: max_drawdown(equity),
    }
}

/// Summarize a strategy backtest.
pub fn summarize(
    result: &StrategyResult,
    initial_capital: f64,
    periods_per_year: u32,
    risk_free_rate: f64,
) -> Summary {
    summarize_series(
        &result.strategy_equity,
        &result.strategy_return,
        initial_capital,
        periods_per_year,
        risk_free_rate,
    )
}
