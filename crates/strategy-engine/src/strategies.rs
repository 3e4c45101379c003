use quant_core::{
    PriceHistory, QuantError, StrategyConfig, StrategyIndicators, StrategyResult,
};
use tracing::debug;

use crate::indicators::{ewm_mean, rolling_mean};

/// Compound a return series into an equity curve:
/// `equity[t] = initial_capital * prod_{i<=t}(1 + r[i])`.
/// Undefined (NaN) returns contribute a factor of 1.
pub fn equity_from_returns(returns: &[f64], initial_capital: f64) -> Vec<f64> {
    let mut equity = Vec::with_capacity(returns.len());
    let mut value = initial_capital;
    for &r in returns {
        if !r.is_nan() {
            value *= 1.0 + r;
        }
        equity.push(value);
    }
    equity
}

fn validate_capital(initial_capital: f64) -> Result<(), QuantError> {
    if initial_capital > 0.0 {
        Ok(())
    } else {
        Err(QuantError::InvalidData(format!(
            "initial capital must be positive, got {initial_capital}"
        )))
    }
}

fn require_rows(history: &PriceHistory) -> Result<(), QuantError> {
    if history.is_empty() {
        Err(QuantError::InsufficientData(format!(
            "{}: empty price history",
            history.symbol
        )))
    } else {
        Ok(())
    }
}

/// Dispatch a backtest by strategy configuration.
pub fn run_backtest(
    history: &PriceHistory,
    config: &StrategyConfig,
    initial_capital: f64,
) -> Result<StrategyResult, QuantError> {
    match *config {
        StrategyConfig::BuyAndHold => backtest_buy_and_hold(history, initial_capital),
        StrategyConfig::MomentumSma { window } => {
            backtest_momentum_sma(history, window, initial_capital)
        }
        StrategyConfig::Macd { fast, slow, signal } => {
            backtest_macd(history, fast, slow, signal, initial_capital)
        }
    }
}

/// Buy & hold: fully invested every period, so the strategy return is the
/// asset's own simple return.
pub fn backtest_buy_and_hold(
    history: &PriceHistory,
    initial_capital: f64,
) -> Result<StrategyResult, QuantError> {
    validate_capital(initial_capital)?;
    require_rows(history)?;

    let close = history.closes();
    let strategy_return = history.returns();
    let strategy_equity = equity_from_returns(&strategy_return, initial_capital);

    Ok(assemble_result(
        history.dates(),
        close,
        strategy_equity,
        strategy_return,
        initial_capital,
        StrategyIndicators::BuyAndHold,
    ))
}

/// SMA momentum filter: invested while the close sits above its `window`-day
/// simple moving average (partial windows allowed), in cash otherwise.
///
/// The signal computed on day t is applied to day t+1's return — the
/// one-period lag keeps same-day information out of the trade decision.
pub fn backtest_momentum_sma(
    history: &PriceHistory,
    window: usize,
    initial_capital: f64,
) -> Result<StrategyResult, QuantError> {
    validate_capital(initial_capital)?;
    require_rows(history)?;
    if window == 0 {
        return Err(QuantError::InvalidData("SMA window must be > 0".to_string()));
    }

    let close = history.closes();
    let returns = history.returns();
    let sma = rolling_mean(&close, window);

    let signal: Vec<f64> = close
        .iter()
        .zip(sma.iter())
        .map(|(c, s)| if c > s { 1.0 } else { 0.0 })
        .collect();

    // position[t] = signal[t-1]; no position on the first day.
    let mut position = Vec::with_capacity(close.len());
    position.push(0.0);
    position.extend_from_slice(&signal[..signal.len() - 1]);

    let strategy_return: Vec<f64> = position
        .iter()
        .zip(returns.iter())
        .map(|(p, r)| p * r)
        .collect();
    let strategy_equity = equity_from_returns(&strategy_return, initial_capital);

    debug!(
        symbol = %history.symbol,
        window,
        invested_days = position.iter().filter(|&&p| p > 0.0).count(),
        "momentum SMA backtest complete"
    );

    Ok(assemble_result(
        history.dates(),
        close,
        strategy_equity,
        strategy_return,
        initial_capital,
        StrategyIndicators::MomentumSma { sma, position },
    ))
}

/// MACD crossover: invested while the MACD line (fast EMA − slow EMA) sits
/// above its signal-line EMA, with the same one-period lag as the momentum
/// strategy. Warm-up rows without a defined strategy return are dropped, so
/// the result starts `slow + signal - 1` rows into the history.
pub fn backtest_macd(
    history: &PriceHistory,
    fast: usize,
    slow: usize,
    signal: usize,
    initial_capital: f64,
) -> Result<StrategyResult, QuantError> {
    validate_capital(initial_capital)?;
    require_rows(history)?;
    if fast == 0 || slow == 0 || signal == 0 {
        return Err(QuantError::InvalidData(
            "MACD spans must all be > 0".to_string(),
        ));
    }
    if fast >= slow {
        return Err(QuantError::InvalidData(format!(
            "MACD fast span ({fast}) must be below the slow span ({slow})"
        )));
    }

    let close = history.closes();
    let returns = history.returns();
    let n = close.len();

    let ema_fast = ewm_mean(&close, fast, fast);
    let ema_slow = ewm_mean(&close, slow, slow);
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ewm_mean(&macd_line, signal, signal);

    let position: Vec<f64> = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| {
            if m.is_nan() || s.is_nan() {
                f64::NAN
            } else if m > s {
                1.0
            } else {
                0.0
            }
        })
        .collect();

    // First row with both a lagged position and a defined return.
    let start = slow + signal - 1;
    if start >= n {
        return Err(QuantError::InsufficientData(format!(
            "{}: {} rows is not enough for MACD({fast},{slow},{signal}) warm-up",
            history.symbol, n
        )));
    }

    let strategy_return: Vec<f64> = (start..n)
        .map(|t| position[t - 1] * returns[t])
        .collect();
    let strategy_equity = equity_from_returns(&strategy_return, initial_capital);

    let dates = history.dates()[start..].to_vec();
    let close = close[start..].to_vec();
    let indicators = StrategyIndicators::Macd {
        macd_line: macd_line[start..].to_vec(),
        signal_line: signal_line[start..].to_vec(),
        position: position[start..].to_vec(),
    };

    Ok(assemble_result(
        dates,
        close,
        strategy_equity,
        strategy_return,
        initial_capital,
        indicators,
    ))
}

fn assemble_result(
    dates: Vec<chrono::NaiveDate>,
    close: Vec<f64>,
    strategy_equity: Vec<f64>,
    strategy_return: Vec<f64>,
    initial_capital: f64,
    indicators: StrategyIndicators,
) -> StrategyResult {
    let base = close[0];
    let price_normalized = close.iter().map(|c| c / base).collect();
    let strategy_normalized = strategy_equity.iter().map(|e| e / initial_capital).collect();

    StrategyResult {
        dates,
        close,
        strategy_equity,
        price_normalized,
        strategy_normalized,
        strategy_return,
        indicators,
    }
}
