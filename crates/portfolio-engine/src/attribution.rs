//! Per-asset contribution statistics and the cross-asset correlation matrix.

use std::collections::HashMap;

use metrics_engine::{annualized_volatility, max_drawdown, TRADING_DAYS_PER_YEAR};
use quant_core::Summary;

use crate::models::{AlignedPrices, CorrelationMatrix};

/// Stand-alone performance of each asset's sleeve, as if it were held alone
/// from its allocated starting capital over the aligned window.
///
/// Annualization here is calendar-based (elapsed days / 365.25) and the
/// Sharpe figure is the simplified `total_return / volatility` quotient, not
/// the excess-return form used for full strategy summaries.
pub fn per_asset_attribution(
    prices: &AlignedPrices,
    allocation: &HashMap<String, f64>,
) -> HashMap<String, Summary> {
    let years = match (prices.dates.first(), prices.dates.last()) {
        (Some(first), Some(last)) => (*last - *first).num_days() as f64 / 365.25,
        _ => 0.0,
    };

    let mut out = HashMap::with_capacity(prices.symbols.len());
    for (asset, symbol) in prices.symbols.iter().enumerate() {
        let start = allocation.get(symbol).copied().unwrap_or(0.0);
        if !(start > 0.0) {
            out.insert(
                symbol.clone(),
                Summary {
                    final_equity: 0.0,
                    total_return: 0.0,
                    annualized_return: None,
                    annualized_volatility: None,
                    sharpe_ratio: None,
                    max_drawdown: 0.0,
                },
            );
            continue;
        }

        let series = &prices.closes[asset];
        let first_close = series[0];
        let equity: Vec<f64> = series.iter().map(|c| start * c / first_close).collect();
        let returns: Vec<f64> = series.windows(2).map(|w| w[1] / w[0] - 1.0).collect();

        let final_equity = *equity.last().unwrap_or(&start);
        let total_return = final_equity / start - 1.0;
        let growth = final_equity / start;
        let annualized_return = if years > 0.0 && growth > 0.0 {
            Some(growth.powf(1.0 / years) - 1.0)
        } else {
            None
        };
        let vol = annualized_volatility(&returns, TRADING_DAYS_PER_YEAR);
        let sharpe_ratio = vol.filter(|v| *v > 0.0).map(|v| total_return / v);

        out.insert(
            symbol.clone(),
            Summary {
                final_equity,
                total_return,
                annualized_return,
                annualized_volatility: vol,
                sharpe_ratio,
                max_drawdown: max_drawdown(&equity),
            },
        );
    }
    out
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let mean_x: f64 = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y: f64 = y[..n].iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        // Constant series; correlation is undefined.
        return f64::NAN;
    }
    sxy / (sxx * syy).sqrt()
}

/// Pairwise Pearson correlation of daily simple returns across all aligned
/// assets. The diagonal is 1 by construction; a constant return series makes
/// its row NaN, matching how dataframe libraries report it.
pub fn correlation_matrix(prices: &AlignedPrices) -> CorrelationMatrix {
    let returns = prices.simple_returns();
    let n = returns.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let c = pearson(&returns[i], &returns[j]);
            values[i][j] = c;
            values[j][i] = c;
        }
    }
    CorrelationMatrix {
        symbols: prices.symbols.clone(),
        values,
    }
}
