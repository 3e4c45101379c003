//! Multi-asset portfolio simulation: date alignment, weighted equity curve,
//! calendar rebalancing and the stop-loss overlay.

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};
use quant_core::{PriceHistory, QuantError, RebalanceFrequency};
use tracing::debug;

use crate::models::{AlignedPrices, PortfolioConfig, PortfolioResult};

/// Inner-join the given histories on date. Dates missing from any one asset
/// are dropped for all of them, so the shared window starts at the latest
/// first date and ends at the earliest last date.
pub fn align(histories: &[PriceHistory]) -> Result<AlignedPrices, QuantError> {
    if histories.is_empty() {
        return Err(QuantError::InvalidData(
            "no price series to align".to_string(),
        ));
    }

    let mut common: BTreeSet<NaiveDate> = histories[0].dates().into_iter().collect();
    for history in &histories[1..] {
        let dates: BTreeSet<NaiveDate> = history.dates().into_iter().collect();
        common = common.intersection(&dates).copied().collect();
    }
    if common.is_empty() {
        let symbols: Vec<&str> = histories.iter().map(|h| h.symbol.as_str()).collect();
        return Err(QuantError::NoOverlap(symbols.join(", ")));
    }

    let dates: Vec<NaiveDate> = common.into_iter().collect();
    let mut closes = Vec::with_capacity(histories.len());
    for history in histories {
        let by_date: HashMap<NaiveDate, f64> = history
            .rows()
            .iter()
            .map(|r| (r.date, r.close))
            .collect();
        closes.push(dates.iter().map(|d| by_date[d]).collect());
    }

    debug!(
        assets = histories.len(),
        rows = dates.len(),
        "aligned price histories"
    );

    Ok(AlignedPrices {
        symbols: histories.iter().map(|h| h.symbol.clone()).collect(),
        dates,
        closes,
    })
}

/// Scale the per-symbol weights so they sum to 1. Every aligned symbol must
/// have a weight; a non-positive total is rejected.
fn normalize_weights(
    prices: &AlignedPrices,
    weights: &HashMap<String, f64>,
) -> Result<Vec<f64>, QuantError> {
    let mut raw = Vec::with_capacity(prices.symbols.len());
    for symbol in &prices.symbols {
        let w = weights.get(symbol).copied().ok_or_else(|| {
            QuantError::InvalidData(format!("missing weight for {symbol}"))
        })?;
        if w < 0.0 {
            return Err(QuantError::InvalidData(format!(
                "negative weight {w} for {symbol}"
            )));
        }
        raw.push(w);
    }
    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return Err(QuantError::InvalidData(format!(
            "weights must sum to a positive value, got {total}"
        )));
    }
    Ok(raw.into_iter().map(|w| w / total).collect())
}

fn crosses_boundary(freq: RebalanceFrequency, prev: NaiveDate, cur: NaiveDate) -> bool {
    match freq {
        RebalanceFrequency::None => false,
        RebalanceFrequency::Monthly => {
            (cur.year(), cur.month()) != (prev.year(), prev.month())
        }
        RebalanceFrequency::Quarterly => {
            (cur.year(), (cur.month() - 1) / 3) != (prev.year(), (prev.month() - 1) / 3)
        }
        RebalanceFrequency::Yearly => cur.year() != prev.year(),
    }
}

/// Simulate a weighted portfolio over aligned prices.
///
/// Each asset holds a currency sleeve that grows with the asset's daily
/// return. Without rebalancing the sleeves drift, which reproduces a
/// buy-and-hold of the initial allocation. At each calendar boundary of the
/// configured frequency the sleeves are reset to target weights of current
/// equity, after charging `fee_pct` percent of equity when set.
pub fn simulate(
    prices: &AlignedPrices,
    weights: &HashMap<String, f64>,
    config: &PortfolioConfig,
) -> Result<PortfolioResult, QuantError> {
    if !(config.initial_capital > 0.0) {
        return Err(QuantError::InvalidData(format!(
            "initial capital must be positive, got {}",
            config.initial_capital
        )));
    }
    if prices.len() < 2 {
        return Err(QuantError::InsufficientData(format!(
            "need at least 2 aligned rows, got {}",
            prices.len()
        )));
    }

    let target = normalize_weights(prices, weights)?;
    let mut sleeves: Vec<f64> = target.iter().map(|w| w * config.initial_capital).collect();
    let allocation: HashMap<String, f64> = prices
        .symbols
        .iter()
        .cloned()
        .zip(sleeves.iter().copied())
        .collect();

    let mut equity = Vec::with_capacity(prices.len());
    equity.push(config.initial_capital);

    for t in 1..prices.len() {
        for (asset, sleeve) in sleeves.iter_mut().enumerate() {
            *sleeve *= prices.closes[asset][t] / prices.closes[asset][t - 1];
        }
        let mut total: f64 = sleeves.iter().sum();

        if crosses_boundary(config.rebalance, prices.dates[t - 1], prices.dates[t]) {
            if config.fee_pct > 0.0 {
                total *= 1.0 - config.fee_pct / 100.0;
            }
            for (sleeve, w) in sleeves.iter_mut().zip(&target) {
                *sleeve = w * total;
            }
            debug!(date = %prices.dates[t], equity = total, "rebalanced to target weights");
        }

        equity.push(total);
    }

    let equity = if config.stop_loss_pct > 0.0 {
        apply_stop_loss(&equity, config.stop_loss_pct)
    } else {
        equity
    };
    let returns = equity.windows(2).map(|w| w[1] / w[0] - 1.0).collect();

    Ok(PortfolioResult {
        dates: prices.dates.clone(),
        equity,
        returns,
        weights: prices
            .symbols
            .iter()
            .cloned()
            .zip(target.iter().copied())
            .collect(),
        allocation,
    })
}

/// Freeze an equity curve once its drawdown from the running peak reaches
/// `stop_loss_pct` percent. Every value from the trigger on is pinned to the
/// value observed at the trigger.
pub fn apply_stop_loss(equity: &[f64], stop_loss_pct: f64) -> Vec<f64> {
    let threshold = -stop_loss_pct / 100.0;
    let mut out = Vec::with_capacity(equity.len());
    let mut peak = f64::NEG_INFINITY;
    let mut frozen_at: Option<f64> = None;

    for &v in equity {
        if let Some(frozen) = frozen_at {
            out.push(frozen);
            continue;
        }
        if v > peak {
            peak = v;
        }
        if peak > 0.0 && v / peak - 1.0 <= threshold {
            frozen_at = Some(v);
        }
        out.push(v);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quant_core::Bar;

    // ========== helpers ==========

    fn daily_history(symbol: &str, start: &str, closes: &[f64]) -> PriceHistory {
        let start: NaiveDate = start.parse().unwrap();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000.0,
            })
            .collect();
        PriceHistory::from_bars(symbol, &bars).unwrap()
    }

    fn flat_history(symbol: &str, start: &str, end: &str) -> PriceHistory {
        let start: NaiveDate = start.parse().unwrap();
        let end: NaiveDate = end.parse().unwrap();
        let days = (end - start).num_days() as usize + 1;
        daily_history(symbol, &start.to_string(), &vec![100.0; days])
    }

    fn weights(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(s, w)| (s.to_string(), *w)).collect()
    }

    // ========== alignment ==========

    #[test]
    fn test_align_keeps_only_shared_dates() {
        // Seed each series one day before its nominal range so the first-row
        // drop in from_bars does not eat into the window under test.
        let a = flat_history("AAA", "2019-12-31", "2020-06-30");
        let b = flat_history("BBB", "2020-02-29", "2020-12-31");

        let aligned = align(&[a, b]).unwrap();
        assert_eq!(aligned.dates.first().unwrap().to_string(), "2020-03-01");
        assert_eq!(aligned.dates.last().unwrap().to_string(), "2020-06-30");
        assert_eq!(aligned.symbols, vec!["AAA", "BBB"]);
        assert_eq!(aligned.closes.len(), 2);
        assert_eq!(aligned.closes[0].len(), aligned.dates.len());
    }

    #[test]
    fn test_align_disjoint_ranges_is_no_overlap() {
        let a = flat_history("AAA", "2020-01-01", "2020-03-31");
        let b = flat_history("BBB", "2021-01-01", "2021-03-31");

        let err = align(&[a, b]).unwrap_err();
        assert!(matches!(err, QuantError::NoOverlap(_)));
    }

    #[test]
    fn test_align_empty_input_is_invalid() {
        assert!(matches!(align(&[]), Err(QuantError::InvalidData(_))));
    }

    // ========== simulation ==========

    #[test]
    fn test_simulate_without_rebalance_is_weighted_buy_and_hold() {
        let a = daily_history("AAA", "2024-01-01", &[100.0, 100.0, 150.0, 200.0]);
        let b = daily_history("BBB", "2024-01-01", &[50.0, 50.0, 50.0, 50.0]);
        let aligned = align(&[a, b]).unwrap();

        let config = PortfolioConfig {
            initial_capital: 10_000.0,
            ..PortfolioConfig::default()
        };
        let result = simulate(&aligned, &weights(&[("AAA", 0.6), ("BBB", 0.4)]), &config).unwrap();

        // AAA sleeve: 6000 -> 9000 -> 12000; BBB sleeve stays 4000.
        assert_eq!(result.equity.len(), 3);
        assert!((result.equity[0] - 10_000.0).abs() < 1e-9);
        assert!((result.equity[1] - 13_000.0).abs() < 1e-9);
        assert!((result.equity[2] - 16_000.0).abs() < 1e-9);
        assert_eq!(result.returns.len(), 2);
        assert!((result.returns[0] - 0.30).abs() < 1e-12);
    }

    #[test]
    fn test_simulate_normalizes_weights() {
        let a = daily_history("AAA", "2024-01-01", &[100.0, 110.0, 121.0]);
        let b = daily_history("BBB", "2024-01-01", &[100.0, 100.0, 100.0]);
        let aligned = align(&[a, b]).unwrap();
        let config = PortfolioConfig::default();

        let unit = simulate(&aligned, &weights(&[("AAA", 0.5), ("BBB", 0.5)]), &config).unwrap();
        let scaled = simulate(&aligned, &weights(&[("AAA", 2.0), ("BBB", 2.0)]), &config).unwrap();

        for (u, s) in unit.equity.iter().zip(&scaled.equity) {
            assert!((u - s).abs() < 1e-9);
        }
        assert!((unit.weights["AAA"] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_simulate_rejects_zero_weights_and_missing_symbols() {
        let a = daily_history("AAA", "2024-01-01", &[100.0, 101.0, 102.0]);
        let b = daily_history("BBB", "2024-01-01", &[100.0, 101.0, 102.0]);
        let aligned = align(&[a, b]).unwrap();
        let config = PortfolioConfig::default();

        let err = simulate(&aligned, &weights(&[("AAA", 0.0), ("BBB", 0.0)]), &config).unwrap_err();
        assert!(matches!(err, QuantError::InvalidData(_)));

        let err = simulate(&aligned, &weights(&[("AAA", 1.0)]), &config).unwrap_err();
        assert!(matches!(err, QuantError::InvalidData(_)));
    }

    #[test]
    fn test_monthly_rebalance_resets_sleeves_at_month_change() {
        // Jan 30..Feb 2; AAA drifts up before the boundary, doubles after it.
        let a = daily_history("AAA", "2024-01-29", &[100.0, 100.0, 150.0, 150.0, 300.0]);
        let b = daily_history("BBB", "2024-01-29", &[100.0, 100.0, 100.0, 100.0, 100.0]);
        let aligned = align(&[a, b]).unwrap();
        let half_half = weights(&[("AAA", 0.5), ("BBB", 0.5)]);

        let hold = simulate(&aligned, &half_half, &PortfolioConfig::default()).unwrap();
        // Drifted sleeves: AAA 5000 -> 15000, BBB 5000.
        assert!((hold.equity.last().unwrap() - 20_000.0).abs() < 1e-9);

        let rebalanced = simulate(
            &aligned,
            &half_half,
            &PortfolioConfig {
                rebalance: RebalanceFrequency::Monthly,
                ..PortfolioConfig::default()
            },
        )
        .unwrap();
        // Feb 1 resets 12500 to 6250/6250, then AAA doubles: 12500 + 6250.
        assert!((rebalanced.equity.last().unwrap() - 18_750.0).abs() < 1e-9);
    }

    #[test]
    fn test_rebalance_fee_is_charged_at_each_boundary() {
        let a = daily_history("AAA", "2024-01-29", &[100.0; 5]);
        let b = daily_history("BBB", "2024-01-29", &[100.0; 5]);
        let aligned = align(&[a, b]).unwrap();

        let result = simulate(
            &aligned,
            &weights(&[("AAA", 0.5), ("BBB", 0.5)]),
            &PortfolioConfig {
                rebalance: RebalanceFrequency::Monthly,
                fee_pct: 1.0,
                ..PortfolioConfig::default()
            },
        )
        .unwrap();

        // Flat prices, one January->February boundary, one 1% haircut.
        assert!((result.equity.last().unwrap() - 9_900.0).abs() < 1e-9);
    }

    #[test]
    fn test_quarterly_and_yearly_boundaries() {
        let jan = "2024-01-15".parse().unwrap();
        let feb = "2024-02-15".parse().unwrap();
        let apr = "2024-04-01".parse().unwrap();
        let next_jan = "2025-01-02".parse().unwrap();

        assert!(!crosses_boundary(RebalanceFrequency::Quarterly, jan, feb));
        assert!(crosses_boundary(RebalanceFrequency::Quarterly, feb, apr));
        assert!(!crosses_boundary(RebalanceFrequency::Yearly, feb, apr));
        assert!(crosses_boundary(RebalanceFrequency::Yearly, apr, next_jan));
        assert!(!crosses_boundary(RebalanceFrequency::None, apr, next_jan));
    }

    // ========== stop-loss ==========

    #[test]
    fn test_stop_loss_freezes_at_trigger_value() {
        let equity = vec![100.0, 120.0, 110.0, 100.0, 95.0, 130.0];
        // Peak 120; 110 is an 8.3% drawdown, 100 is 16.7% and triggers.
        let stopped = apply_stop_loss(&equity, 10.0);
        assert_eq!(stopped, vec![100.0, 120.0, 110.0, 100.0, 100.0, 100.0]);
    }

    #[test]
    fn test_stop_loss_untriggered_leaves_curve_unchanged() {
        let equity = vec![100.0, 105.0, 102.0, 110.0];
        assert_eq!(apply_stop_loss(&equity, 10.0), equity);
    }

    #[test]
    fn test_simulate_applies_stop_loss_overlay() {
        let a = daily_history("AAA", "2024-01-01", &[100.0, 100.0, 120.0, 100.0, 140.0]);
        let aligned = align(&[a]).unwrap();

        let result = simulate(
            &aligned,
            &weights(&[("AAA", 1.0)]),
            &PortfolioConfig {
                stop_loss_pct: 10.0,
                ..PortfolioConfig::default()
            },
        )
        .unwrap();

        // 12000 -> 10000 is a 16.7% drawdown; the recovery leg never happens.
        let last = *result.equity.last().unwrap();
        assert!((last - 10_000.0).abs() < 1e-9);
    }
}
