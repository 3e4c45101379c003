//! Cross-analysis leaderboards: for each statistic, a deduplicated sorted
//! value table that converts a statistic's value into a 1-based rank.

use std::collections::HashMap;

use quant_core::Summary;
use serde::{Deserialize, Serialize};

/// Values are rounded to this many decimals before ranking, so analyses that
/// differ only by floating-point noise share a rank.
const RANK_DECIMALS: i32 = 5;

fn round_for_rank(value: f64) -> f64 {
    let scale = 10_f64.powi(RANK_DECIMALS);
    (value * scale).round() / scale
}

/// Statistic a leaderboard can be built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankMetric {
    FinalEquity,
    TotalReturn,
    AnnualizedReturn,
    AnnualizedVolatility,
    SharpeRatio,
    MaxDrawdown,
}

impl RankMetric {
    pub const ALL: [RankMetric; 6] = [
        RankMetric::FinalEquity,
        RankMetric::TotalReturn,
        RankMetric::AnnualizedReturn,
        RankMetric::AnnualizedVolatility,
        RankMetric::SharpeRatio,
        RankMetric::MaxDrawdown,
    ];

    /// Lower-is-better metrics sort ascending; everything else descending.
    /// Drawdown ranks on its signed value, so the shallowest (closest to
    /// zero) drawdown still comes first under a descending sort.
    pub fn ascending(&self) -> bool {
        matches!(self, RankMetric::AnnualizedVolatility)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankMetric::FinalEquity => "final_equity",
            RankMetric::TotalReturn => "total_return",
            RankMetric::AnnualizedReturn => "annualized_return",
            RankMetric::AnnualizedVolatility => "annualized_volatility",
            RankMetric::SharpeRatio => "sharpe_ratio",
            RankMetric::MaxDrawdown => "max_drawdown",
        }
    }

    fn extract(&self, summary: &Summary) -> Option<f64> {
        match self {
            RankMetric::FinalEquity => Some(summary.final_equity),
            RankMetric::TotalReturn => Some(summary.total_return),
            RankMetric::AnnualizedReturn => summary.annualized_return,
            RankMetric::AnnualizedVolatility => summary.annualized_volatility,
            RankMetric::SharpeRatio => summary.sharpe_ratio,
            RankMetric::MaxDrawdown => Some(summary.max_drawdown),
        }
    }
}

/// Per-metric sorted value tables over a set of analysis summaries.
/// Undefined statistics (`None`) are simply absent from their table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rankings {
    tables: HashMap<RankMetric, Vec<f64>>,
}

impl Rankings {
    /// Deduplicated sorted values for one metric; best value first.
    pub fn table(&self, metric: RankMetric) -> &[f64] {
        self.tables.get(&metric).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 1-based rank of `value` under `metric`, or `None` when the value is
    /// not present in the table.
    pub fn rank_of(&self, metric: RankMetric, value: f64) -> Option<usize> {
        let rounded = round_for_rank(value);
        self.table(metric)
            .iter()
            .position(|&v| v == rounded)
            .map(|i| i + 1)
    }

    /// Number of distinct ranked values for one metric.
    pub fn len(&self, metric: RankMetric) -> usize {
        self.table(metric).len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(Vec::is_empty)
    }
}

/// Build all leaderboards from summaries keyed by analysis label.
pub fn build_rankings(summaries: &HashMap<String, Summary>) -> Rankings {
    let mut tables = HashMap::with_capacity(RankMetric::ALL.len());
    for metric in RankMetric::ALL {
        let mut values: Vec<f64> = summaries
            .values()
            .filter_map(|s| metric.extract(s))
            .filter(|v| v.is_finite())
            .map(round_for_rank)
            .collect();
        if metric.ascending() {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        } else {
            values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        }
        values.dedup();
        tables.insert(metric, values);
    }
    Rankings { tables }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(
        final_equity: f64,
        total_return: f64,
        vol: Option<f64>,
        sharpe: Option<f64>,
        max_drawdown: f64,
    ) -> Summary {
        Summary {
            final_equity,
            total_return,
            annualized_return: Some(total_return * 2.0),
            annualized_volatility: vol,
            sharpe_ratio: sharpe,
            max_drawdown,
        }
    }

    fn sample() -> HashMap<String, Summary> {
        let mut out = HashMap::new();
        out.insert(
            "a".to_string(),
            summary(11_000.0, 0.10, Some(0.20), Some(1.1), -0.05),
        );
        out.insert(
            "b".to_string(),
            summary(12_500.0, 0.25, Some(0.15), Some(1.8), -0.12),
        );
        out.insert(
            "c".to_string(),
            summary(9_000.0, -0.10, Some(0.30), Some(-0.4), -0.30),
        );
        out
    }

    #[test]
    fn test_return_ranks_descending() {
        let rankings = build_rankings(&sample());
        assert_eq!(rankings.rank_of(RankMetric::TotalReturn, 0.25), Some(1));
        assert_eq!(rankings.rank_of(RankMetric::TotalReturn, 0.10), Some(2));
        assert_eq!(rankings.rank_of(RankMetric::TotalReturn, -0.10), Some(3));
    }

    #[test]
    fn test_volatility_ranks_ascending() {
        let rankings = build_rankings(&sample());
        assert_eq!(
            rankings.rank_of(RankMetric::AnnualizedVolatility, 0.15),
            Some(1)
        );
        assert_eq!(
            rankings.rank_of(RankMetric::AnnualizedVolatility, 0.30),
            Some(3)
        );
    }

    #[test]
    fn test_drawdown_shallowest_first() {
        let rankings = build_rankings(&sample());
        assert_eq!(rankings.rank_of(RankMetric::MaxDrawdown, -0.05), Some(1));
        assert_eq!(rankings.rank_of(RankMetric::MaxDrawdown, -0.30), Some(3));
    }

    #[test]
    fn test_near_equal_values_share_a_rank() {
        let mut summaries = HashMap::new();
        summaries.insert(
            "x".to_string(),
            summary(10_000.0, 0.123456, Some(0.2), Some(1.0), -0.1),
        );
        summaries.insert(
            "y".to_string(),
            summary(10_000.0, 0.123459, Some(0.2), Some(1.0), -0.1),
        );

        let rankings = build_rankings(&summaries);
        // Both round to 0.12346 and collapse into one table entry.
        assert_eq!(rankings.len(RankMetric::TotalReturn), 1);
        assert_eq!(rankings.rank_of(RankMetric::TotalReturn, 0.123456), Some(1));
        assert_eq!(rankings.rank_of(RankMetric::TotalReturn, 0.123459), Some(1));
    }

    #[test]
    fn test_undefined_statistics_are_skipped() {
        let mut summaries = sample();
        summaries.insert(
            "flat".to_string(),
            summary(10_000.0, 0.0, None, None, 0.0),
        );

        let rankings = build_rankings(&summaries);
        assert_eq!(rankings.len(RankMetric::SharpeRatio), 3);
        assert_eq!(rankings.len(RankMetric::TotalReturn), 4);
        assert_eq!(rankings.rank_of(RankMetric::SharpeRatio, 0.77), None);
    }

    #[test]
    fn test_empty_input() {
        let rankings = build_rankings(&HashMap::new());
        assert!(rankings.is_empty());
        assert_eq!(rankings.rank_of(RankMetric::FinalEquity, 1.0), None);
    }
}
