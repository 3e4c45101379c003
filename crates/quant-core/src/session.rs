use serde::{Deserialize, Serialize};

use crate::{QuantError, StrategyConfig, Summary};

/// One analysis registered in a dashboard session: the run parameters plus
/// the computed summary, tagged with a stable display slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisEntry {
    /// Stable slot index used for chart labeling/coloring. Slots are reused
    /// after removal, lowest free slot first.
    pub slot: usize,
    pub symbol: String,
    pub config: StrategyConfig,
    pub initial_capital: f64,
    pub horizon_years: u32,
    pub summary: Summary,
}

/// Caller-owned registry of the analyses currently on screen.
///
/// The engines themselves are stateless; everything a request needs is passed
/// in, and everything the UI wants to keep between interactions lives here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSession {
    entries: Vec<AnalysisEntry>,
    capacity: usize,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

pub const DEFAULT_SESSION_CAPACITY: usize = 10;

impl AnalysisSession {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SESSION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn entries(&self) -> &[AnalysisEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register an analysis. Rejects duplicates (same symbol, strategy and
    /// horizon) and enforces the session capacity. Returns the assigned slot.
    pub fn add(
        &mut self,
        symbol: &str,
        config: StrategyConfig,
        initial_capital: f64,
        horizon_years: u32,
        summary: Summary,
    ) -> Result<usize, QuantError> {
        if self.entries.len() >= self.capacity {
            return Err(QuantError::SessionLimit(self.capacity));
        }
        if self.entries.iter().any(|e| {
            e.symbol == symbol && e.config == config && e.horizon_years == horizon_years
        }) {
            return Err(QuantError::DuplicateAnalysis(format!(
                "{} {} over {}y",
                symbol,
                config.label(),
                horizon_years
            )));
        }

        let slot = self.next_free_slot();
        self.entries.push(AnalysisEntry {
            slot,
            symbol: symbol.to_string(),
            config,
            initial_capital,
            horizon_years,
            summary,
        });
        Ok(slot)
    }

    /// Remove the entry occupying `slot`, freeing it for reuse.
    pub fn remove(&mut self, slot: usize) -> Option<AnalysisEntry> {
        let idx = self.entries.iter().position(|e| e.slot == slot)?;
        Some(self.entries.remove(idx))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn next_free_slot(&self) -> usize {
        let mut slot = 0;
        while self.entries.iter().any(|e| e.slot == slot) {
            slot += 1;
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Summary {
        Summary {
            final_equity: 1_100.0,
            total_return: 0.10,
            annualized_return: Some(0.05),
            annualized_volatility: Some(0.15),
            sharpe_ratio: Some(0.33),
            max_drawdown: -0.08,
        }
    }

    #[test]
    fn test_add_assigns_sequential_slots() {
        let mut session = AnalysisSession::new();
        let a = session
            .add("AAA", StrategyConfig::BuyAndHold, 1_000.0, 5, summary())
            .unwrap();
        let b = session
            .add("BBB", StrategyConfig::BuyAndHold, 1_000.0, 5, summary())
            .unwrap();
        assert_eq!((a, b), (0, 1));
    }

    #[test]
    fn test_removed_slot_is_reused_first() {
        let mut session = AnalysisSession::new();
        for symbol in ["AAA", "BBB", "CCC"] {
            session
                .add(symbol, StrategyConfig::BuyAndHold, 1_000.0, 5, summary())
                .unwrap();
        }
        session.remove(1).unwrap();
        let slot = session
            .add("DDD", StrategyConfig::BuyAndHold, 1_000.0, 5, summary())
            .unwrap();
        assert_eq!(slot, 1);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut session = AnalysisSession::new();
        session
            .add("AAA", StrategyConfig::momentum_default(), 1_000.0, 5, summary())
            .unwrap();
        let err = session
            .add("AAA", StrategyConfig::momentum_default(), 2_000.0, 5, summary())
            .unwrap_err();
        assert!(matches!(err, QuantError::DuplicateAnalysis(_)));

        // Same symbol with a different window is a distinct analysis.
        session
            .add(
                "AAA",
                StrategyConfig::MomentumSma { window: 20 },
                1_000.0,
                5,
                summary(),
            )
            .unwrap();
    }

    #[test]
    fn test_capacity_enforced() {
        let mut session = AnalysisSession::with_capacity(2);
        session
            .add("AAA", StrategyConfig::BuyAndHold, 1_000.0, 5, summary())
            .unwrap();
        session
            .add("BBB", StrategyConfig::BuyAndHold, 1_000.0, 5, summary())
            .unwrap();
        let err = session
            .add("CCC", StrategyConfig::BuyAndHold, 1_000.0, 5, summary())
            .unwrap_err();
        assert!(matches!(err, QuantError::SessionLimit(2)));
    }
}
