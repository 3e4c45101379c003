//! Long-only mean-variance optimization.
//!
//! Weights live on the probability simplex (sum to 1, each in [0, 1]).
//! Both objectives are minimized by projected gradient descent with a
//! numeric gradient and backtracking line search, starting from equal
//! weights.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};
use quant_core::QuantError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use metrics_engine::TRADING_DAYS_PER_YEAR;
use portfolio_engine::AlignedPrices;

const MAX_ITERS: usize = 500;
const GRAD_EPS: f64 = 1e-6;
const IMPROVE_TOL: f64 = 1e-10;
const MIN_STEP: f64 = 1e-12;

/// Optimizer output: weights aligned with `symbols`, plus the annualized
/// statistics of that allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedPortfolio {
    pub symbols: Vec<String>,
    pub weights: Vec<f64>,
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

impl OptimizedPortfolio {
    /// Weights keyed by symbol, in the shape the portfolio simulator takes.
    pub fn weight_map(&self) -> HashMap<String, f64> {
        self.symbols
            .iter()
            .cloned()
            .zip(self.weights.iter().copied())
            .collect()
    }
}

/// Daily mean return vector and sample covariance matrix of the panel.
pub fn mean_cov(prices: &AlignedPrices) -> Result<(DVector<f64>, DMatrix<f64>), QuantError> {
    let returns = prices.simple_returns();
    let assets = returns.len();
    if assets == 0 {
        return Err(QuantError::InvalidData("no assets to optimize".to_string()));
    }
    let obs = returns[0].len();
    if obs < 2 {
        return Err(QuantError::InsufficientData(format!(
            "need at least 2 return observations per asset, got {obs}"
        )));
    }

    let mean = DVector::from_iterator(
        assets,
        returns.iter().map(|r| r.iter().sum::<f64>() / obs as f64),
    );
    let mut cov = DMatrix::zeros(assets, assets);
    for i in 0..assets {
        for j in i..assets {
            let mut acc = 0.0;
            for t in 0..obs {
                acc += (returns[i][t] - mean[i]) * (returns[j][t] - mean[j]);
            }
            let c = acc / (obs as f64 - 1.0);
            cov[(i, j)] = c;
            cov[(j, i)] = c;
        }
    }
    Ok((mean, cov))
}

/// Annualized expected return of a weight vector.
pub fn portfolio_return(weights: &DVector<f64>, mean: &DVector<f64>) -> f64 {
    weights.dot(mean) * TRADING_DAYS_PER_YEAR as f64
}

/// Annualized volatility of a weight vector: sqrt(wᵀ·C·w) scaled by
/// sqrt(trading days).
pub fn portfolio_volatility(weights: &DVector<f64>, cov: &DMatrix<f64>) -> f64 {
    let daily_var = weights.dot(&(cov * weights)).max(0.0);
    daily_var.sqrt() * (TRADING_DAYS_PER_YEAR as f64).sqrt()
}

/// Euclidean projection onto the probability simplex (sort-based).
fn project_to_simplex(v: &DVector<f64>) -> DVector<f64> {
    let mut sorted: Vec<f64> = v.iter().copied().collect();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (i, &u) in sorted.iter().enumerate() {
        cumulative += u;
        let candidate = (cumulative - 1.0) / (i as f64 + 1.0);
        if u - candidate > 0.0 {
            theta = candidate;
        }
    }
    DVector::from_iterator(v.len(), v.iter().map(|&x| (x - theta).max(0.0)))
}

fn numeric_gradient<F>(objective: &F, w: &DVector<f64>) -> DVector<f64>
where
    F: Fn(&DVector<f64>) -> f64,
{
    let mut grad = DVector::zeros(w.len());
    for i in 0..w.len() {
        let mut up = w.clone();
        up[i] += GRAD_EPS;
        let mut down = w.clone();
        down[i] -= GRAD_EPS;
        grad[i] = (objective(&up) - objective(&down)) / (2.0 * GRAD_EPS);
    }
    grad
}

/// Minimize `objective` over the simplex. Returns the current iterate once
/// no descent step improves it (a constrained stationary point); errors only
/// if the iteration budget runs out while still improving.
fn minimize_on_simplex<F>(objective: F, assets: usize) -> Result<DVector<f64>, QuantError>
where
    F: Fn(&DVector<f64>) -> f64,
{
    let mut w = DVector::from_element(assets, 1.0 / assets as f64);
    let mut value = objective(&w);

    for _ in 0..MAX_ITERS {
        let grad = numeric_gradient(&objective, &w);
        let mut step = 1.0;
        let mut improved = false;

        while step > MIN_STEP {
            let candidate = project_to_simplex(&(w.clone() - grad.scale(step)));
            let candidate_value = objective(&candidate);
            if candidate_value.is_finite() && candidate_value < value - IMPROVE_TOL {
                w = candidate;
                value = candidate_value;
                improved = true;
                break;
            }
            step *= 0.5;
        }

        if !improved {
            return Ok(w);
        }
    }

    Err(QuantError::OptimizationFailed(format!(
        "no convergence after {MAX_ITERS} iterations"
    )))
}

fn build_result(
    prices: &AlignedPrices,
    weights: DVector<f64>,
    mean: &DVector<f64>,
    cov: &DMatrix<f64>,
    risk_free_rate: f64,
) -> OptimizedPortfolio {
    let expected_return = portfolio_return(&weights, mean);
    let volatility = portfolio_volatility(&weights, cov);
    let sharpe_ratio = if volatility > 0.0 {
        (expected_return - risk_free_rate) / volatility
    } else {
        0.0
    };
    debug!(
        expected_return,
        volatility, sharpe_ratio, "optimization finished"
    );
    OptimizedPortfolio {
        symbols: prices.symbols.clone(),
        weights: weights.iter().copied().collect(),
        expected_return,
        volatility,
        sharpe_ratio,
    }
}

/// Long-only weights with the highest Sharpe ratio.
pub fn maximize_sharpe(
    prices: &AlignedPrices,
    risk_free_rate: f64,
) -> Result<OptimizedPortfolio, QuantError> {
    let (mean, cov) = mean_cov(prices)?;
    let weights = minimize_on_simplex(
        |w| {
            let vol = portfolio_volatility(w, &cov);
            if vol <= 0.0 {
                return f64::INFINITY;
            }
            -(portfolio_return(w, &mean) - risk_free_rate) / vol
        },
        mean.len(),
    )?;
    Ok(build_result(prices, weights, &mean, &cov, risk_free_rate))
}

/// Long-only weights with the lowest annualized volatility.
pub fn minimize_volatility(prices: &AlignedPrices) -> Result<OptimizedPortfolio, QuantError> {
    let (mean, cov) = mean_cov(prices)?;
    let weights = minimize_on_simplex(|w| portfolio_volatility(w, &cov), mean.len())?;
    Ok(build_result(prices, weights, &mean, &cov, 0.0))
}
