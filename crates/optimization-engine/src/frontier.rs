//! Random-weight sampling of the feasible risk/return region, used to draw
//! the cloud behind the optimized points on the frontier chart.

use nalgebra::DVector;
use quant_core::QuantError;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use portfolio_engine::AlignedPrices;

use crate::markowitz::{mean_cov, portfolio_return, portfolio_volatility};

/// One random long-only allocation, annualized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontierPoint {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

/// Sample `samples` random long-only weight vectors (uniform draws scaled to
/// sum to 1) and evaluate each. Samples are independent, so evaluation runs
/// across the rayon pool.
pub fn sample_frontier(
    prices: &AlignedPrices,
    samples: usize,
) -> Result<Vec<FrontierPoint>, QuantError> {
    let (mean, cov) = mean_cov(prices)?;
    let assets = mean.len();

    let points = (0..samples)
        .into_par_iter()
        .map(|_| {
            let mut rng = rand::thread_rng();
            let mut raw: Vec<f64> = (0..assets).map(|_| rng.gen_range(0.0..1.0)).collect();
            let total: f64 = raw.iter().sum();
            if total > 0.0 {
                for w in &mut raw {
                    *w /= total;
                }
            } else {
                raw = vec![1.0 / assets as f64; assets];
            }
            let weights = DVector::from_vec(raw);

            let expected_return = portfolio_return(&weights, &mean);
            let volatility = portfolio_volatility(&weights, &cov);
            let sharpe_ratio = if volatility > 0.0 {
                expected_return / volatility
            } else {
                0.0
            };
            FrontierPoint {
                expected_return,
                volatility,
                sharpe_ratio,
            }
        })
        .collect();

    Ok(points)
}
