//! Mean-variance portfolio optimization over an aligned price panel:
//! closed-form statistics, long-only weight search on the simplex, and
//! random-weight sampling of the feasible frontier.

pub mod frontier;
pub mod markowitz;

pub use frontier::{sample_frontier, FrontierPoint};
pub use markowitz::{
    maximize_sharpe, mean_cov, minimize_volatility, portfolio_return, portfolio_volatility,
    OptimizedPortfolio,
};
