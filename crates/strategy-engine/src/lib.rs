pub mod indicators;
pub mod strategies;

pub use strategies::{
    backtest_buy_and_hold, backtest_macd, backtest_momentum_sma, equity_from_returns,
    run_backtest,
};
