//! # quantcore - Option Greeks and Mean-Variance Portfolios
//!
//! A small quantitative finance library covering three connected problems:
//!
//! - **Black-Scholes**: European prices, delta and gamma, implied volatility
//! - **Greeks neutralization**: two offsetting option positions that leave a
//!   book delta-neutral and gamma-neutral
//! - **Markowitz optimization**: minimum variance for a target return
//!   (long-only or with shorting), closed-form max utility and the efficient
//!   frontier
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quantcore::prelude::*;
//!
//! // Short 1000 calls, priced per share
//! let call = OptionContract::call(543.0, 0.53, 545.0, 30.0 / 365.0, 0.015).unwrap();
//! let book = Position::new(call, -1000.0).unwrap();
//!
//! // Neutralize with two other listed options
//! let hedges = vec![
//!     OptionContract::call(543.0, 0.50, 560.0, 60.0 / 365.0, 0.015).unwrap(),
//!     OptionContract::put(543.0, 0.55, 530.0, 30.0 / 365.0, 0.015).unwrap(),
//! ];
//! let portfolio = HedgePortfolio::new(book, hedges).unwrap();
//! let solution = GreeksNeutralizer::default().neutralize(&portfolio).unwrap();
//! assert!(solution.net_greeks.is_neutral(1e-6));
//! ```
//!
//! ## What This Library Does NOT Do
//!
//! - American exercise or dividends
//! - Greeks beyond delta and gamma
//! - Transaction costs or integer lot sizes in optimization

pub mod core;
pub mod hedging;
pub mod linalg;
pub mod models;
pub mod portfolio;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        Greeks, MarketEstimates, MarketInputs, OptionContract, OptionType, Position,
        PriceObservation, PriceSeries, QuantError, QuantResult, ReturnKind, ReturnSeries,
        SolverStatus, DAYS_PER_YEAR, DEFAULT_MULTIPLIER, TRADING_DAYS_PER_YEAR,
    };

    // Pricing
    pub use crate::models::{
        boundary_limit, d1, d2, greeks as bs_greeks, implied_volatility, monte_carlo_price,
        norm_cdf, norm_pdf, price as bs_price, price_batch, MonteCarloEstimate,
    };

    // Hedging
    pub use crate::hedging::{
        delta_hedge_shares, GreeksNeutralizer, HedgeConfig, HedgePortfolio, HedgeSolution,
    };

    // Portfolio
    pub use crate::portfolio::{
        best_sharpe, EfficientFrontier, FrontierOutcome, OptimizerConfig, PortfolioOptimizer,
        PortfolioPoint, UtilityAllocation,
    };
}

// Re-export main types at crate root
pub use crate::core::{QuantError, QuantResult};
pub use crate::hedging::GreeksNeutralizer;
pub use crate::portfolio::PortfolioOptimizer;
