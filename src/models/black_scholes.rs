//! Black-Scholes Model
//!
//! Provides:
//! - European option pricing
//! - Delta and gamma
//! - Expiry / zero-volatility limits for callers that need them
//! - Implied volatility solver (Newton-Raphson with bisection fallback)
//!
//! Every function validates its inputs. A zero σ√T leaves d1 undefined and is
//! reported as a domain error rather than silently replaced by the limit.

use std::f64::consts::{PI, SQRT_2};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

use crate::core::{Greeks, MarketInputs, OptionContract, OptionType, QuantError, QuantResult};

/// Batches at least this large are priced on the rayon pool
pub const PARALLEL_BATCH_THRESHOLD: usize = 64;

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal PDF
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

fn checked_inputs(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> QuantResult<MarketInputs> {
    let inputs = MarketInputs::new(spot, vol, strike, time, rate);
    inputs.validate()?;
    if inputs.total_vol() == 0.0 {
        return Err(QuantError::domain(format!(
            "d1 undefined for volatility {} and time {}",
            vol, time
        )));
    }
    Ok(inputs)
}

fn d1_unchecked(inputs: &MarketInputs) -> f64 {
    let discounted_strike = inputs.discount() * inputs.strike;
    ((inputs.spot / discounted_strike).ln() + 0.5 * inputs.volatility * inputs.volatility * inputs.time)
        / inputs.total_vol()
}

/// Black-Scholes d1 parameter
pub fn d1(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> QuantResult<f64> {
    let inputs = checked_inputs(spot, strike, rate, vol, time)?;
    Ok(d1_unchecked(&inputs))
}

/// Black-Scholes d2 parameter
pub fn d2(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> QuantResult<f64> {
    let inputs = checked_inputs(spot, strike, rate, vol, time)?;
    Ok(d1_unchecked(&inputs) - inputs.total_vol())
}

/// Black-Scholes European option price
pub fn price(
    spot: f64,
    strike: f64,
    rate: f64,
    vol: f64,
    time: f64,
    option_type: OptionType,
) -> QuantResult<f64> {
    let inputs = checked_inputs(spot, strike, rate, vol, time)?;
    let d1 = d1_unchecked(&inputs);
    let d2 = d1 - inputs.total_vol();
    let df = inputs.discount();

    let value = match option_type {
        OptionType::Call => norm_cdf(d1) * spot - norm_cdf(d2) * df * strike,
        OptionType::Put => norm_cdf(-d2) * df * strike - norm_cdf(-d1) * spot,
    };
    Ok(value)
}

/// Black-Scholes delta and gamma
pub fn greeks(
    spot: f64,
    strike: f64,
    rate: f64,
    vol: f64,
    time: f64,
    option_type: OptionType,
) -> QuantResult<Greeks> {
    let inputs = checked_inputs(spot, strike, rate, vol, time)?;
    let d1 = d1_unchecked(&inputs);

    let delta = match option_type {
        OptionType::Call => norm_cdf(d1),
        OptionType::Put => norm_cdf(d1) - 1.0,
    };

    // Gamma (same for call and put)
    let gamma = norm_pdf(d1) / (spot * inputs.total_vol());

    Ok(Greeks::new(delta, gamma))
}

/// Vega: dV/dσ per unit of volatility (same for call and put)
pub fn vega(spot: f64, strike: f64, rate: f64, vol: f64, time: f64) -> QuantResult<f64> {
    let inputs = checked_inputs(spot, strike, rate, vol, time)?;
    Ok(spot * norm_pdf(d1_unchecked(&inputs)) * time.sqrt())
}

/// Value and Greeks in the σ√T → 0 limit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryLimit {
    pub price: f64,
    pub greeks: Greeks,
}

/// Limit of price, delta and gamma as volatility or time goes to zero.
///
/// The price converges to the intrinsic value against the discounted strike.
/// Delta steps from 0 to 1 (calls) at `spot == strike * exp(-rT)`, taking the
/// midpoint there, and gamma is zero everywhere except that point where it is
/// infinite.
pub fn boundary_limit(
    spot: f64,
    strike: f64,
    rate: f64,
    time: f64,
    option_type: OptionType,
) -> QuantResult<BoundaryLimit> {
    let inputs = MarketInputs::new(spot, 0.0, strike, time, rate);
    inputs.validate()?;

    let discounted_strike = inputs.discount() * strike;
    let price = option_type.intrinsic(spot, discounted_strike);

    let call_delta = if spot > discounted_strike {
        1.0
    } else if spot < discounted_strike {
        0.0
    } else {
        0.5
    };
    let delta = match option_type {
        OptionType::Call => call_delta,
        OptionType::Put => call_delta - 1.0,
    };
    let gamma = if spot == discounted_strike { f64::INFINITY } else { 0.0 };

    Ok(BoundaryLimit {
        price,
        greeks: Greeks::new(delta, gamma),
    })
}

/// Implied volatility solver using Newton-Raphson with bisection fallback
pub fn implied_volatility(
    market_price: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    time: f64,
    option_type: OptionType,
) -> QuantResult<f64> {
    // Sanity checks
    if !(market_price.is_finite() && market_price > 0.0) {
        return Err(QuantError::invalid_argument("option price must be positive"));
    }
    if time <= 0.0 {
        return Err(QuantError::domain("implied volatility needs positive time to expiry"));
    }
    MarketInputs::new(spot, 0.0, strike, time, rate).validate()?;

    // No-arbitrage bounds
    let df = (-rate * time).exp();
    let lower = option_type.intrinsic(spot, df * strike);
    let upper = match option_type {
        OptionType::Call => spot,
        OptionType::Put => df * strike,
    };
    if market_price <= lower || market_price >= upper {
        return Err(QuantError::invalid_argument(format!(
            "price {:.6} outside no-arbitrage bounds ({:.6}, {:.6})",
            market_price, lower, upper
        )));
    }

    // Brenner-Subrahmanyam initial guess
    let mut vol = (market_price / (0.4 * spot * time.sqrt())).clamp(0.01, 3.0);

    let max_iter = 100;
    let tol = 1e-10;

    for _ in 0..max_iter {
        let diff = price(spot, strike, rate, vol, time, option_type)? - market_price;
        if diff.abs() < tol {
            return Ok(vol);
        }

        let vega = vega(spot, strike, rate, vol, time)?;
        if vega.abs() < 1e-12 {
            break;
        }

        let next = vol - diff / vega;
        if next <= 0.0 || next > 5.0 {
            break;
        }
        vol = next;
    }

    tracing::debug!("Newton IV stalled at vol {:.6}, falling back to bisection", vol);
    bisection_iv(market_price, spot, strike, rate, time, option_type)
}

/// Bisection method for IV (slower but more robust)
fn bisection_iv(
    market_price: f64,
    spot: f64,
    strike: f64,
    rate: f64,
    time: f64,
    option_type: OptionType,
) -> QuantResult<f64> {
    let mut low = 1e-4;
    let mut high = 5.0;
    let tol = 1e-10;

    for _ in 0..200 {
        let mid = 0.5 * (low + high);
        let diff = price(spot, strike, rate, mid, time, option_type)? - market_price;

        if diff.abs() < tol || (high - low) < tol {
            return Ok(mid);
        }
        if diff > 0.0 {
            high = mid;
        } else {
            low = mid;
        }
    }

    Err(QuantError::numerical("IV solver did not converge"))
}

/// Price many independent contracts, one result per input in input order
pub fn price_batch(batch: &[(OptionType, MarketInputs)]) -> Vec<QuantResult<OptionContract>> {
    let build = |(option_type, inputs): &(OptionType, MarketInputs)| {
        OptionContract::new(*option_type, *inputs)
    };

    if batch.len() >= PARALLEL_BATCH_THRESHOLD {
        batch.par_iter().map(build).collect()
    } else {
        batch.iter().map(build).collect()
    }
}
