//! Option contract definitions
//!
//! European options under Black-Scholes with their valuation fixed at
//! construction, and signed positions in them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{QuantError, QuantResult};
use super::greeks::Greeks;
use crate::models::black_scholes;

/// Day count used to turn calendar days into year fractions
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Standard equity option contract size
pub const DEFAULT_MULTIPLIER: f64 = 100.0;

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Payoff direction: +1 for call, -1 for put
    pub fn phi(&self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    /// Intrinsic value at given spot
    pub fn intrinsic(&self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }
}

/// Market inputs of a single European option
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketInputs {
    /// Underlying spot price
    pub spot: f64,
    /// Annualized volatility
    pub volatility: f64,
    /// Strike price
    pub strike: f64,
    /// Time to expiration in years
    pub time: f64,
    /// Continuously compounded risk-free rate
    pub rate: f64,
}

impl MarketInputs {
    pub fn new(spot: f64, volatility: f64, strike: f64, time: f64, rate: f64) -> Self {
        Self {
            spot,
            volatility,
            strike,
            time,
            rate,
        }
    }

    /// Inputs with time measured from `as_of` to `expiry` in calendar days
    pub fn from_expiry(
        spot: f64,
        volatility: f64,
        strike: f64,
        expiry: NaiveDate,
        as_of: NaiveDate,
        rate: f64,
    ) -> QuantResult<Self> {
        let days = (expiry - as_of).num_days();
        if days < 0 {
            return Err(QuantError::invalid_argument(format!(
                "expiry {} is before valuation date {}",
                expiry, as_of
            )));
        }
        let inputs = Self::new(spot, volatility, strike, days as f64 / DAYS_PER_YEAR, rate);
        inputs.validate()?;
        Ok(inputs)
    }

    /// Check every input is finite and inside its domain
    pub fn validate(&self) -> QuantResult<()> {
        let fields = [
            ("spot", self.spot),
            ("volatility", self.volatility),
            ("strike", self.strike),
            ("time", self.time),
            ("rate", self.rate),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(QuantError::invalid_argument(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }
        if self.spot <= 0.0 {
            return Err(QuantError::invalid_argument("spot must be positive"));
        }
        if self.strike <= 0.0 {
            return Err(QuantError::invalid_argument("strike must be positive"));
        }
        if self.volatility < 0.0 {
            return Err(QuantError::invalid_argument("volatility must be non-negative"));
        }
        if self.time < 0.0 {
            return Err(QuantError::invalid_argument("time to expiration must be non-negative"));
        }
        Ok(())
    }

    /// Discount factor exp(-rT)
    pub fn discount(&self) -> f64 {
        (-self.rate * self.time).exp()
    }

    /// Total volatility σ√T
    pub fn total_vol(&self) -> f64 {
        self.volatility * self.time.sqrt()
    }
}

/// European option with price and Greeks fixed at construction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionContract {
    option_type: OptionType,
    inputs: MarketInputs,
    price: f64,
    greeks: Greeks,
}

impl OptionContract {
    /// Price a contract; fails on invalid inputs or a degenerate σ√T
    pub fn new(option_type: OptionType, inputs: MarketInputs) -> QuantResult<Self> {
        let price = black_scholes::price(
            inputs.spot,
            inputs.strike,
            inputs.rate,
            inputs.volatility,
            inputs.time,
            option_type,
        )?;
        let greeks = black_scholes::greeks(
            inputs.spot,
            inputs.strike,
            inputs.rate,
            inputs.volatility,
            inputs.time,
            option_type,
        )?;

        Ok(Self {
            option_type,
            inputs,
            price,
            greeks,
        })
    }

    /// European call
    pub fn call(spot: f64, volatility: f64, strike: f64, time: f64, rate: f64) -> QuantResult<Self> {
        Self::new(
            OptionType::Call,
            MarketInputs::new(spot, volatility, strike, time, rate),
        )
    }

    /// European put
    pub fn put(spot: f64, volatility: f64, strike: f64, time: f64, rate: f64) -> QuantResult<Self> {
        Self::new(
            OptionType::Put,
            MarketInputs::new(spot, volatility, strike, time, rate),
        )
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn inputs(&self) -> &MarketInputs {
        &self.inputs
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn greeks(&self) -> Greeks {
        self.greeks
    }

    pub fn delta(&self) -> f64 {
        self.greeks.delta
    }

    pub fn gamma(&self) -> f64 {
        self.greeks.gamma
    }

    /// Intrinsic value at the current spot
    pub fn intrinsic(&self) -> f64 {
        self.option_type
            .intrinsic(self.inputs.spot, self.inputs.strike)
    }

    /// Is this option in the money?
    pub fn is_itm(&self) -> bool {
        self.intrinsic() > 0.0
    }
}

/// Signed holding of option contracts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    /// The option held
    pub contract: OptionContract,
    /// Number of contracts, negative when short
    pub contracts: f64,
    /// Units of underlying per contract
    pub multiplier: f64,
}

impl Position {
    /// Position with the standard 100-share multiplier
    pub fn new(contract: OptionContract, contracts: f64) -> QuantResult<Self> {
        if !contracts.is_finite() {
            return Err(QuantError::invalid_argument("contract count must be finite"));
        }
        Ok(Self {
            contract,
            contracts,
            multiplier: DEFAULT_MULTIPLIER,
        })
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> QuantResult<Self> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(QuantError::invalid_argument("multiplier must be positive"));
        }
        self.multiplier = multiplier;
        Ok(self)
    }

    pub fn is_short(&self) -> bool {
        self.contracts < 0.0
    }

    /// Signed number of underlying units controlled
    pub fn units(&self) -> f64 {
        self.contracts * self.multiplier
    }

    /// Signed premium value of the holding
    pub fn market_value(&self) -> f64 {
        self.contract.price() * self.units()
    }

    /// Aggregate signed Greeks of the holding
    pub fn greeks(&self) -> Greeks {
        self.contract.greeks().scale(self.units())
    }

    /// Per-contract Greeks carrying the position's sign, zero when flat
    pub fn signed_unit_greeks(&self) -> Greeks {
        if self.contracts == 0.0 {
            return Greeks::default();
        }
        self.contract.greeks().scale(self.contracts.signum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_type() {
        assert_eq!(OptionType::Call.phi(), 1.0);
        assert_eq!(OptionType::Put.phi(), -1.0);

        assert_eq!(OptionType::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionType::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionType::Call.intrinsic(90.0, 100.0), 0.0);
    }

    #[test]
    fn test_time_from_expiry() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();

        let inputs = MarketInputs::from_expiry(543.0, 0.53, 545.0, expiry, as_of, 0.015).unwrap();
        assert!((inputs.time - 30.0 / 365.0).abs() < 1e-12);

        let err = MarketInputs::from_expiry(543.0, 0.53, 545.0, as_of, expiry, 0.015).unwrap_err();
        assert!(matches!(err, QuantError::InvalidArgument(_)));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            OptionContract::call(-1.0, 0.2, 100.0, 1.0, 0.01),
            Err(QuantError::InvalidArgument(_))
        ));
        assert!(matches!(
            OptionContract::call(100.0, 0.2, 0.0, 1.0, 0.01),
            Err(QuantError::InvalidArgument(_))
        ));
        assert!(matches!(
            OptionContract::put(100.0, 0.2, 100.0, -0.5, 0.01),
            Err(QuantError::InvalidArgument(_))
        ));
        assert!(matches!(
            OptionContract::put(100.0, f64::NAN, 100.0, 0.5, 0.01),
            Err(QuantError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_degenerate_inputs_are_domain_errors() {
        assert!(matches!(
            OptionContract::call(100.0, 0.0, 100.0, 1.0, 0.01),
            Err(QuantError::Domain(_))
        ));
        assert!(matches!(
            OptionContract::put(100.0, 0.2, 100.0, 0.0, 0.01),
            Err(QuantError::Domain(_))
        ));
    }

    #[test]
    fn test_position_scaling() {
        let call = OptionContract::call(543.0, 0.53, 545.0, 30.0 / 365.0, 0.015).unwrap();
        let short = Position::new(call, -1000.0)
            .unwrap()
            .with_multiplier(1.0)
            .unwrap();

        assert!(short.is_short());
        assert!((short.market_value() + 32_264.05).abs() < 0.1);
        assert!((short.signed_unit_greeks().delta + 0.5239).abs() < 1e-4);
        assert!((short.greeks().delta + 523.9).abs() < 0.1);

        let call = OptionContract::call(100.0, 0.2, 100.0, 1.0, 0.05).unwrap();
        let long = Position::new(call, 2.0).unwrap();
        assert_eq!(long.units(), 200.0);
        assert!(Position::new(long.contract.clone(), 1.0)
            .unwrap()
            .with_multiplier(0.0)
            .is_err());
    }

    #[test]
    fn test_flat_position_has_no_greeks() {
        let call = OptionContract::call(543.0, 0.53, 545.0, 30.0 / 365.0, 0.015).unwrap();
        let flat = Position::new(call, 0.0).unwrap();
        assert!(!flat.is_short());
        assert_eq!(flat.signed_unit_greeks(), Greeks::default());
        assert_eq!(flat.greeks(), Greeks::default());
        assert_eq!(flat.market_value(), 0.0);

        // Negative zero is flat too
        let flat = Position::new(flat.contract.clone(), -0.0).unwrap();
        assert_eq!(flat.signed_unit_greeks(), Greeks::default());
    }
}
