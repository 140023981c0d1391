//! Historical prices, periodic returns and their moment estimates
//!
//! Price histories come from an external market-data source; this module only
//! checks their ordering and turns them into mean/covariance inputs for the
//! portfolio optimizer.

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::{QuantError, QuantResult};

/// Trading periods per year for daily data
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Single timestamped price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Ordered price history of one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Asset symbol
    pub symbol: String,
    /// Observations in strictly increasing time order
    pub observations: Vec<PriceObservation>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, observations: Vec<PriceObservation>) -> QuantResult<Self> {
        let series = Self {
            symbol: symbol.into(),
            observations,
        };
        series.validate()?;
        Ok(series)
    }

    /// Check ordering and positivity
    pub fn validate(&self) -> QuantResult<()> {
        if self.observations.len() < 2 {
            return Err(QuantError::invalid_argument(format!(
                "{}: need at least 2 prices, got {}",
                self.symbol,
                self.observations.len()
            )));
        }
        if let Some(bad) = self
            .observations
            .iter()
            .find(|o| !(o.price.is_finite() && o.price > 0.0))
        {
            return Err(QuantError::invalid_argument(format!(
                "{}: price {} at {} is not positive",
                self.symbol, bad.price, bad.timestamp
            )));
        }
        if self
            .observations
            .windows(2)
            .any(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(QuantError::invalid_argument(format!(
                "{}: timestamps are not strictly increasing",
                self.symbol
            )));
        }
        Ok(())
    }

    pub fn prices(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.price).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.observations.iter().map(|o| o.timestamp).collect()
    }
}

/// How period returns are computed from consecutive prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnKind {
    /// p1 / p0 - 1
    Simple,
    /// ln(p1 / p0)
    Log,
}

/// Periodic returns of one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub symbol: String,
    pub kind: ReturnKind,
    /// Period end timestamps, one per return
    pub timestamps: Vec<DateTime<Utc>>,
    pub returns: Vec<f64>,
}

impl ReturnSeries {
    pub fn from_prices(series: &PriceSeries, kind: ReturnKind) -> QuantResult<Self> {
        series.validate()?;

        let returns = series
            .observations
            .windows(2)
            .map(|w| {
                let ratio = w[1].price / w[0].price;
                match kind {
                    ReturnKind::Simple => ratio - 1.0,
                    ReturnKind::Log => ratio.ln(),
                }
            })
            .collect();

        Ok(Self {
            symbol: series.symbol.clone(),
            kind,
            timestamps: series.observations[1..].iter().map(|o| o.timestamp).collect(),
            returns,
        })
    }

    pub fn simple(series: &PriceSeries) -> QuantResult<Self> {
        Self::from_prices(series, ReturnKind::Simple)
    }

    pub fn log(series: &PriceSeries) -> QuantResult<Self> {
        Self::from_prices(series, ReturnKind::Log)
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn mean(&self) -> f64 {
        self.returns.iter().sum::<f64>() / self.returns.len().max(1) as f64
    }
}

/// Mean return vector and covariance matrix of a set of assets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEstimates {
    pub symbols: Vec<String>,
    pub mean: Array1<f64>,
    pub covariance: Array2<f64>,
}

impl MarketEstimates {
    pub fn new(symbols: Vec<String>, mean: Array1<f64>, covariance: Array2<f64>) -> QuantResult<Self> {
        let k = mean.len();
        if symbols.len() != k || covariance.dim() != (k, k) {
            return Err(QuantError::invalid_argument(format!(
                "{} symbols, {} means and {:?} covariance do not agree",
                symbols.len(),
                k,
                covariance.dim()
            )));
        }
        Ok(Self {
            symbols,
            mean,
            covariance,
        })
    }

    /// Sample mean and covariance (n - 1 denominator) of aligned return series
    pub fn from_returns(series: &[ReturnSeries]) -> QuantResult<Self> {
        let first = series
            .first()
            .ok_or_else(|| QuantError::invalid_argument("no return series supplied"))?;
        let periods = first.len();
        if periods < 2 {
            return Err(QuantError::invalid_argument(
                "need at least 2 return periods to estimate covariance",
            ));
        }
        if let Some(bad) = series.iter().find(|s| s.timestamps != first.timestamps) {
            return Err(QuantError::invalid_argument(format!(
                "{} is not aligned with {}",
                bad.symbol, first.symbol
            )));
        }

        let k = series.len();
        let mut data = Array2::zeros((periods, k));
        for (j, s) in series.iter().enumerate() {
            for (t, r) in s.returns.iter().enumerate() {
                data[[t, j]] = *r;
            }
        }

        let mean = data.sum_axis(ndarray::Axis(0)) / periods as f64;
        let centered = &data - &mean;
        let covariance = centered.t().dot(&centered) / (periods as f64 - 1.0);

        Self::new(
            series.iter().map(|s| s.symbol.clone()).collect(),
            mean,
            covariance,
        )
    }

    /// Scale per-period moments to a yearly horizon
    pub fn annualized(&self, periods_per_year: f64) -> Self {
        Self {
            symbols: self.symbols.clone(),
            mean: &self.mean * periods_per_year,
            covariance: &self.covariance * periods_per_year,
        }
    }

    pub fn num_assets(&self) -> usize {
        self.mean.len()
    }

    /// Per-asset volatility sqrt(Σ_ii)
    pub fn volatilities(&self) -> Array1<f64> {
        self.covariance.diag().mapv(|v| v.max(0.0).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn series(symbol: &str, prices: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        let observations = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PriceObservation {
                timestamp: start + Duration::days(i as i64),
                price,
            })
            .collect();
        PriceSeries::new(symbol, observations).unwrap()
    }

    #[test]
    fn test_simple_and_log_returns() {
        let s = series("AAA", &[100.0, 110.0, 99.0]);
        let simple = ReturnSeries::simple(&s).unwrap();
        assert_eq!(simple.len(), 2);
        assert!((simple.returns[0] - 0.10).abs() < 1e-12);
        assert!((simple.returns[1] + 0.10).abs() < 1e-12);

        let log = ReturnSeries::log(&s).unwrap();
        assert!((log.returns[0] - 1.1_f64.ln()).abs() < 1e-12);
        assert_eq!(log.timestamps, s.timestamps()[1..].to_vec());
    }

    #[test]
    fn test_series_validation() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap();
        let obs = vec![
            PriceObservation { timestamp: start, price: 10.0 },
            PriceObservation { timestamp: start, price: 11.0 },
        ];
        assert!(PriceSeries::new("DUP", obs).is_err());

        let obs = vec![
            PriceObservation { timestamp: start, price: 10.0 },
            PriceObservation { timestamp: start + Duration::days(1), price: 0.0 },
        ];
        assert!(PriceSeries::new("ZERO", obs).is_err());

        let obs = vec![PriceObservation { timestamp: start, price: 10.0 }];
        assert!(PriceSeries::new("SHORT", obs).is_err());
    }

    #[test]
    fn test_estimates() {
        let a = ReturnSeries::simple(&series("A", &[100.0, 101.0, 103.02, 102.0])).unwrap();
        let b = ReturnSeries::simple(&series("B", &[50.0, 49.0, 49.49, 50.5])).unwrap();
        let est = MarketEstimates::from_returns(&[a.clone(), b.clone()]).unwrap();

        assert_eq!(est.num_assets(), 2);
        assert!((est.mean[0] - a.mean()).abs() < 1e-12);

        // Sample variance by hand
        let m = a.mean();
        let var_a = a.returns.iter().map(|r| (r - m).powi(2)).sum::<f64>() / 2.0;
        assert!((est.covariance[[0, 0]] - var_a).abs() < 1e-14);
        assert!((est.covariance[[0, 1]] - est.covariance[[1, 0]]).abs() < 1e-16);

        let yearly = est.annualized(TRADING_DAYS_PER_YEAR);
        assert!((yearly.mean[1] - est.mean[1] * 252.0).abs() < 1e-12);
        assert!((yearly.volatilities()[0] - (var_a * 252.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_misaligned_series() {
        let a = ReturnSeries::simple(&series("A", &[100.0, 101.0, 102.0])).unwrap();
        let b = ReturnSeries::simple(&series("B", &[50.0, 49.0, 48.0, 47.0])).unwrap();
        assert!(MarketEstimates::from_returns(&[a, b]).is_err());
        assert!(MarketEstimates::from_returns(&[]).is_err());
    }
}
