use analyst_core::LineFit;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Significant digits kept in numeric answers.
pub const ANSWER_SIGNIFICANT_DIGITS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub n: usize,
}

impl LinearRegression {
    pub fn line(&self) -> LineFit {
        LineFit {
            slope: self.slope,
            intercept: self.intercept,
        }
    }
}

pub struct StatisticalAnalyzer;

impl StatisticalAnalyzer {
    /// Pearson correlation coefficient of paired samples.
    ///
    /// Returns `None` for mismatched lengths, fewer than two pairs or a
    /// constant sample, where the coefficient is undefined.
    pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
        if x.len() != y.len() || x.len() < 2 {
            return None;
        }

        let sx = x.std_dev();
        let sy = y.std_dev();
        if !(sx > 0.0 && sy > 0.0) {
            return None;
        }

        let r = x.covariance(y) / (sx * sy);
        // Guard against rounding pushing |r| past 1.
        Some(r.clamp(-1.0, 1.0)).filter(|r| r.is_finite())
    }

    /// Ordinary least-squares fit of `y` on `x`.
    pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearRegression> {
        if x.len() != y.len() || x.len() < 2 {
            return None;
        }

        let var_x = x.variance();
        if !(var_x > 0.0) {
            return None;
        }

        let slope = x.covariance(y) / var_x;
        let intercept = y.mean() - slope * x.mean();
        let r_squared = Self::pearson_correlation(x, y)
            .map(|r| r * r)
            .unwrap_or(0.0);

        if !slope.is_finite() || !intercept.is_finite() {
            return None;
        }

        Some(LinearRegression {
            slope,
            intercept,
            r_squared,
            n: x.len(),
        })
    }
}

/// Round to `digits` significant digits.
///
/// Goes through `Decimal` so that results print without binary noise
/// (`0.4857823` becomes `0.485782`, not `0.48578200000000004`).
pub fn round_significant(value: f64, digits: u32) -> f64 {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return value;
    }

    Decimal::from_f64(value)
        .and_then(|d| d.round_sf(digits))
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| {
            let magnitude = value.abs().log10().floor() as i32;
            let factor = 10f64.powi(digits as i32 - 1 - magnitude);
            (value * factor).round() / factor
        })
}

/// Round to the precision used for answers.
pub fn round_answer(value: f64) -> f64 {
    round_significant(value, ANSWER_SIGNIFICANT_DIGITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_significant_basic() {
        assert_eq!(round_significant(0.48578234, 6), 0.485782);
        assert_eq!(round_significant(123456789.0, 3), 123000000.0);
        assert_eq!(round_significant(-0.000123456789, 4), -0.0001235);
    }

    #[test]
    fn test_round_significant_passthrough() {
        assert_eq!(round_significant(0.0, 6), 0.0);
        assert!(round_significant(f64::NAN, 6).is_nan());
        assert_eq!(round_significant(5.0, 6), 5.0);
    }
}
