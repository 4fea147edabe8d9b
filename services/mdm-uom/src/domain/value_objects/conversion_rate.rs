//! 换算率值对象

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 换算率错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionRateError {
    #[error("换算率必须大于 0，当前为 {0}")]
    NotPositive(f64),
    #[error("换算率必须是有限数值")]
    NotFinite,
}

/// 换算率
///
/// `1 源单位 = rate × 目标单位`，恒为有限正数
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ConversionRate(f64);

impl ConversionRate {
    pub fn new(rate: f64) -> Result<Self, ConversionRateError> {
        if !rate.is_finite() {
            return Err(ConversionRateError::NotFinite);
        }
        if rate <= 0.0 {
            return Err(ConversionRateError::NotPositive(rate));
        }
        Ok(Self(rate))
    }

    /// 单位一致的换算（1:1）
    pub fn identity() -> Self {
        Self(1.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// 倒数换算率
    pub fn reciprocal(&self) -> Self {
        Self(1.0 / self.0)
    }
}

impl TryFrom<f64> for ConversionRate {
    type Error = ConversionRateError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConversionRate> for f64 {
    fn from(rate: ConversionRate) -> Self {
        rate.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_rate() {
        let rate = ConversionRate::new(12.0).unwrap();
        assert_eq!(rate.value(), 12.0);
        assert!((rate.reciprocal().value() - 1.0 / 12.0).abs() < f64::EPSILON);
        assert_eq!(ConversionRate::identity().value(), 1.0);
    }

    #[test]
    fn test_rejects_non_positive() {
        assert_eq!(
            ConversionRate::new(0.0),
            Err(ConversionRateError::NotPositive(0.0))
        );
        assert!(ConversionRate::new(-3.0).is_err());
        assert_eq!(
            ConversionRate::new(f64::NAN),
            Err(ConversionRateError::NotFinite)
        );
        assert_eq!(
            ConversionRate::new(f64::INFINITY),
            Err(ConversionRateError::NotFinite)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let rate: ConversionRate = serde_json::from_str("2.5").unwrap();
        assert_eq!(rate.value(), 2.5);
        assert!(serde_json::from_str::<ConversionRate>("-1").is_err());
    }
}
