//! 换算精度值对象

use domain_core::MAX_DECIMAL_PLACES;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("精度必须在 0 到 {max} 位小数之间，当前为 {value}")]
pub struct PrecisionError {
    pub value: i64,
    pub max: u8,
}

/// 换算结果保留的小数位数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Precision(u8);

impl Precision {
    pub const DEFAULT: Precision = Precision(2);

    pub fn new(places: i64) -> Result<Self, PrecisionError> {
        if !(0..=i64::from(MAX_DECIMAL_PLACES)).contains(&places) {
            return Err(PrecisionError {
                value: places,
                max: MAX_DECIMAL_PLACES,
            });
        }
        Ok(Self(places as u8))
    }

    pub fn places(&self) -> u8 {
        self.0
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for Precision {
    type Error = PrecisionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Precision> for u8 {
    fn from(precision: Precision) -> Self {
        precision.0
    }
}
