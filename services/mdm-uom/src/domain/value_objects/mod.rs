//! 值对象模块

mod conversion_rate;
mod ids;
mod precision;

pub use conversion_rate::{ConversionRate, ConversionRateError};
pub use ids::{ConversionId, MaterialId, UnitId};
pub use precision::{Precision, PrecisionError};
