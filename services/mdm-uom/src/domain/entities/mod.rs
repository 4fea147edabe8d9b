//! 实体模块

mod unit;
mod unit_conversion;

pub use unit::{NewUnit, Unit, UnitError};
pub use unit_conversion::{
    ConversionArc, NewUnitConversion, UnitConversion, UnitConversionError, UnitPair,
};
