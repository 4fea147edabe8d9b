//! 换算图
//!
//! 按所有者和物料范围从换算关系快照构建，提供路径查找与环路检测

mod builder;
mod cycle;
mod path;

pub use builder::{ConversionGraph, ConversionGraphFactory, GraphLimits, GraphScope};
pub use cycle::{ConversionCycle, CycleConsistency, CycleReport, is_consistent_product};
pub use path::ConversionPath;

#[cfg(test)]
pub(crate) mod test_support;
