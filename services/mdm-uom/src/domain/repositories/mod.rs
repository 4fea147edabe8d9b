//! 仓储接口模块

mod conversion_repository;
mod unit_repository;

pub use conversion_repository::ConversionRepository;
pub use unit_repository::UnitRepository;
