//! 领域服务

mod conversion_validator;

pub use conversion_validator::*;
