//! 领域层
//!
//! 包含单位与换算关系实体、值对象、枚举、仓储接口、换算图和校验服务

pub mod entities;
pub mod enums;
pub mod graph;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use enums::*;
pub use repositories::*;
pub use value_objects::*;
