//! Queries module

pub mod conversion_queries;
pub mod graph_queries;
pub mod unit_queries;

pub use conversion_queries::*;
pub use graph_queries::*;
pub use unit_queries::*;
