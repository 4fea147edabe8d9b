//! Application layer

pub mod commands;
pub mod dto;
pub mod handler;
pub mod queries;
pub mod views;

pub use commands::*;
pub use handler::ServiceHandler;
pub use queries::*;
pub use views::*;
