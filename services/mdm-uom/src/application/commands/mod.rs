//! Commands module

pub mod conversion_commands;
pub mod unit_commands;

pub use conversion_commands::*;
pub use unit_commands::*;
