//! Data models for the billing relay

mod alarm;
mod response;

pub use alarm::*;
pub use response::*;
