//! Capability traits consumed by the history layer.

mod dialect;
mod entity;
mod executor;
mod translator;

pub use dialect::*;
pub use entity::*;
pub use executor::*;
pub use translator::*;
