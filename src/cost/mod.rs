//! Token/dollar cost accounting.

mod pricing;
mod tracker;

pub use pricing::*;
pub use tracker::*;
