//! Core data models for newsbrief.

mod article;
mod config;
mod error;

pub use article::*;
pub use config::*;
pub use error::*;
