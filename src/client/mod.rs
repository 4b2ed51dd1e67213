//! Provider clients, rate limiting and token counting.

mod cohere;
mod news;
mod openai;
mod provider;
mod rate_limiter;
mod tokens;

#[cfg(test)]
pub(crate) mod mock;

pub use cohere::*;
pub use news::*;
pub use openai::*;
pub use provider::*;
pub use rate_limiter::*;
pub use tokens::*;
