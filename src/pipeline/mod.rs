//! Pipeline module - per-article summarization, batching and reporting.

mod batch;
mod report;
mod summarizer;

pub use batch::*;
pub use report::*;
pub use summarizer::*;
