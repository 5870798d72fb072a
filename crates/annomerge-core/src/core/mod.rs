//! Annomerge Core Engine
//!
//! Classification, decoding and merging of annotation pipeline outputs.

pub mod decoders;
pub mod ingest;
pub mod media;
pub mod settings;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
mod tests_scenarios;
