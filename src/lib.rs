//! hybridrag - Query Understanding & Hybrid Retrieval Fusion
//!
//! Validates and classifies natural-language questions, expands and rewrites them,
//! routes them to strategy-specific retrieval agents, and fuses vector, graph and
//! keyword results into one ranked context list. Storage backends are reached
//! through the traits in [`store`].

pub mod agents;
pub mod cli;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod pipeline;
pub mod query;
pub mod retrieval;
pub mod store;

pub use error::{RagError, Result};
