//! Top-level module for the word graph.
//!
//! - Graph vertices (`Node`) and their weighted neighbour selection
//! - The graph itself (`Graph`): ingestion, generation, merging
//! - Parallel construction from corpus lines (`loader`)
//! - Caller-side retry policy and corpus bookkeeping (`Session`)

/// Errors raised by ingestion and generation.
pub mod error;

/// Graph vertex holding a word, its weight and its outgoing transitions.
///
/// Supports weighted random sampling among neighbours.
pub mod node;

/// Arena of nodes with the `START` and `END` sentinels.
///
/// Handles message ingestion, random walks and merging.
pub mod graph;

/// Multithreaded graph construction from a list of messages.
pub mod loader;

/// Wrapper used by the binaries: remembers training messages,
/// retries walks that reproduce them, loads corpus files.
pub mod session;
