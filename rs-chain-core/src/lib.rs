//! Word-transition graph text generation library.
//!
//! This crate provides a first-order word chain including:
//! - Incremental training from whitespace-tokenized messages
//! - Weighted random walks between a start and an end sentinel
//! - Parallel corpus loading with graph merging
//! - A caller-side session that avoids regenerating training messages
//!
//! The graph keeps its nodes private; callers inspect it through
//! read-only accessors and extend it through messages only.

/// Graph, nodes, errors and generation logic.
pub mod model;

/// I/O utilities (corpus files, folder listing).
pub mod io;

pub use model::error::GraphError;
pub use model::graph::{END, Graph, GraphStats, START};
pub use model::node::{Node, NodeId};
pub use model::loader::LoadReport;
pub use model::session::{Session, SessionStats};
