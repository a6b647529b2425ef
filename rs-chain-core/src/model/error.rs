use thiserror::Error;

/// Errors raised while training or walking a `Graph`.
///
/// None of them is fatal: the caller decides whether to skip, retry or report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
	/// The message contained no token once split on whitespace.
	#[error("empty message {0:?}")]
	EmptyMessage(String),

	/// A node reached during a walk has no outgoing transition.
	#[error("node {word:?} has no neighbours")]
	NoNeighbours { word: String },

	/// The neighbour weights of a node do not allow a random pick.
	#[error("failed to choose a neighbour of node {word:?} (total weight {total})")]
	RandomWalkFailure { word: String, total: usize },
}
