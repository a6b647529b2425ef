use std::sync::mpsc;
use std::thread;

use log::warn;
use serde::Serialize;

use super::error::GraphError;
use super::graph::Graph;

/// Outcome of a corpus load.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
	/// Lines added to the graph.
	pub ingested: usize,
	/// Lines without any token.
	pub skipped: usize,
}

impl LoadReport {
	fn merge(&mut self, other: &Self) {
		self.ingested += other.ingested;
		self.skipped += other.skipped;
	}
}

/// Splits messages into chunks, builds partial graphs in parallel and
/// merges them into a single graph.
///
/// # Behavior
/// - Splits input lines into chunks (based on CPU cores * factor).
/// - Spawns threads, each one owning the partial graph of its chunk.
/// - Merges all partial graphs sequentially on the calling thread.
///
/// # Notes
/// - Uses MPSC channels to collect graphs from threads.
/// - Lines without tokens are skipped and counted in the report.
/// - The result does not depend on how lines were split, since merging
///   is equivalent to sequential ingestion.
pub fn build_graph(lines: Vec<String>) -> (Graph, LoadReport) {
	let mut final_graph = Graph::new();
	let mut final_report = LoadReport::default();
	if lines.is_empty() {
		return (final_graph, final_report);
	}

	let cpus = num_cpus::get();
	let factor = 8;
	let chunks = cpus * factor;
	let chunk_size = lines.len().div_ceil(chunks).max(1);

	let (tx, rx) = mpsc::channel();
	for chunk in lines.chunks(chunk_size) {
		let tx = tx.clone();
		let chunk: Vec<String> = chunk.to_vec();

		thread::spawn(move || {
			let mut partial_graph = Graph::new();
			let mut report = LoadReport::default();
			for message in &chunk {
				match partial_graph.add_message(message) {
					Ok(()) => report.ingested += 1,
					Err(GraphError::EmptyMessage(_)) => report.skipped += 1,
					Err(e) => warn!("unexpected error while ingesting {message:?}: {e}"),
				}
			}
			if tx.send((partial_graph, report)).is_err() {
				warn!("partial graph dropped, receiver is gone");
			}
		});
	}
	drop(tx);

	for (partial_graph, report) in rx.iter() {
		final_graph.merge(&partial_graph);
		final_report.merge(&report);
	}

	if final_report.skipped > 0 {
		warn!("{} empty lines skipped", final_report.skipped);
	}

	(final_graph, final_report)
}
