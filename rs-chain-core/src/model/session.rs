use std::collections::HashSet;
use std::path::Path;

use log::{debug, info};
use rand::Rng;
use serde::Serialize;

use crate::io::get_filename;
use super::error::GraphError;
use super::graph::Graph;
use super::loader::{LoadReport, build_graph};

/// Caller-side wrapper around a `Graph`.
///
/// The graph itself never retries a walk. A `Session` remembers the training
/// messages so that it can regenerate when a walk merely reproduces one of
/// them, and keeps track of the corpora merged into it.
#[derive(Debug, Default)]
pub struct Session {
	graph: Graph,
	/// Training messages, lowercased, tokens joined by a single space.
	messages: HashSet<String>,
	corpus_names: Vec<String>,
}

/// Size summary exposed by the binaries.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionStats {
	pub nodes: usize,
	pub edges: usize,
	pub messages: usize,
}

/// Collapses whitespace the same way generation joins words, then lowercases.
fn normalize(message: &str) -> String {
	message.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl Session {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	/// Names of the corpora loaded so far, in loading order.
	pub fn corpus_names(&self) -> &[String] {
		&self.corpus_names
	}

	pub fn stats(&self) -> SessionStats {
		let graph = self.graph.stats();
		SessionStats {
			nodes: graph.nodes,
			edges: graph.edges,
			messages: self.messages.len(),
		}
	}

	/// Ingests one message and remembers it.
	///
	/// # Errors
	/// Returns `EmptyMessage` if the message has no token; nothing is recorded.
	pub fn add_message(&mut self, message: &str) -> Result<(), GraphError> {
		self.graph.add_message(message)?;
		self.messages.insert(normalize(message));
		Ok(())
	}

	/// Ingests every non-empty line of `lines` in parallel.
	pub fn add_lines(&mut self, lines: Vec<String>) -> LoadReport {
		self.messages.extend(lines.iter().map(|line| normalize(line)).filter(|m| !m.is_empty()));
		let (graph, report) = build_graph(lines);
		self.graph.merge(&graph);
		report
	}

	/// Loads a corpus file and merges it into the session.
	///
	/// The corpus name is the file stem.
	///
	/// # Errors
	/// Returns an error if the file cannot be read.
	pub fn load_corpus<P: AsRef<Path>>(&mut self, filepath: P) -> Result<LoadReport, Box<dyn std::error::Error>> {
		let name = get_filename(&filepath)?;
		let lines = crate::io::read_file(&filepath)?;
		let report = self.add_lines(lines);
		info!(
			"loaded {name}: {} messages, {} empty lines skipped, {} words",
			report.ingested,
			report.skipped,
			self.graph.len()
		);
		self.corpus_names.push(name);
		Ok(report)
	}

	/// Drops the graph, the remembered messages and the corpus names.
	pub fn reset(&mut self) {
		*self = Self::default();
	}

	/// Returns `true` if `message` was part of the training data (case-insensitive).
	pub fn is_known(&self, message: &str) -> bool {
		self.messages.contains(&normalize(message))
	}

	/// Generates a message using the thread-local random generator.
	///
	/// See `generate_with`.
	pub fn generate(&self, nb_try: usize) -> Result<String, GraphError> {
		self.generate_with(&mut rand::rng(), nb_try)
	}

	/// Generates a message, avoiding training messages if possible.
	///
	/// # Behavior
	/// - Walks the graph once.
	/// - While the result is a known message and `nb_try` attempts remain,
	///   walks again.
	/// - Returns the first new message or the last attempt.
	///
	/// # Errors
	/// Any walk error is returned as is.
	pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R, mut nb_try: usize) -> Result<String, GraphError> {
		let mut message = self.graph.generate_with(rng)?;
		while nb_try > 0 && self.is_known(&message) {
			debug!("{message:?} already known, {nb_try} tries left");
			message = self.graph.generate_with(rng)?;
			nb_try -= 1;
		}
		Ok(message)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;
	use std::fs;

	#[test]
	fn messages_are_remembered_normalized() {
		let mut session = Session::new();
		session.add_message("  Hello \t world ").unwrap();

		assert!(session.is_known("hello world"));
		assert!(session.is_known("HELLO  World"));
		assert!(!session.is_known("hello"));
		assert_eq!(session.stats().messages, 1);

		session.add_message("hello WORLD").unwrap();
		assert_eq!(session.stats().messages, 1);
	}

	#[test]
	fn empty_message_is_not_remembered() {
		let mut session = Session::new();
		assert!(matches!(session.add_message(" "), Err(GraphError::EmptyMessage(_))));
		assert_eq!(session.stats(), SessionStats { nodes: 0, edges: 0, messages: 0 });
	}

	#[test]
	fn retries_avoid_known_messages() {
		// Every walk of this graph spells a training message
		let mut session = Session::new();
		session.add_message("hello world").unwrap();
		session.add_message("bye moon").unwrap();
		session.add_message("hello moon").unwrap();
		session.add_message("bye world").unwrap();
		session.add_message("hi there").unwrap();

		let mut rng = StdRng::seed_from_u64(9);
		let mut novel = 0;
		for _ in 0..200 {
			let message = session.generate_with(&mut rng, 50).unwrap();
			if !session.is_known(&message) {
				novel += 1;
			}
		}
		assert_eq!(novel, 0);
	}

	#[test]
	fn retries_find_new_message() {
		let mut session = Session::new();
		session.add_message("a b c").unwrap();
		session.add_message("x b y").unwrap();

		let mut rng = StdRng::seed_from_u64(5);
		for _ in 0..100 {
			let message = session.generate_with(&mut rng, 100).unwrap();
			assert!(message == "a b y" || message == "x b c", "got {message}");
		}
	}

	#[test]
	fn no_retry_without_tries() {
		let mut session = Session::new();
		session.add_message("only one").unwrap();
		assert_eq!(session.generate(0).unwrap(), "only one");
		assert_eq!(session.generate(10).unwrap(), "only one");
	}

	#[test]
	fn missing_corpus_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let mut session = Session::new();
		assert!(session.load_corpus(dir.path().join("missing.txt")).is_err());
		assert!(session.corpus_names().is_empty());
	}

	#[test]
	fn empty_session_cannot_generate() {
		let session = Session::new();
		assert!(matches!(session.generate(3), Err(GraphError::NoNeighbours { .. })));
	}

	#[test]
	fn load_and_reset() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("animals.txt");
		fs::write(&path, "the cat sleeps\nthe dog barks\n").unwrap();

		let mut session = Session::new();
		let report = session.load_corpus(&path).unwrap();
		assert_eq!(report.ingested, 2);
		assert_eq!(session.corpus_names(), ["animals".to_owned()]);
		assert!(session.is_known("the dog barks"));
		assert_eq!(session.graph().node("the").unwrap().weight(), 2);

		session.reset();
		assert!(session.graph().is_empty());
		assert!(session.corpus_names().is_empty());
		assert_eq!(session.stats().messages, 0);
	}
}
