use std::collections::HashMap;

use log::debug;
use rand::Rng;
use serde::Serialize;

use super::error::GraphError;
use super::node::{Node, NodeId};

/// Arena slot of the walk origin.
pub const START: NodeId = NodeId(0);
/// Arena slot of the walk terminus.
pub const END: NodeId = NodeId(1);

/// Weight given to both sentinels.
///
/// `END` competes with real successors through this weight: a word followed
/// by two distinct words and the end of a message ends the walk with
/// probability `1 / (1 + w1 + w2)`.
pub const SENTINEL_WEIGHT: usize = 1;

/// Directed word-transition graph.
///
/// The graph owns every `Node` in an arena. Real tokens are indexed by their
/// text, the two sentinels (`START`, `END`) live at fixed ids and carry an
/// empty word.
///
/// # Responsibilities
/// - Extend the graph with training messages (`add_message`)
/// - Produce new messages through a weighted random walk (`generate`)
/// - Combine graphs built independently (`merge`)
///
/// # Invariants
/// - `START` and `END` are distinct nodes, never present in `index`
/// - Every real node has a weight >= 1 and at least one outgoing edge
/// - A real node's weight is the number of times its token was ingested
#[derive(Clone, Debug)]
pub struct Graph {
	nodes: Vec<Node>,
	index: HashMap<String, NodeId>,
}

/// Size summary of a graph.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphStats {
	/// Distinct real tokens.
	pub nodes: usize,
	/// Transitions, including those leaving `START` and reaching `END`.
	pub edges: usize,
}

impl Default for Graph {
	fn default() -> Self {
		Self::new()
	}
}

impl Graph {
	/// Creates a graph holding only the two sentinels.
	pub fn new() -> Self {
		Self {
			nodes: vec![Node::new("", SENTINEL_WEIGHT), Node::new("", SENTINEL_WEIGHT)],
			index: HashMap::new(),
		}
	}

	pub fn start(&self) -> &Node {
		&self.nodes[START.0]
	}

	pub fn end(&self) -> &Node {
		&self.nodes[END.0]
	}

	/// Looks up the node of a real token.
	pub fn node(&self, word: &str) -> Option<&Node> {
		self.index.get(word).map(|id| &self.nodes[id.0])
	}

	/// Looks up the id of a real token.
	pub fn id_of(&self, word: &str) -> Option<NodeId> {
		self.index.get(word).copied()
	}

	/// Resolves an id returned by this graph.
	pub fn get(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(id.0)
	}

	/// Number of distinct real tokens.
	pub fn len(&self) -> usize {
		self.index.len()
	}

	/// `true` until a message has been ingested.
	pub fn is_empty(&self) -> bool {
		self.index.is_empty()
	}

	pub fn edge_count(&self) -> usize {
		self.nodes.iter().map(Node::neighbour_count).sum()
	}

	/// Returns `true` if there is a transition `from` -> `to`.
	pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
		self.get(from).is_some_and(|node| node.has_neighbour(to))
	}

	pub fn stats(&self) -> GraphStats {
		GraphStats {
			nodes: self.len(),
			edges: self.edge_count(),
		}
	}

	/// Returns the id of `word`, creating a zero-weight node if needed.
	fn get_or_create(&mut self, word: &str) -> NodeId {
		if let Some(id) = self.index.get(word) {
			return *id;
		}
		let id = NodeId(self.nodes.len());
		self.nodes.push(Node::new(word, 0));
		self.index.insert(word.to_owned(), id);
		id
	}

	/// Adds a training message to the graph.
	///
	/// The message is split on whitespace. Each token gets an edge from the
	/// previous token (from `START` for the first one) and its weight is
	/// increased by one. The last token is linked to `END`.
	///
	/// # Errors
	/// Returns `EmptyMessage` if the message has no token. The graph is left
	/// untouched in that case.
	pub fn add_message(&mut self, message: &str) -> Result<(), GraphError> {
		let tokens: Vec<&str> = message.split_whitespace().collect();
		if tokens.is_empty() {
			return Err(GraphError::EmptyMessage(message.to_owned()));
		}

		let mut previous = START;
		for token in &tokens {
			let id = self.get_or_create(token);
			self.nodes[previous.0].add_neighbour(id);
			self.nodes[id.0].add_weight(1);
			previous = id;
		}
		self.nodes[previous.0].add_neighbour(END);

		debug!("ingested {} tokens, graph has {} nodes", tokens.len(), self.len());
		Ok(())
	}

	/// Generates a message using the thread-local random generator.
	///
	/// See `generate_with`.
	pub fn generate(&self) -> Result<String, GraphError> {
		self.generate_with(&mut rand::rng())
	}

	/// Generates a message by walking from `START` to `END`.
	///
	/// At each step the next node is picked among the current node's
	/// neighbours with a probability proportional to their weight. Visited
	/// words are joined with a single space; `END` adds nothing.
	///
	/// The walk may loop through cycles, its length is unbounded but it ends
	/// with probability 1 because every real node can reach `END`.
	///
	/// # Errors
	/// - `NoNeighbours` if the graph is empty (or a node is dangling)
	/// - `RandomWalkFailure` if a node's neighbour weights sum to zero
	pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, GraphError> {
		let mut message = String::new();
		let mut current = START;
		let mut steps = 0usize;

		loop {
			current = self.nodes[current.0].choose_neighbour(&self.nodes, rng)?;
			if current == END {
				break;
			}
			if !message.is_empty() {
				message.push(' ');
			}
			message.push_str(self.nodes[current.0].word());
			steps += 1;
		}

		debug!("walk reached the end after {steps} words");
		Ok(message)
	}

	/// Merges another graph into this one.
	///
	/// Weights of shared tokens are summed and edge sets are united, so the
	/// result is the same as ingesting the messages of both graphs into a
	/// single one, in any order. Sentinels map onto sentinels.
	///
	/// This is intended for parallel learning, where partial graphs are built
	/// on separate threads and combined afterwards.
	pub fn merge(&mut self, other: &Self) {
		let mut mapping: Vec<NodeId> = Vec::with_capacity(other.nodes.len());
		for (position, node) in other.nodes.iter().enumerate() {
			let id = NodeId(position);
			if id == START || id == END {
				mapping.push(id);
				continue;
			}
			let local = self.get_or_create(node.word());
			self.nodes[local.0].add_weight(node.weight());
			mapping.push(local);
		}

		for (position, node) in other.nodes.iter().enumerate() {
			let from = mapping[position];
			for neighbour in node.neighbours() {
				self.nodes[from.0].add_neighbour(mapping[neighbour.0]);
			}
		}
	}
}
