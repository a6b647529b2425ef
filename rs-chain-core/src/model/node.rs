use std::collections::BTreeSet;

use rand::Rng;

use super::error::GraphError;

/// Stable handle to a node stored in a `Graph` arena.
///
/// Ids are never reused: nodes live as long as the graph that owns them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// A vertex of the word-transition graph.
///
/// A `Node` stands for one distinct token (or a sentinel when `word` is empty)
/// and stores the set of words observed right after it.
///
/// ## Invariants
/// - `neighbours` never holds the same id twice
/// - The strength of an edge is the *destination's* weight, edges carry no count
#[derive(Clone, Debug)]
pub struct Node {
	/// Token text, empty for sentinels.
	word: String,
	/// Number of times the token was observed.
	weight: usize,
	/// Outgoing transitions, iterated in id order.
	neighbours: BTreeSet<NodeId>,
}

impl Node {
	/// Creates a node without neighbours.
	pub(crate) fn new(word: &str, weight: usize) -> Self {
		Self {
			word: word.to_owned(),
			weight,
			neighbours: BTreeSet::new(),
		}
	}

	pub fn word(&self) -> &str {
		&self.word
	}

	pub fn weight(&self) -> usize {
		self.weight
	}

	/// Iterates over outgoing transitions in a stable order.
	pub fn neighbours(&self) -> impl Iterator<Item = NodeId> + '_ {
		self.neighbours.iter().copied()
	}

	pub fn neighbour_count(&self) -> usize {
		self.neighbours.len()
	}

	pub fn has_neighbour(&self, id: NodeId) -> bool {
		self.neighbours.contains(&id)
	}

	/// Records a transition toward `id`.
	///
	/// Returns `false` when the edge already existed (nothing changes).
	pub(crate) fn add_neighbour(&mut self, id: NodeId) -> bool {
		self.neighbours.insert(id)
	}

	pub(crate) fn add_weight(&mut self, amount: usize) {
		self.weight += amount;
	}

	/// Picks the next node using weighted random sampling.
	///
	/// The probability of selecting a neighbour is its weight divided by the
	/// sum of all neighbour weights. `arena` resolves ids to nodes.
	///
	/// This method performs:
	/// - an O(n) pass to sum the weights
	/// - a cumulative subtraction to select a bucket
	///
	/// # Errors
	/// - `NoNeighbours` if the node has no outgoing transition
	/// - `RandomWalkFailure` if the weights sum to zero
	pub(crate) fn choose_neighbour<R: Rng + ?Sized>(&self, arena: &[Node], rng: &mut R) -> Result<NodeId, GraphError> {
		if self.neighbours.is_empty() {
			return Err(GraphError::NoNeighbours { word: self.word.clone() });
		}

		let total: usize = self.neighbours.iter().map(|id| arena[id.0].weight).sum();
		if total == 0 {
			return Err(GraphError::RandomWalkFailure { word: self.word.clone(), total });
		}

		let mut r = rng.random_range(0..total);
		for id in &self.neighbours {
			let weight = arena[id.0].weight;
			if r < weight {
				return Ok(*id);
			}
			r -= weight;
		}

		// Unreachable while `total` matches the loop above
		Err(GraphError::RandomWalkFailure { word: self.word.clone(), total })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn arena(weights: &[usize]) -> Vec<Node> {
		weights.iter().enumerate().map(|(i, w)| Node::new(&format!("w{i}"), *w)).collect()
	}

	#[test]
	fn add_neighbour_is_idempotent() {
		let mut node = Node::new("a", 1);
		assert!(node.add_neighbour(NodeId(3)));
		assert!(!node.add_neighbour(NodeId(3)));
		assert_eq!(node.neighbour_count(), 1);
		assert!(node.has_neighbour(NodeId(3)));
	}

	#[test]
	fn choose_without_neighbours_fails() {
		let node = Node::new("lonely", 1);
		let mut rng = StdRng::seed_from_u64(1);
		let err = node.choose_neighbour(&[], &mut rng).unwrap_err();
		assert!(matches!(err, GraphError::NoNeighbours { ref word } if word == "lonely"));
	}

	#[test]
	fn choose_with_zero_total_fails() {
		let arena = arena(&[0, 0]);
		let mut node = Node::new("x", 1);
		node.add_neighbour(NodeId(0));
		node.add_neighbour(NodeId(1));
		let mut rng = StdRng::seed_from_u64(1);
		let err = node.choose_neighbour(&arena, &mut rng).unwrap_err();
		assert!(matches!(err, GraphError::RandomWalkFailure { total: 0, .. }));
	}

	#[test]
	fn zero_weight_neighbour_is_never_chosen() {
		let arena = arena(&[0, 5]);
		let mut node = Node::new("x", 1);
		node.add_neighbour(NodeId(0));
		node.add_neighbour(NodeId(1));
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..1_000 {
			assert_eq!(node.choose_neighbour(&arena, &mut rng).unwrap(), NodeId(1));
		}
	}

	#[test]
	fn choice_follows_weights() {
		let arena = arena(&[1, 3]);
		let mut node = Node::new("x", 1);
		node.add_neighbour(NodeId(0));
		node.add_neighbour(NodeId(1));

		let mut rng = StdRng::seed_from_u64(42);
		let draws = 20_000;
		let heavy = (0..draws)
			.filter(|_| node.choose_neighbour(&arena, &mut rng).unwrap() == NodeId(1))
			.count();
		let percentage = heavy as f64 / draws as f64 * 100.0;
		assert!((percentage - 75.0).abs() < 2.0, "got {percentage}%");
	}
}
