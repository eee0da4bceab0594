//! Trees extracted from undirected relation graphs.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt,
    hash::Hash,
};

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
};

use crate::BrimError;

/// A parent-to-children tree stored as a directed graph arena.
pub struct Tree<N> {
    graph: DiGraph<N, ()>,
    indices: HashMap<N, NodeIndex>,
    root: NodeIndex,
}

impl<N: Clone + Eq + Hash> Tree<N> {
    pub fn root(&self) -> &N {
        &self.graph[self.root]
    }

    pub fn contains(&self, node: &N) -> bool {
        self.indices.contains_key(node)
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Children of `node` in the order in which they were discovered.
    pub fn children(&self, node: &N) -> Vec<N> {
        let Some(&index) = self.indices.get(node) else {
            return Vec::new();
        };
        // petgraph yields the most recently added edge first.
        let mut children: Vec<_> = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .map(|child| self.graph[child].clone())
            .collect();
        children.reverse();
        children
    }

    pub fn parent(&self, node: &N) -> Option<N> {
        let index = *self.indices.get(node)?;
        self.graph
            .neighbors_directed(index, Direction::Incoming)
            .next()
            .map(|parent| self.graph[parent].clone())
    }
}

impl<N: fmt::Debug> fmt::Debug for Tree<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("root", &self.graph[self.root])
            .field("nodes", &self.graph.node_count())
            .finish()
    }
}

/// Builds a tree by breadth-first search from `root`, following
/// `neighbors`.
///
/// Neighbors that have already been expanded are skipped, so undirected
/// relations are fine. A node reached over two different paths is an
/// error.
///
/// # Errors
///
/// Returns [`BrimError::GraphCycle`] if a node is expanded twice or, when
/// `validate` is set, if a node has been recorded as a child twice.
/// Returns [`BrimError::GraphInvalid`] if the recorded nodes do not match
/// the expanded ones.
pub fn extract_tree<N, F, I>(root: N, mut neighbors: F, validate: bool) -> Result<Tree<N>, BrimError>
where
    N: Clone + Eq + Hash,
    F: FnMut(&N) -> I,
    I: IntoIterator<Item = N>,
{
    let mut graph = DiGraph::new();
    let mut indices = HashMap::new();
    let root_index = graph.add_node(root.clone());
    indices.insert(root.clone(), root_index);

    let mut expanded = HashSet::new();
    let mut recorded = 1;
    let mut queue = VecDeque::from([(root, root_index)]);
    while let Some((parent, parent_index)) = queue.pop_front() {
        if !expanded.insert(parent.clone()) {
            return Err(BrimError::GraphCycle);
        }
        for neighbor in neighbors(&parent) {
            if expanded.contains(&neighbor) {
                continue;
            }
            let child_index = *indices
                .entry(neighbor.clone())
                .or_insert_with(|| graph.add_node(neighbor.clone()));
            graph.add_edge(parent_index, child_index, ());
            recorded += 1;
            queue.push_back((neighbor, child_index));
        }
    }

    if validate {
        if recorded != graph.node_count() {
            return Err(BrimError::GraphCycle);
        }
        if recorded != expanded.len() {
            return Err(BrimError::GraphInvalid);
        }
    }
    Ok(Tree {
        graph,
        indices,
        root: root_index,
    })
}

/// All descendants of `parent`, breadth-first.
pub fn get_children_from_tree<N: Clone + Eq + Hash>(
    tree: &Tree<N>,
    parent: &N,
    include_parent: bool,
) -> Vec<N> {
    let mut result = Vec::new();
    if include_parent {
        result.push(parent.clone());
    }
    let mut queue: VecDeque<N> = tree.children(parent).into();
    while let Some(child) = queue.pop_front() {
        queue.extend(tree.children(&child));
        result.push(child);
    }
    result
}
