//! Relation graph accumulated per document
//!
//! Nodes are document token positions (the first token of an entity
//! span), edges carry a [`RelationType`]. Linking is idempotent: an edge
//! with the same (source, target, type) is stored at most once.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

// ============================================================================
// Relation Types
// ============================================================================

/// Relation types recorded between entity mentions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    /// Upper term subsumes (generalizes) the lower term
    Subsum,
}

impl RelationType {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subsum => "SUBSUM",
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RelationType {
    type Err = crate::PpaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SUBSUM" => Ok(Self::Subsum),
            _ => Err(crate::PpaError::InvalidPattern(format!(
                "unknown relation type: {s}"
            ))),
        }
    }
}

// ============================================================================
// Relation Graph
// ============================================================================

/// A directed, typed edge between two entity representative tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RelationEdge {
    /// Document token position of the upper entity
    pub source: usize,
    /// Document token position of the lower entity
    pub target: usize,
    pub relation: RelationType,
}

/// Deduplicating multigraph of relations between entity mentions
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    graph: DiGraph<usize, RelationType>,
    nodes: HashMap<usize, NodeIndex>,
    seen: HashSet<RelationEdge>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `source -> target` unless an identical edge already exists.
    ///
    /// Returns `true` when a new edge was inserted.
    pub fn link(&mut self, source: usize, target: usize, relation: RelationType) -> bool {
        let edge = RelationEdge {
            source,
            target,
            relation,
        };
        if !self.seen.insert(edge) {
            return false;
        }

        let from = self.node(source);
        let to = self.node(target);
        self.graph.add_edge(from, to, relation);
        true
    }

    fn node(&mut self, token: usize) -> NodeIndex {
        let graph = &mut self.graph;
        *self
            .nodes
            .entry(token)
            .or_insert_with(|| graph.add_node(token))
    }

    pub fn contains(&self, source: usize, target: usize, relation: RelationType) -> bool {
        self.seen.contains(&RelationEdge {
            source,
            target,
            relation,
        })
    }

    /// Number of distinct edges
    pub fn len(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    /// All edges, in insertion order
    pub fn edges(&self) -> Vec<RelationEdge> {
        self.graph
            .edge_references()
            .map(|e| RelationEdge {
                source: self.graph[e.source()],
                target: self.graph[e.target()],
                relation: *e.weight(),
            })
            .collect()
    }

    /// Edges leaving `source`
    pub fn edges_from(&self, source: usize) -> Vec<RelationEdge> {
        self.edges_directed(source, Direction::Outgoing)
    }

    /// Edges entering `target`
    pub fn edges_to(&self, target: usize) -> Vec<RelationEdge> {
        self.edges_directed(target, Direction::Incoming)
    }

    fn edges_directed(&self, token: usize, direction: Direction) -> Vec<RelationEdge> {
        let Some(&index) = self.nodes.get(&token) else {
            return Vec::new();
        };
        let mut edges: Vec<RelationEdge> = self
            .graph
            .edges_directed(index, direction)
            .map(|e| RelationEdge {
                source: self.graph[e.source()],
                target: self.graph[e.target()],
                relation: *e.weight(),
            })
            .collect();
        edges.sort();
        edges
    }

    /// Token positions that appear as a source or target
    pub fn nodes(&self) -> Vec<usize> {
        let mut nodes: Vec<usize> = self.nodes.keys().copied().collect();
        nodes.sort_unstable();
        nodes
    }
}

// ============================================================================
// Tests
// ============================================================================
