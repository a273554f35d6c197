//! Coordination chains
//!
//! Groups the tokens of a sentence that are connected through `conj`
//! edges, in either direction and transitively. Built once per sentence
//! and queried for every match in it.

use std::collections::VecDeque;

use ppa_core::DependencyGraph;

/// Dependency label linking a conjunct to the first member of its chain
pub const CONJ_LABEL: &str = "conj";

/// Conjunct groups of one sentence
#[derive(Debug, Clone)]
pub struct CoordinationIndex {
    /// Group id per token
    group: Vec<usize>,
    /// Members per group, in linear order
    members: Vec<Vec<usize>>,
}

impl CoordinationIndex {
    pub fn new(graph: &DependencyGraph) -> Self {
        let len = graph.len();

        let mut adjacency = vec![Vec::new(); len];
        for token in graph.tokens() {
            if token.dependency_label != CONJ_LABEL {
                continue;
            }
            if let Some(head) = graph.head(token.index) {
                adjacency[token.index].push(head);
                adjacency[head].push(token.index);
            }
        }

        let mut group = vec![usize::MAX; len];
        let mut members = Vec::new();
        for start in 0..len {
            if group[start] != usize::MAX {
                continue;
            }
            let id = members.len();
            let mut chain = Vec::new();
            let mut queue = VecDeque::from([start]);
            group[start] = id;
            while let Some(token) = queue.pop_front() {
                chain.push(token);
                for &next in &adjacency[token] {
                    if group[next] == usize::MAX {
                        group[next] = id;
                        queue.push_back(next);
                    }
                }
            }
            chain.sort_unstable();
            members.push(chain);
        }

        Self { group, members }
    }

    /// All tokens coordinated with `token`, itself included
    pub fn conjuncts(&self, token: usize) -> &[usize] {
        self.group
            .get(token)
            .and_then(|&id| self.members.get(id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppa_core::{PartOfSpeech, Token};

    fn graph(words: &[(&str, PartOfSpeech, &str, usize)]) -> DependencyGraph {
        DependencyGraph::new(
            words
                .iter()
                .enumerate()
                .map(|(i, (text, pos, dep, head))| Token::new(i, *text, *text, *pos, *dep, *head))
                .collect(),
        )
    }

    #[test]
    fn test_chained_conjuncts() {
        // "names , emails , and addresses" with each conjunct hanging off the previous one
        let g = graph(&[
            ("names", PartOfSpeech::Noun, "ROOT", 0),
            (",", PartOfSpeech::Punct, "punct", 0),
            ("emails", PartOfSpeech::Noun, "conj", 0),
            (",", PartOfSpeech::Punct, "punct", 2),
            ("and", PartOfSpeech::Cconj, "cc", 2),
            ("addresses", PartOfSpeech::Noun, "conj", 2),
        ]);
        let index = CoordinationIndex::new(&g);
        assert_eq!(index.conjuncts(0), &[0, 2, 5]);
        assert_eq!(index.conjuncts(5), &[0, 2, 5]);
        assert_eq!(index.conjuncts(1), &[1]);
        assert!(index.conjuncts(17).is_empty());
    }

    #[test]
    fn test_flat_conjuncts() {
        // all conjuncts attached to the first one
        let g = graph(&[
            ("cookies", PartOfSpeech::Noun, "ROOT", 0),
            ("beacons", PartOfSpeech::Noun, "conj", 0),
            ("pixels", PartOfSpeech::Noun, "conj", 0),
            ("logs", PartOfSpeech::Noun, "appos", 0),
        ]);
        let index = CoordinationIndex::new(&g);
        assert_eq!(index.conjuncts(1), &[0, 1, 2]);
        assert_eq!(index.conjuncts(3), &[3]);
    }

    #[test]
    fn test_cyclic_conj_terminates() {
        let g = graph(&[
            ("a", PartOfSpeech::Noun, "conj", 1),
            ("b", PartOfSpeech::Noun, "conj", 0),
        ]);
        let index = CoordinationIndex::new(&g);
        assert_eq!(index.conjuncts(0), &[0, 1]);
    }
}
