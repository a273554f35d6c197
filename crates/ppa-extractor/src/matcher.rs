//! Graph matcher
//!
//! Depth-first backtracking search over a single dependency graph, driven
//! by an explicit stack of candidate frames instead of recursion. Every
//! satisfying binding is returned, ordered by anchor position first and
//! then by the linear order of candidates at each step.

use ppa_core::{DependencyGraph, RelOp};
use tracing::warn;

use crate::pattern::CompiledPattern;

/// Default bound on candidate expansions per search
pub const DEFAULT_MAX_STEPS: usize = 100_000;

/// A complete binding of pattern slots to sentence-local token indices
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Match {
    slots: Vec<usize>,
}

impl Match {
    /// Token bound to `slot`
    pub fn token(&self, slot: usize) -> Option<usize> {
        self.slots.get(slot).copied()
    }

    /// Token bound to the node named `id`
    pub fn get(&self, pattern: &CompiledPattern, id: &str) -> Option<usize> {
        pattern.slot(id).and_then(|slot| self.token(slot))
    }

    pub fn slots(&self) -> &[usize] {
        &self.slots
    }
}

/// Candidates for one plan step and how far we have tried them
struct Frame {
    candidates: Vec<usize>,
    cursor: usize,
}

impl Frame {
    fn new(candidates: Vec<usize>) -> Self {
        Self {
            candidates,
            cursor: 0,
        }
    }

    fn next(&mut self) -> Option<usize> {
        let candidate = self.candidates.get(self.cursor).copied();
        self.cursor += 1;
        candidate
    }
}

/// Backtracking matcher for compiled patterns
#[derive(Debug, Clone, Copy)]
pub struct GraphMatcher {
    max_steps: usize,
}

impl Default for GraphMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEPS)
    }
}

impl GraphMatcher {
    pub fn new(max_steps: usize) -> Self {
        Self { max_steps }
    }

    /// Enumerate all bindings of `pattern` in `graph`.
    ///
    /// Malformed graphs yield no matches. If the step budget runs out the
    /// bindings found so far are returned.
    pub fn find_matches(&self, pattern: &CompiledPattern, graph: &DependencyGraph) -> Vec<Match> {
        if let Some(defect) = graph.defect() {
            warn!(pattern = pattern.name(), %defect, "Skipping malformed dependency graph");
            return Vec::new();
        }

        let plan_len = pattern.plan().len();
        let mut matches = Vec::new();
        let mut binding = vec![0; pattern.node_count()];
        let mut steps = 0usize;

        let anchors: Vec<usize> = graph
            .tokens()
            .iter()
            .filter(|t| pattern.anchor().matches(t))
            .map(|t| t.index)
            .collect();

        for anchor in anchors {
            binding[0] = anchor;
            if plan_len == 0 {
                matches.push(Match {
                    slots: binding.clone(),
                });
                continue;
            }

            let mut stack = vec![Frame::new(self.candidates(pattern, graph, &binding, 0))];
            while let Some(frame) = stack.last_mut() {
                let Some(candidate) = frame.next() else {
                    stack.pop();
                    continue;
                };

                steps += 1;
                if steps > self.max_steps {
                    warn!(
                        pattern = pattern.name(),
                        max_steps = self.max_steps,
                        found = matches.len(),
                        "Search budget exhausted"
                    );
                    return matches;
                }

                // Frame k binds slot k
                let slot = stack.len();
                binding[slot] = candidate;
                if slot == plan_len {
                    matches.push(Match {
                        slots: binding.clone(),
                    });
                } else {
                    let next = self.candidates(pattern, graph, &binding, slot);
                    stack.push(Frame::new(next));
                }
            }
        }

        matches
    }

    /// Tokens that may bind the node introduced by plan step `step`,
    /// given slots `0..=step` already bound.
    fn candidates(
        &self,
        pattern: &CompiledPattern,
        graph: &DependencyGraph,
        binding: &[usize],
        step: usize,
    ) -> Vec<usize> {
        let plan_step = &pattern.plan()[step];
        let pivot = binding[plan_step.pivot];
        let bound = &binding[..=step];

        let related: Vec<usize> = match plan_step.op {
            RelOp::Child => graph.children(pivot).to_vec(),
            RelOp::Head => graph.head(pivot).into_iter().collect(),
            RelOp::Precedes => graph.predecessor(pivot).into_iter().collect(),
        };

        related
            .into_iter()
            .filter(|candidate| !bound.contains(candidate))
            .filter(|&candidate| {
                graph
                    .token(candidate)
                    .is_some_and(|token| plan_step.node.matches(token))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppa_core::{NodeSpec, PartOfSpeech, Pattern, Token};

    fn graph(words: &[(&str, PartOfSpeech, &str, usize)]) -> DependencyGraph {
        DependencyGraph::new(
            words
                .iter()
                .enumerate()
                .map(|(i, (text, pos, dep, head))| {
                    Token::new(i, *text, text.to_lowercase(), *pos, *dep, *head)
                })
                .collect(),
        )
    }

    /// "Apps and sites share logs and cookies"
    fn coordinated() -> DependencyGraph {
        graph(&[
            ("apps", PartOfSpeech::Noun, "nsubj", 3),
            ("and", PartOfSpeech::Cconj, "cc", 0),
            ("sites", PartOfSpeech::Noun, "conj", 0),
            ("share", PartOfSpeech::Verb, "ROOT", 3),
            ("logs", PartOfSpeech::Noun, "dobj", 3),
            ("and", PartOfSpeech::Cconj, "cc", 4),
            ("cookies", PartOfSpeech::Noun, "conj", 4),
        ])
    }

    fn compile(pattern: Pattern) -> CompiledPattern {
        CompiledPattern::compile(&pattern).unwrap()
    }

    #[test]
    fn test_anchor_only_pattern() {
        let pattern = compile(Pattern::new("NOUNS", NodeSpec::new("n").pos_in(&[PartOfSpeech::Noun])));
        let matches = GraphMatcher::default().find_matches(&pattern, &coordinated());
        let anchors: Vec<usize> = matches.iter().filter_map(|m| m.token(0)).collect();
        assert_eq!(anchors, vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_all_bindings_in_order() {
        // verb with any nominal dependent, then that dependent's conjunct
        let pattern = compile(
            Pattern::new("VERB_ARGS", NodeSpec::new("verb").pos_in(&[PartOfSpeech::Verb]))
                .step("verb", RelOp::Child, NodeSpec::new("arg").nominal())
                .step("arg", RelOp::Child, NodeSpec::new("conj").dep("conj")),
        );
        let matches = GraphMatcher::default().find_matches(&pattern, &coordinated());
        let bindings: Vec<&[usize]> = matches.iter().map(|m| m.slots()).collect();
        assert_eq!(bindings, vec![&[3, 0, 2][..], &[3, 4, 6][..]]);
        assert_eq!(matches[1].get(&pattern, "conj"), Some(6));
    }

    #[test]
    fn test_head_operator() {
        let pattern = compile(
            Pattern::new("CONJ_HEAD", NodeSpec::new("c").dep("conj"))
                .step("c", RelOp::Head, NodeSpec::new("h")),
        );
        let matches = GraphMatcher::default().find_matches(&pattern, &coordinated());
        let pairs: Vec<(usize, usize)> = matches
            .iter()
            .map(|m| (m.token(0).unwrap(), m.token(1).unwrap()))
            .collect();
        assert_eq!(pairs, vec![(2, 0), (6, 4)]);
    }

    #[test]
    fn test_root_has_no_head_candidate() {
        let pattern = compile(
            Pattern::new("ROOT_HEAD", NodeSpec::new("r").dep("ROOT"))
                .step("r", RelOp::Head, NodeSpec::new("h")),
        );
        assert!(GraphMatcher::default()
            .find_matches(&pattern, &coordinated())
            .is_empty());
    }

    #[test]
    fn test_precedes_operator() {
        let pattern = compile(
            Pattern::new("AND_X", NodeSpec::new("x").nominal())
                .step("x", RelOp::Precedes, NodeSpec::new("and").lemma("and")),
        );
        let matches = GraphMatcher::default().find_matches(&pattern, &coordinated());
        let anchors: Vec<usize> = matches.iter().filter_map(|m| m.token(0)).collect();
        assert_eq!(anchors, vec![2, 6]);
    }

    #[test]
    fn test_binding_is_injective() {
        // head of the conjunct, then a child of that head: the conjunct
        // itself must not be rebound
        let pattern = compile(
            Pattern::new("SIBLING", NodeSpec::new("c").dep("conj"))
                .step("c", RelOp::Head, NodeSpec::new("h"))
                .step("h", RelOp::Child, NodeSpec::new("s")),
        );
        let matches = GraphMatcher::default().find_matches(&pattern, &coordinated());
        let bindings: Vec<&[usize]> = matches.iter().map(|m| m.slots()).collect();
        assert_eq!(bindings, vec![&[2, 0, 1][..], &[6, 4, 5][..]]);
    }

    #[test]
    fn test_cyclic_graph_yields_nothing() {
        let cyclic = graph(&[
            ("a", PartOfSpeech::Noun, "dep", 1),
            ("b", PartOfSpeech::Noun, "dep", 2),
            ("c", PartOfSpeech::Noun, "dep", 0),
        ]);
        let pattern = compile(
            Pattern::new("ANY", NodeSpec::new("x"))
                .step("x", RelOp::Head, NodeSpec::new("y"))
                .step("y", RelOp::Head, NodeSpec::new("z")),
        );
        assert!(GraphMatcher::default().find_matches(&pattern, &cyclic).is_empty());
    }

    #[test]
    fn test_step_budget() {
        let pattern = compile(
            Pattern::new("VERB_ARGS", NodeSpec::new("verb").pos_in(&[PartOfSpeech::Verb]))
                .step("verb", RelOp::Child, NodeSpec::new("arg")),
        );
        let unbounded = GraphMatcher::default().find_matches(&pattern, &coordinated());
        assert_eq!(unbounded.len(), 2);

        let bounded = GraphMatcher::new(1).find_matches(&pattern, &coordinated());
        assert_eq!(bounded, unbounded[..1].to_vec());
    }

    #[test]
    fn test_deterministic() {
        let pattern = compile(
            Pattern::new("ARG", NodeSpec::new("n").nominal())
                .step("n", RelOp::Head, NodeSpec::new("h")),
        );
        let matcher = GraphMatcher::default();
        let first = matcher.find_matches(&pattern, &coordinated());
        let second = matcher.find_matches(&pattern, &coordinated());
        assert_eq!(first, second);
    }
}
