//! Pattern compiler
//!
//! Turns a declarative [`Pattern`] into a search plan: node identifiers are
//! mapped to binding slots and every step records which slot it pivots
//! from. Slot 0 is always the anchor; plan order is declaration order.

use std::collections::HashMap;

use ppa_core::{NodeSpec, Pattern, PpaError, RelOp};
use thiserror::Error;

/// Pattern compilation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern has an empty name or anchor identifier")]
    EmptyPattern,

    #[error("pattern {pattern}: step introducing '{node}' references undefined node '{left}'")]
    UndefinedNode {
        pattern: String,
        node: String,
        left: String,
    },

    #[error("pattern {pattern}: node '{node}' is defined more than once")]
    DuplicateNode { pattern: String, node: String },

    #[error("pattern {pattern}: capture '{node}' is not a node of the pattern")]
    UnknownCapture { pattern: String, node: String },
}

impl From<PatternError> for PpaError {
    fn from(err: PatternError) -> Self {
        Self::InvalidPattern(err.to_string())
    }
}

/// One step of the search plan
#[derive(Debug, Clone)]
pub struct PlanStep {
    /// Slot of the already-bound node to pivot from
    pub pivot: usize,
    pub op: RelOp,
    pub node: NodeSpec,
}

/// Pattern ready for matching
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    name: String,
    anchor: NodeSpec,
    plan: Vec<PlanStep>,
    slots: HashMap<String, usize>,
}

impl CompiledPattern {
    pub fn compile(pattern: &Pattern) -> Result<Self, PatternError> {
        if pattern.name.is_empty() || pattern.anchor.id.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        let mut slots = HashMap::new();
        slots.insert(pattern.anchor.id.clone(), 0);

        let mut plan = Vec::with_capacity(pattern.steps.len());
        for step in &pattern.steps {
            let pivot = *slots
                .get(&step.left)
                .ok_or_else(|| PatternError::UndefinedNode {
                    pattern: pattern.name.clone(),
                    node: step.node.id.clone(),
                    left: step.left.clone(),
                })?;

            if step.node.id.is_empty() {
                return Err(PatternError::EmptyPattern);
            }
            if slots.contains_key(&step.node.id) {
                return Err(PatternError::DuplicateNode {
                    pattern: pattern.name.clone(),
                    node: step.node.id.clone(),
                });
            }

            slots.insert(step.node.id.clone(), plan.len() + 1);
            plan.push(PlanStep {
                pivot,
                op: step.op,
                node: step.node.clone(),
            });
        }

        Ok(Self {
            name: pattern.name.clone(),
            anchor: pattern.anchor.clone(),
            plan,
            slots,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn anchor(&self) -> &NodeSpec {
        &self.anchor
    }

    pub fn plan(&self) -> &[PlanStep] {
        &self.plan
    }

    /// Number of nodes (anchor included)
    pub fn node_count(&self) -> usize {
        self.plan.len() + 1
    }

    /// Binding slot of a node identifier
    pub fn slot(&self, id: &str) -> Option<usize> {
        self.slots.get(id).copied()
    }

    /// Slot lookup that reports a missing identifier as a capture error
    pub fn capture(&self, id: &str) -> Result<usize, PatternError> {
        self.slot(id).ok_or_else(|| PatternError::UnknownCapture {
            pattern: self.name.clone(),
            node: id.to_string(),
        })
    }
}
