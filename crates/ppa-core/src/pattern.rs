//! Declarative dependency patterns
//!
//! A pattern introduces an anchor node, then further nodes each positioned
//! relative to an already-introduced one. Patterns are plain data so they
//! can be written in code or loaded from configuration; the extractor
//! compiles them into a search plan.

use serde::{Deserialize, Serialize};

use crate::relation::RelationType;
use crate::token::{PartOfSpeech, Token};

/// Attribute test over a single token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrPredicate {
    LemmaEquals(String),
    LemmaIn(Vec<String>),
    PosIn(Vec<PartOfSpeech>),
    DepEquals(String),
}

impl AttrPredicate {
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            Self::LemmaEquals(lemma) => token.lemma == *lemma,
            Self::LemmaIn(lemmas) => lemmas.iter().any(|l| *l == token.lemma),
            Self::PosIn(tags) => tags.contains(&token.part_of_speech),
            Self::DepEquals(label) => token.dependency_label == *label,
        }
    }
}

/// Structural relation between a bound node and the node it introduces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelOp {
    /// New node is an immediate dependent of the referenced node
    #[serde(rename = ">")]
    Child,
    /// New node is the immediate head of the referenced node
    #[serde(rename = "<")]
    Head,
    /// New node immediately precedes the referenced node
    #[serde(rename = ";")]
    Precedes,
}

impl RelOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Child => ">",
            Self::Head => "<",
            Self::Precedes => ";",
        }
    }
}

impl std::fmt::Display for RelOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A named node and the predicates its token must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(default)]
    pub attrs: Vec<AttrPredicate>,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attrs: Vec::new(),
        }
    }

    pub fn lemma(mut self, lemma: impl Into<String>) -> Self {
        self.attrs.push(AttrPredicate::LemmaEquals(lemma.into()));
        self
    }

    pub fn lemma_in(mut self, lemmas: &[&str]) -> Self {
        self.attrs.push(AttrPredicate::LemmaIn(
            lemmas.iter().map(|l| l.to_string()).collect(),
        ));
        self
    }

    pub fn pos_in(mut self, tags: &[PartOfSpeech]) -> Self {
        self.attrs.push(AttrPredicate::PosIn(tags.to_vec()));
        self
    }

    /// Noun, proper noun or pronoun
    pub fn nominal(self) -> Self {
        self.pos_in(&[PartOfSpeech::Noun, PartOfSpeech::Propn, PartOfSpeech::Pron])
    }

    pub fn dep(mut self, label: impl Into<String>) -> Self {
        self.attrs.push(AttrPredicate::DepEquals(label.into()));
        self
    }

    pub fn matches(&self, token: &Token) -> bool {
        self.attrs.iter().all(|attr| attr.matches(token))
    }
}

/// A node introduced relative to an earlier one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternStep {
    /// Identifier of the already-introduced node
    pub left: String,
    pub op: RelOp,
    pub node: NodeSpec,
}

/// Named sequence of node specs, starting at the anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    pub anchor: NodeSpec,
    #[serde(default)]
    pub steps: Vec<PatternStep>,
}

impl Pattern {
    pub fn new(name: impl Into<String>, anchor: NodeSpec) -> Self {
        Self {
            name: name.into(),
            anchor,
            steps: Vec::new(),
        }
    }

    /// Introduce `node` related to `left` by `op`
    pub fn step(mut self, left: impl Into<String>, op: RelOp, node: NodeSpec) -> Self {
        self.steps.push(PatternStep {
            left: left.into(),
            op,
            node,
        });
        self
    }

    /// Node identifiers in declaration order
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.anchor.id.as_str())
            .chain(self.steps.iter().map(|s| s.node.id.as_str()))
    }
}

fn default_relation() -> RelationType {
    RelationType::Subsum
}

/// A pattern plus the two captured nodes that become a relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub pattern: Pattern,
    /// Node bound to the general term
    pub upper: String,
    /// Node bound to the specific term
    pub lower: String,
    #[serde(default = "default_relation")]
    pub relation: RelationType,
}

impl RuleDefinition {
    pub fn new(pattern: Pattern, upper: impl Into<String>, lower: impl Into<String>) -> Self {
        Self {
            pattern,
            upper: upper.into(),
            lower: lower.into(),
            relation: RelationType::Subsum,
        }
    }

    pub fn name(&self) -> &str {
        &self.pattern.name
    }
}
