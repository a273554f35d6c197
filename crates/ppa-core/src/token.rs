//! Dependency graph model
//!
//! Tokens as produced by the upstream annotator and the per-sentence
//! tree built over them. The graph never mutates its tokens; it only
//! derives adjacency views (children, head, linear predecessor) and
//! records whether the head structure forms a proper tree.

use serde::{Deserialize, Serialize};

// ============================================================================
// Part of speech
// ============================================================================

/// Coarse part-of-speech tag (Universal Dependencies tag set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartOfSpeech {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    Space,
    X,
}

impl PartOfSpeech {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adj => "ADJ",
            Self::Adp => "ADP",
            Self::Adv => "ADV",
            Self::Aux => "AUX",
            Self::Cconj => "CCONJ",
            Self::Det => "DET",
            Self::Intj => "INTJ",
            Self::Noun => "NOUN",
            Self::Num => "NUM",
            Self::Part => "PART",
            Self::Pron => "PRON",
            Self::Propn => "PROPN",
            Self::Punct => "PUNCT",
            Self::Sconj => "SCONJ",
            Self::Sym => "SYM",
            Self::Verb => "VERB",
            Self::Space => "SPACE",
            Self::X => "X",
        }
    }

    /// Nouns, proper nouns and pronouns
    pub fn is_nominal(&self) -> bool {
        matches!(self, Self::Noun | Self::Propn | Self::Pron)
    }
}

impl std::fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PartOfSpeech {
    type Err = crate::PpaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADJ" => Ok(Self::Adj),
            "ADP" => Ok(Self::Adp),
            "ADV" => Ok(Self::Adv),
            "AUX" => Ok(Self::Aux),
            "CCONJ" | "CONJ" => Ok(Self::Cconj),
            "DET" => Ok(Self::Det),
            "INTJ" => Ok(Self::Intj),
            "NOUN" => Ok(Self::Noun),
            "NUM" => Ok(Self::Num),
            "PART" => Ok(Self::Part),
            "PRON" => Ok(Self::Pron),
            "PROPN" => Ok(Self::Propn),
            "PUNCT" => Ok(Self::Punct),
            "SCONJ" => Ok(Self::Sconj),
            "SYM" => Ok(Self::Sym),
            "VERB" => Ok(Self::Verb),
            "SPACE" => Ok(Self::Space),
            "X" => Ok(Self::X),
            _ => Err(crate::PpaError::InvalidDocument(format!(
                "unknown part of speech: {s}"
            ))),
        }
    }
}

// ============================================================================
// Token
// ============================================================================

/// One word of an annotated sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Position in the sentence (0-based)
    pub index: usize,

    /// Surface form
    pub text: String,

    /// Lemma as produced by the annotator
    pub lemma: String,

    /// Coarse POS tag
    #[serde(rename = "pos")]
    pub part_of_speech: PartOfSpeech,

    /// Relation to the head (e.g. "prep", "amod", "conj")
    #[serde(rename = "dep")]
    pub dependency_label: String,

    /// Index of the head token; the root is its own head
    #[serde(rename = "head")]
    pub head_index: usize,
}

impl Token {
    /// Create a new token
    pub fn new(
        index: usize,
        text: impl Into<String>,
        lemma: impl Into<String>,
        part_of_speech: PartOfSpeech,
        dependency_label: impl Into<String>,
        head_index: usize,
    ) -> Self {
        Self {
            index,
            text: text.into(),
            lemma: lemma.into(),
            part_of_speech,
            dependency_label: dependency_label.into(),
            head_index,
        }
    }

    /// Whether this token is its own head
    pub fn is_root(&self) -> bool {
        self.head_index == self.index
    }
}

// ============================================================================
// Dependency graph
// ============================================================================

/// Structural problem found while building a dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphDefect {
    /// Token indices are not exactly 0..len
    BadIndex { index: usize },
    /// A head points outside the sentence
    HeadOutOfRange { token: usize, head: usize },
    /// No token is its own head
    NoRoot,
    /// More than one token is its own head
    MultipleRoots,
    /// Following heads from this token never reaches the root
    Cycle { token: usize },
}

impl std::fmt::Display for GraphDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadIndex { index } => {
                write!(f, "token index {index} is duplicated or out of order")
            }
            Self::HeadOutOfRange { token, head } => {
                write!(f, "token {token} has head {head} outside the sentence")
            }
            Self::NoRoot => write!(f, "sentence has no root"),
            Self::MultipleRoots => write!(f, "sentence has more than one root"),
            Self::Cycle { token } => write!(f, "head chain from token {token} is cyclic"),
        }
    }
}

/// Dependency tree for a single sentence
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    tokens: Vec<Token>,
    /// Children per token, in linear order
    children: Vec<Vec<usize>>,
    root: Option<usize>,
    defect: Option<GraphDefect>,
}

impl DependencyGraph {
    /// Build a graph from annotator output.
    ///
    /// Tokens are ordered by `index`. Malformed input is accepted; the
    /// problem is recorded and reported by [`DependencyGraph::defect`].
    pub fn new(mut tokens: Vec<Token>) -> Self {
        tokens.sort_by_key(|t| t.index);
        let len = tokens.len();

        let mut children = vec![Vec::new(); len];
        let mut roots = Vec::new();
        let mut defect = None;

        for (position, token) in tokens.iter().enumerate() {
            if token.index != position {
                defect.get_or_insert(GraphDefect::BadIndex { index: token.index });
                continue;
            }
            if token.head_index >= len {
                defect.get_or_insert(GraphDefect::HeadOutOfRange {
                    token: position,
                    head: token.head_index,
                });
                continue;
            }
            if token.is_root() {
                roots.push(position);
            } else {
                children[token.head_index].push(position);
            }
        }

        if defect.is_none() && len > 0 {
            defect = match roots.len() {
                0 => Some(GraphDefect::NoRoot),
                1 => find_cycle(&tokens).map(|token| GraphDefect::Cycle { token }),
                _ => Some(GraphDefect::MultipleRoots),
            };
        }

        let root = if roots.len() == 1 { Some(roots[0]) } else { None };

        Self {
            tokens,
            children,
            root,
            defect,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in linear order
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Immediate dependents of `index`, in linear order
    pub fn children(&self, index: usize) -> &[usize] {
        self.children.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Immediate head of `index`; `None` for the root
    pub fn head(&self, index: usize) -> Option<usize> {
        let token = self.tokens.get(index)?;
        if token.is_root() || token.head_index >= self.tokens.len() {
            None
        } else {
            Some(token.head_index)
        }
    }

    /// Token immediately before `index` in linear order
    pub fn predecessor(&self, index: usize) -> Option<usize> {
        if index == 0 || index >= self.tokens.len() {
            None
        } else {
            Some(index - 1)
        }
    }

    pub fn root(&self) -> Option<usize> {
        self.root
    }

    /// Whether the head structure is a single rooted tree
    pub fn is_well_formed(&self) -> bool {
        self.defect.is_none()
    }

    pub fn defect(&self) -> Option<&GraphDefect> {
        self.defect.as_ref()
    }
}

/// First token whose head chain does not reach the root within `len` steps.
fn find_cycle(tokens: &[Token]) -> Option<usize> {
    let len = tokens.len();
    tokens.iter().position(|start| {
        let mut current = start;
        for _ in 0..len {
            if current.is_root() {
                return false;
            }
            current = &tokens[current.head_index];
        }
        !current.is_root()
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(index: usize, text: &str, pos: PartOfSpeech, dep: &str, head: usize) -> Token {
        Token::new(index, text, text.to_lowercase(), pos, dep, head)
    }

    fn sample() -> DependencyGraph {
        // "We collect data ."
        DependencyGraph::new(vec![
            tok(0, "We", PartOfSpeech::Pron, "nsubj", 1),
            tok(1, "collect", PartOfSpeech::Verb, "ROOT", 1),
            tok(2, "data", PartOfSpeech::Noun, "dobj", 1),
            tok(3, ".", PartOfSpeech::Punct, "punct", 1),
        ])
    }

    #[test]
    fn test_children_in_linear_order() {
        let graph = sample();
        assert!(graph.is_well_formed());
        assert_eq!(graph.root(), Some(1));
        assert_eq!(graph.children(1), &[0, 2, 3]);
        assert!(graph.children(2).is_empty());
    }

    #[test]
    fn test_root_has_no_head() {
        let graph = sample();
        assert_eq!(graph.head(1), None);
        assert_eq!(graph.head(2), Some(1));
    }

    #[test]
    fn test_predecessor() {
        let graph = sample();
        assert_eq!(graph.predecessor(0), None);
        assert_eq!(graph.predecessor(3), Some(2));
    }

    #[test]
    fn test_tokens_sorted_by_index() {
        let graph = DependencyGraph::new(vec![
            tok(1, "runs", PartOfSpeech::Verb, "ROOT", 1),
            tok(0, "It", PartOfSpeech::Pron, "nsubj", 1),
        ]);
        assert!(graph.is_well_formed());
        assert_eq!(graph.tokens()[0].text, "It");
    }

    #[test]
    fn test_cycle_detected() {
        let graph = DependencyGraph::new(vec![
            tok(0, "a", PartOfSpeech::Noun, "dep", 1),
            tok(1, "b", PartOfSpeech::Noun, "dep", 0),
        ]);
        assert_eq!(graph.defect(), Some(&GraphDefect::NoRoot));

        let graph = DependencyGraph::new(vec![
            tok(0, "root", PartOfSpeech::Verb, "ROOT", 0),
            tok(1, "a", PartOfSpeech::Noun, "dep", 2),
            tok(2, "b", PartOfSpeech::Noun, "dep", 1),
        ]);
        assert_eq!(graph.defect(), Some(&GraphDefect::Cycle { token: 1 }));
        assert!(!graph.is_well_formed());
    }

    #[test]
    fn test_head_out_of_range() {
        let graph = DependencyGraph::new(vec![
            tok(0, "a", PartOfSpeech::Noun, "ROOT", 0),
            tok(1, "b", PartOfSpeech::Noun, "dep", 7),
        ]);
        assert_eq!(
            graph.defect(),
            Some(&GraphDefect::HeadOutOfRange { token: 1, head: 7 })
        );
        assert_eq!(graph.head(1), None);
    }

    #[test]
    fn test_multiple_roots() {
        let graph = DependencyGraph::new(vec![
            tok(0, "a", PartOfSpeech::Noun, "ROOT", 0),
            tok(1, "b", PartOfSpeech::Noun, "ROOT", 1),
        ]);
        assert_eq!(graph.defect(), Some(&GraphDefect::MultipleRoots));
        assert_eq!(graph.root(), None);
    }

    #[test]
    fn test_pos_parse() {
        assert_eq!("propn".parse::<PartOfSpeech>().unwrap(), PartOfSpeech::Propn);
        assert!("noun-ish".parse::<PartOfSpeech>().is_err());
        assert!(PartOfSpeech::Pron.is_nominal());
        assert!(!PartOfSpeech::Verb.is_nominal());
    }

    #[test]
    fn test_token_json_field_names() {
        let token: Token = serde_json::from_str(
            r#"{"index":0,"text":"Data","lemma":"data","pos":"NOUN","dep":"ROOT","head":0}"#,
        )
        .unwrap();
        assert_eq!(token.part_of_speech, PartOfSpeech::Noun);
        assert!(token.is_root());
    }
}
