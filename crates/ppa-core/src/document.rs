//! Document model
//!
//! A document is an ordered list of sentences sharing one token stream,
//! one set of entity spans over that stream and one relation graph.
//! Sentence token indices are local to the sentence; entity spans and
//! relation graph nodes use positions in the flattened document stream.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::relation::RelationGraph;
use crate::token::{DependencyGraph, Token};
use crate::{PpaError, Result};

// ============================================================================
// Entity spans
// ============================================================================

/// Entity categories produced by the upstream recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    /// A category of personal data
    Data,
    /// A party that receives or processes data
    Actor,
}

impl EntityLabel {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::Actor => "ACTOR",
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityLabel {
    type Err = PpaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DATA" => Ok(Self::Data),
            "ACTOR" => Ok(Self::Actor),
            _ => Err(PpaError::InvalidDocument(format!(
                "unknown entity label: {s}"
            ))),
        }
    }
}

/// Contiguous run of document tokens tagged with a label.
///
/// `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub label: EntityLabel,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, label: EntityLabel) -> Self {
        Self { start, end, label }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position < self.end
    }
}

/// Index of an entity span within its document
pub type EntityId = usize;

// ============================================================================
// Sentences
// ============================================================================

/// A dependency graph placed at an offset in the document token stream
#[derive(Debug, Clone)]
pub struct Sentence {
    offset: usize,
    graph: DependencyGraph,
}

impl Sentence {
    /// Document position of the sentence's first token
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Convert a sentence-local index to a document position
    pub fn to_document(&self, local: usize) -> usize {
        self.offset + local
    }

    /// Convert a document position to a sentence-local index
    pub fn to_local(&self, position: usize) -> Option<usize> {
        position
            .checked_sub(self.offset)
            .filter(|local| *local < self.graph.len())
    }
}

// ============================================================================
// Document
// ============================================================================

/// JSON interchange shape for an annotated document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub sentences: Vec<Vec<Token>>,
    #[serde(default)]
    pub entities: Vec<EntitySpan>,
}

/// Parsed, entity-annotated document and its relation graph
#[derive(Debug, Clone)]
pub struct Document {
    id: Uuid,
    sentences: Vec<Sentence>,
    entities: Vec<EntitySpan>,
    /// Owning entity per document token
    token_entity: Vec<Option<EntityId>>,
    relations: RelationGraph,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            sentences: Vec::new(),
            entities: Vec::new(),
            token_entity: Vec::new(),
            relations: RelationGraph::new(),
        }
    }

    /// Build a document from annotator output
    pub fn from_annotated(annotated: AnnotatedDocument) -> Result<Self> {
        let mut document = match annotated.id {
            Some(id) => Self::with_id(id),
            None => Self::new(),
        };
        for tokens in annotated.sentences {
            document.push_sentence(DependencyGraph::new(tokens));
        }
        for span in annotated.entities {
            document.add_entity(span)?;
        }
        Ok(document)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Append a sentence; returns its document offset
    pub fn push_sentence(&mut self, graph: DependencyGraph) -> usize {
        let offset = self.token_entity.len();
        self.token_entity.resize(offset + graph.len(), None);
        self.sentences.push(Sentence { offset, graph });
        offset
    }

    /// Register an entity span over tokens already pushed.
    ///
    /// Empty, out-of-range and overlapping spans are rejected.
    pub fn add_entity(&mut self, span: EntitySpan) -> Result<EntityId> {
        if span.is_empty() {
            return Err(PpaError::InvalidDocument(format!(
                "empty entity span {}..{}",
                span.start, span.end
            )));
        }
        if span.end > self.token_entity.len() {
            return Err(PpaError::InvalidDocument(format!(
                "entity span {}..{} exceeds document length {}",
                span.start,
                span.end,
                self.token_entity.len()
            )));
        }
        if let Some(existing) = self.token_entity[span.start..span.end]
            .iter()
            .flatten()
            .next()
        {
            let other = self.entities[*existing];
            return Err(PpaError::InvalidDocument(format!(
                "entity span {}..{} overlaps {}..{}",
                span.start, span.end, other.start, other.end
            )));
        }

        let id = self.entities.len();
        self.entities.push(span);
        for slot in &mut self.token_entity[span.start..span.end] {
            *slot = Some(id);
        }
        Ok(id)
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Total number of tokens across all sentences
    pub fn token_count(&self) -> usize {
        self.token_entity.len()
    }

    /// Token at a document position
    pub fn token(&self, position: usize) -> Option<&Token> {
        let sentence = self.sentence_at(position)?;
        sentence.graph.token(position - sentence.offset)
    }

    pub fn token_text(&self, position: usize) -> Option<&str> {
        self.token(position).map(|t| t.text.as_str())
    }

    fn sentence_at(&self, position: usize) -> Option<&Sentence> {
        let next = self.sentences.partition_point(|s| s.offset <= position);
        let sentence = self.sentences.get(next.checked_sub(1)?)?;
        sentence.to_local(position).map(|_| sentence)
    }

    pub fn entities(&self) -> &[EntitySpan] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntitySpan> {
        self.entities.get(id)
    }

    /// Entity span owning the token at `position`, if any
    pub fn entity_of_token(&self, position: usize) -> Option<EntityId> {
        self.token_entity.get(position).copied().flatten()
    }

    /// First token of the span; used as the relation graph node
    pub fn representative_token(&self, id: EntityId) -> Option<usize> {
        self.entities.get(id).map(|span| span.start)
    }

    /// Syntactic head of the span: the first token whose head lies
    /// outside the span (or the sentence root). Falls back to the first
    /// token for spans whose tokens all point inside the span.
    pub fn entity_head(&self, id: EntityId) -> Option<usize> {
        let span = self.entities.get(id)?;
        let head = (span.start..span.end).find(|&position| {
            let Some(sentence) = self.sentence_at(position) else {
                return false;
            };
            let local = position - sentence.offset;
            match sentence.graph.head(local) {
                Some(head) => !span.contains(sentence.to_document(head)),
                None => true,
            }
        });
        Some(head.unwrap_or(span.start))
    }

    /// Surface text of the span, tokens joined by single spaces
    pub fn entity_text(&self, id: EntityId) -> Option<String> {
        let span = self.entities.get(id)?;
        let words: Vec<&str> = (span.start..span.end)
            .filter_map(|position| self.token_text(position))
            .collect();
        Some(words.join(" "))
    }

    pub fn relations(&self) -> &RelationGraph {
        &self.relations
    }

    pub fn relations_mut(&mut self) -> &mut RelationGraph {
        &mut self.relations
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::PartOfSpeech;

    fn sentence(words: &[(&str, PartOfSpeech, &str, usize)]) -> DependencyGraph {
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

    fn two_sentences() -> Document {
        let mut doc = Document::new();
        // "We collect personal data ."
        doc.push_sentence(sentence(&[
            ("We", PartOfSpeech::Pron, "nsubj", 1),
            ("collect", PartOfSpeech::Verb, "ROOT", 1),
            ("personal", PartOfSpeech::Adj, "amod", 3),
            ("data", PartOfSpeech::Noun, "dobj", 1),
            (".", PartOfSpeech::Punct, "punct", 1),
        ]));
        // "Partners receive it ."
        doc.push_sentence(sentence(&[
            ("Partners", PartOfSpeech::Noun, "nsubj", 1),
            ("receive", PartOfSpeech::Verb, "ROOT", 1),
            ("it", PartOfSpeech::Pron, "dobj", 1),
            (".", PartOfSpeech::Punct, "punct", 1),
        ]));
        doc
    }

    #[test]
    fn test_sentence_offsets() {
        let doc = two_sentences();
        assert_eq!(doc.token_count(), 9);
        assert_eq!(doc.sentences()[1].offset(), 5);
        assert_eq!(doc.token_text(5), Some("Partners"));
        assert_eq!(doc.token_text(9), None);
        assert_eq!(doc.sentences()[1].to_local(4), None);
        assert_eq!(doc.sentences()[1].to_local(7), Some(2));
    }

    #[test]
    fn test_entity_lookup() {
        let mut doc = two_sentences();
        let data = doc.add_entity(EntitySpan::new(2, 4, EntityLabel::Data)).unwrap();
        let actor = doc.add_entity(EntitySpan::new(5, 6, EntityLabel::Actor)).unwrap();

        assert_eq!(doc.entity_of_token(3), Some(data));
        assert_eq!(doc.entity_of_token(5), Some(actor));
        assert_eq!(doc.entity_of_token(1), None);
        assert_eq!(doc.representative_token(data), Some(2));
        assert_eq!(doc.entity_head(data), Some(3));
        assert_eq!(doc.entity_text(data).as_deref(), Some("personal data"));
    }

    #[test]
    fn test_invalid_spans_rejected() {
        let mut doc = two_sentences();
        assert!(doc.add_entity(EntitySpan::new(3, 3, EntityLabel::Data)).is_err());
        assert!(doc.add_entity(EntitySpan::new(8, 12, EntityLabel::Data)).is_err());

        doc.add_entity(EntitySpan::new(2, 4, EntityLabel::Data)).unwrap();
        let overlap = doc.add_entity(EntitySpan::new(3, 5, EntityLabel::Data));
        assert!(matches!(overlap, Err(PpaError::InvalidDocument(_))));
        assert_eq!(doc.entities().len(), 1);
    }

    #[test]
    fn test_from_annotated_json() {
        let json = r#"{
            "sentences": [[
                {"index":0,"text":"Advertisers","lemma":"advertiser","pos":"NOUN","dep":"nsubj","head":1},
                {"index":1,"text":"receive","lemma":"receive","pos":"VERB","dep":"ROOT","head":1},
                {"index":2,"text":"data","lemma":"data","pos":"NOUN","dep":"dobj","head":1}
            ]],
            "entities": [
                {"start":0,"end":1,"label":"ACTOR"},
                {"start":2,"end":3,"label":"DATA"}
            ]
        }"#;
        let annotated: AnnotatedDocument = serde_json::from_str(json).unwrap();
        let doc = Document::from_annotated(annotated).unwrap();

        assert_eq!(doc.entities().len(), 2);
        assert_eq!(doc.entities()[0].label, EntityLabel::Actor);
        assert!(doc.relations().is_empty());
    }

    #[test]
    fn test_label_parse() {
        assert_eq!("actor".parse::<EntityLabel>().unwrap(), EntityLabel::Actor);
        assert!("PERSON".parse::<EntityLabel>().is_err());
    }
}
