//! PPA Extractor - Subsumption extraction pipeline
//!
//! Matches declarative dependency patterns against parsed sentences and
//! records which entity mentions generalize which others.

use ppa_core::{Document, EntityId, RelationType};
use tracing::info;

/// Relation found in a document, before it is linked into the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRelation {
    /// Rule that produced the match
    pub rule: String,
    pub upper: EntityId,
    pub lower: EntityId,
    pub relation: RelationType,
}

/// Trait for relation extractors
pub trait RelationExtractor: Send + Sync {
    /// Find relations without touching the document's relation graph
    fn extract(&self, document: &Document) -> Vec<ExtractedRelation>;

    /// Link extracted relations into the document; returns new edge count
    fn annotate(&self, document: &mut Document) -> usize {
        let relations = self.extract(document);
        let mut inserted = 0;
        for relation in relations {
            let (Some(source), Some(target)) = (
                document.representative_token(relation.upper),
                document.representative_token(relation.lower),
            ) else {
                continue;
            };
            if document
                .relations_mut()
                .link(source, target, relation.relation)
            {
                inserted += 1;
            }
        }
        info!(
            document = %document.id(),
            inserted,
            total = document.relations().len(),
            "Linked extracted relations"
        );
        inserted
    }
}

pub mod coordination;
pub mod matcher;
pub mod pattern;
pub mod subsumption;

pub use matcher::{GraphMatcher, Match};
pub use pattern::{CompiledPattern, PatternError};
pub use subsumption::SubsumptionExtractor;
