//! PPA Core - Domain models and shared types
//!
//! This crate defines the data the subsumption extractor operates on:
//! - Dependency graphs (tokens with head, lemma, POS and label)
//! - Documents with their entity span overlay
//! - Declarative dependency patterns
//! - The relation graph accumulated per document
//! - Common error types and configuration

pub mod config;
pub mod document;
pub mod pattern;
pub mod relation;
pub mod token;

pub use config::{AppConfig, ConfigError, ExtractorConfig, LoggingConfig};
pub use document::{AnnotatedDocument, Document, EntityId, EntityLabel, EntitySpan, Sentence};
pub use pattern::{AttrPredicate, NodeSpec, Pattern, PatternStep, RelOp, RuleDefinition};
pub use relation::{RelationEdge, RelationGraph, RelationType};
pub use token::{DependencyGraph, GraphDefect, PartOfSpeech, Token};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for PPA operations
#[derive(Error, Debug)]
pub enum PpaError {
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for PpaError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PpaError>;
