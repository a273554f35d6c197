//! Subsumption extraction
//!
//! Runs a fixed battery of dependency patterns over every sentence of a
//! document. Each rule names an upper (general) and a lower (specific)
//! node; a match only counts when both fall inside recognized entity
//! spans, and the relation is then fanned out over every entity
//! coordinated with the lower one.

use std::collections::HashSet;

use ppa_core::{
    Document, EntityId, ExtractorConfig, NodeSpec, PartOfSpeech, Pattern, RelOp, RelationType,
    Result, RuleDefinition, Sentence,
};
use tracing::{debug, trace, warn};

use crate::coordination::CoordinationIndex;
use crate::matcher::GraphMatcher;
use crate::pattern::{CompiledPattern, PatternError};
use crate::{ExtractedRelation, RelationExtractor};

// ============================================================================
// Built-in battery
// ============================================================================

pub const SUCH_AS: &str = "SUBSUM_SUCH_AS";
pub const INCLUDING_LIKE: &str = "SUBSUM_INCLUDING_LIKE";
pub const INCLUDE: &str = "SUBSUM_INCLUDE";
pub const INCLUDING_LIMITED_TO: &str = "SUBSUM_INCLUDING_LIMITED_TO";
pub const FOR_EXAMPLE: &str = "SUBSUM_FOR_EXAMPLE";
pub const EG: &str = "SUBSUM_EG";
pub const SUCH_N_AS: &str = "SUBSUM_SUCH_N_AS";

const UPPER: &str = "upper_token";
const LOWER: &str = "lower_token";

/// The built-in subsumption rules, in evaluation order
pub fn default_rules() -> Vec<RuleDefinition> {
    vec![
        // "X such as Y"
        RuleDefinition::new(
            Pattern::new(SUCH_AS, NodeSpec::new("anchor").lemma("as").dep("prep"))
                .step("anchor", RelOp::Precedes, NodeSpec::new("such").lemma("such"))
                .step("anchor", RelOp::Head, NodeSpec::new(UPPER).nominal())
                .step("anchor", RelOp::Child, NodeSpec::new(LOWER).nominal()),
            UPPER,
            LOWER,
        ),
        // "X including Y", "X like Y"
        RuleDefinition::new(
            Pattern::new(
                INCLUDING_LIKE,
                NodeSpec::new("anchor")
                    .dep("prep")
                    .lemma_in(&["include", "like"]),
            )
            .step("anchor", RelOp::Head, NodeSpec::new(UPPER).nominal())
            .step("anchor", RelOp::Child, NodeSpec::new(LOWER).nominal()),
            UPPER,
            LOWER,
        ),
        // "X that includes Y": Y is the direct object of the verb
        RuleDefinition::new(
            Pattern::new(
                INCLUDE,
                NodeSpec::new("anchor")
                    .pos_in(&[PartOfSpeech::Verb])
                    .lemma("include"),
            )
            .step("anchor", RelOp::Head, NodeSpec::new(UPPER).nominal())
            .step("anchor", RelOp::Child, NodeSpec::new(LOWER).nominal().dep("dobj")),
            UPPER,
            LOWER,
        ),
        // "X including but not limited to Y"
        RuleDefinition::new(
            Pattern::new(INCLUDING_LIMITED_TO, NodeSpec::new("including").lemma("include"))
                .step("including", RelOp::Child, NodeSpec::new("limited").lemma("limit"))
                .step("limited", RelOp::Child, NodeSpec::new("to").lemma("to"))
                .step("including", RelOp::Head, NodeSpec::new(UPPER).nominal())
                .step("to", RelOp::Child, NodeSpec::new(LOWER).nominal()),
            UPPER,
            LOWER,
        ),
        // "X, for example Y"
        RuleDefinition::new(
            Pattern::new(FOR_EXAMPLE, NodeSpec::new(UPPER).nominal())
                .step(UPPER, RelOp::Child, NodeSpec::new(LOWER).dep("appos").nominal())
                .step(LOWER, RelOp::Child, NodeSpec::new("for").lemma("for"))
                .step("for", RelOp::Child, NodeSpec::new("example").lemma("example")),
            UPPER,
            LOWER,
        ),
        // "X, e.g. Y", "X, i.e. Y"
        RuleDefinition::new(
            Pattern::new(EG, NodeSpec::new(UPPER).nominal())
                .step(UPPER, RelOp::Child, NodeSpec::new(LOWER).dep("appos").nominal())
                .step(
                    LOWER,
                    RelOp::Child,
                    NodeSpec::new("marker").lemma_in(&["e.g.", "eg", "i.e.", "ie"]),
                ),
            UPPER,
            LOWER,
        ),
        // "such X as Y"
        RuleDefinition::new(
            Pattern::new(SUCH_N_AS, NodeSpec::new(UPPER).nominal())
                .step(UPPER, RelOp::Child, NodeSpec::new("such").dep("amod").lemma("such"))
                .step(UPPER, RelOp::Child, NodeSpec::new("as").dep("prep").lemma("as"))
                .step("as", RelOp::Child, NodeSpec::new(LOWER).nominal()),
            UPPER,
            LOWER,
        ),
    ]
}

// ============================================================================
// Compiled rules
// ============================================================================

/// A compiled pattern with resolved capture slots
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pattern: CompiledPattern,
    upper: usize,
    lower: usize,
    relation: RelationType,
}

impl CompiledRule {
    pub fn compile(definition: &RuleDefinition) -> std::result::Result<Self, PatternError> {
        let pattern = CompiledPattern::compile(&definition.pattern)?;
        let upper = pattern.capture(&definition.upper)?;
        let lower = pattern.capture(&definition.lower)?;
        Ok(Self {
            pattern,
            upper,
            lower,
            relation: definition.relation,
        })
    }

    pub fn name(&self) -> &str {
        self.pattern.name()
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// Pattern-based subsumption extractor
///
/// Never emits a self relation: a match whose upper entity is also a
/// member of the lower entity's conjunct chain yields no edge for it.
#[derive(Debug, Clone)]
pub struct SubsumptionExtractor {
    rules: Vec<CompiledRule>,
    matcher: GraphMatcher,
}

impl SubsumptionExtractor {
    /// Extractor with the full built-in battery
    pub fn new() -> Result<Self> {
        Self::from_rules(&default_rules(), GraphMatcher::default())
    }

    /// Compile the given rules; any malformed rule fails construction
    pub fn from_rules(definitions: &[RuleDefinition], matcher: GraphMatcher) -> Result<Self> {
        let rules = definitions
            .iter()
            .map(CompiledRule::compile)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { rules, matcher })
    }

    /// Built-in battery minus disabled rules, plus custom rules
    pub fn from_config(config: &ExtractorConfig) -> Result<Self> {
        let builtin = default_rules();
        for name in &config.disabled_rules {
            if !builtin.iter().any(|rule| rule.name() == name) {
                warn!(rule = %name, "Disabled rule is not part of the built-in battery");
            }
        }

        let definitions: Vec<RuleDefinition> = builtin
            .into_iter()
            .filter(|rule| !config.disabled_rules.iter().any(|name| name == rule.name()))
            .chain(config.custom_rules.iter().cloned())
            .collect();

        Self::from_rules(&definitions, GraphMatcher::new(config.max_search_steps))
    }

    /// Names of the active rules, in evaluation order
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(CompiledRule::name).collect()
    }

    fn extract_sentence(
        &self,
        document: &Document,
        sentence: &Sentence,
        seen: &mut HashSet<(EntityId, EntityId, RelationType)>,
        relations: &mut Vec<ExtractedRelation>,
    ) {
        let graph = sentence.graph();
        let mut coordination: Option<CoordinationIndex> = None;

        for rule in &self.rules {
            for found in self.matcher.find_matches(&rule.pattern, graph) {
                let (Some(upper_token), Some(lower_token)) =
                    (found.token(rule.upper), found.token(rule.lower))
                else {
                    continue;
                };

                let upper = document.entity_of_token(sentence.to_document(upper_token));
                let lower = document.entity_of_token(sentence.to_document(lower_token));
                let (Some(upper), Some(lower)) = (upper, lower) else {
                    trace!(
                        rule = rule.name(),
                        upper_token,
                        lower_token,
                        "Match outside recognized entities"
                    );
                    continue;
                };

                let index = coordination.get_or_insert_with(|| CoordinationIndex::new(graph));
                for conjunct in conjunct_chain(document, sentence, index, lower) {
                    if conjunct == upper {
                        trace!(rule = rule.name(), entity = upper, "Skipping self relation");
                        continue;
                    }
                    if !seen.insert((upper, conjunct, rule.relation)) {
                        continue;
                    }

                    debug!(
                        rule = rule.name(),
                        upper = %document.entity_text(upper).unwrap_or_default(),
                        lower = %document.entity_text(conjunct).unwrap_or_default(),
                        "Extracted relation"
                    );
                    relations.push(ExtractedRelation {
                        rule: rule.name().to_string(),
                        upper,
                        lower: conjunct,
                        relation: rule.relation,
                    });
                }
            }
        }
    }
}

/// Entities coordinated with `lower` (itself included), in document order.
///
/// Coordination is followed from the syntactic head of the lower span.
fn conjunct_chain(
    document: &Document,
    sentence: &Sentence,
    index: &CoordinationIndex,
    lower: EntityId,
) -> Vec<EntityId> {
    let Some(local) = document
        .entity_head(lower)
        .and_then(|head| sentence.to_local(head))
    else {
        return vec![lower];
    };

    let mut chain: Vec<EntityId> = index
        .conjuncts(local)
        .iter()
        .filter_map(|&token| document.entity_of_token(sentence.to_document(token)))
        .chain(std::iter::once(lower))
        .collect();
    chain.sort_unstable();
    chain.dedup();
    chain
}

impl RelationExtractor for SubsumptionExtractor {
    fn extract(&self, document: &Document) -> Vec<ExtractedRelation> {
        let mut seen = HashSet::new();
        let mut relations = Vec::new();
        for sentence in document.sentences() {
            self.extract_sentence(document, sentence, &mut seen, &mut relations);
        }
        relations
    }
}

// ============================================================================
// Tests
// ============================================================================
