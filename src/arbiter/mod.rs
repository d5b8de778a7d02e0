//! The per-turn tool arbitration policy.
//!
//! For every `domain_catalog` turn the arbiter walks an explicit ordered tier
//! list (curated retrieval, then web search, then the generative tool) with
//! early-exit semantics: the first sufficient tier halts the chain. Curated
//! results are authoritative and may never be overridden by a lower tier.
//! Tier errors and timeouts count as insufficient, never as fatal; only total
//! exhaustion produces [`ToolOutcome::NoData`].

mod intent;

pub use intent::{classify_intent, is_out_of_bounds, Intent, Query};

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clients::{
    GenerateOptions, GenerativeArtifact, GenerativeClient, RetrievalClient, RetrievalResult,
    WebResult, WebSearchClient,
};
use crate::config::PolicyConfig;

/// One ordered stage in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolTier {
    /// The curated vector knowledge store.
    Retrieval,
    /// The external web document-search provider.
    WebSearch,
    /// The general-purpose generative tool.
    Generative,
}

impl ToolTier {
    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolTier::Retrieval => "retrieval",
            ToolTier::WebSearch => "web_search",
            ToolTier::Generative => "generative",
        }
    }
}

impl std::fmt::Display for ToolTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An ordered sequence of tool invocations with early-exit semantics.
///
/// The tier order is data, not scattered conditionals, so tests can enumerate
/// it directly. An empty plan means the turn must be answered from static
/// self-description or conversational context alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPlan {
    /// Tiers to attempt, in priority order.
    pub tiers: Vec<ToolTier>,
}

impl ToolPlan {
    /// An empty plan: no tool may run this turn.
    pub fn empty() -> Self {
        Self { tiers: Vec::new() }
    }

    /// Whether the plan forbids any tool call.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

/// The evidence a turn's arbitration produced, tagged by originating tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ToolOutcome {
    /// Curated matches. The only authoritative variant.
    Retrieval {
        /// Ranked matches from the curated store.
        results: Vec<RetrievalResult>,
    },
    /// Web documents. Supplementary, never authoritative.
    Web {
        /// Ranked documents from the search provider.
        results: Vec<WebResult>,
    },
    /// A generative artifact.
    Generative {
        /// The produced artifact.
        artifact: GenerativeArtifact,
    },
    /// Every tier was exhausted without sufficient evidence.
    NoData,
}

impl ToolOutcome {
    /// True only for curated retrieval evidence. An authoritative outcome may
    /// not be overridden by any lower-priority tier.
    pub fn authoritative(&self) -> bool {
        matches!(self, ToolOutcome::Retrieval { .. })
    }

    /// The tier that produced this outcome, if any.
    pub fn tier(&self) -> Option<ToolTier> {
        match self {
            ToolOutcome::Retrieval { .. } => Some(ToolTier::Retrieval),
            ToolOutcome::Web { .. } => Some(ToolTier::WebSearch),
            ToolOutcome::Generative { .. } => Some(ToolTier::Generative),
            ToolOutcome::NoData => None,
        }
    }
}

/// Record of one tier invocation during arbitration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierInvocation {
    /// Which tier ran.
    pub tier: ToolTier,
    /// The input sent to the tier.
    pub input: String,
    /// Human-readable result summary for the turn log.
    pub summary: String,
    /// Whether the tier's result halted the chain.
    pub sufficient: bool,
    /// Wall-clock time spent in the tier.
    pub elapsed_ms: u64,
}

/// The full outcome of arbitrating one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrationRecord {
    /// The chosen evidence.
    pub outcome: ToolOutcome,
    /// Every tier invocation, in execution order.
    pub invocations: Vec<TierInvocation>,
}

/// The per-turn decision procedure over the three tool clients.
pub struct Arbiter {
    retrieval: Arc<dyn RetrievalClient>,
    web: Arc<dyn WebSearchClient>,
    generative: Arc<dyn GenerativeClient>,
    policy: PolicyConfig,
    tier_timeout: Duration,
}

impl Arbiter {
    /// Create a new arbiter over the given clients.
    pub fn new(
        retrieval: Arc<dyn RetrievalClient>,
        web: Arc<dyn WebSearchClient>,
        generative: Arc<dyn GenerativeClient>,
        policy: PolicyConfig,
        tier_timeout: Duration,
    ) -> Self {
        Self {
            retrieval,
            web,
            generative,
            policy,
            tier_timeout,
        }
    }

    /// Decide the ordered tool plan for a query.
    ///
    /// Non-catalog intents get an empty plan: those turns are answered from
    /// static self-description or conversational context only. Catalog
    /// intents always lead with retrieval; the generative tier is appended
    /// only when the query explicitly asks for an artifact.
    pub fn decide(&self, query: &Query) -> ToolPlan {
        match query.intent {
            Intent::MetaCapability | Intent::GeneralConceptual | Intent::Casual => {
                debug!(intent = %query.intent, "No tool plan for non-catalog intent");
                ToolPlan::empty()
            }
            Intent::DomainCatalog => {
                let mut tiers = vec![ToolTier::Retrieval, ToolTier::WebSearch];
                if query.wants_generative_artifact() {
                    tiers.push(ToolTier::Generative);
                }
                ToolPlan { tiers }
            }
        }
    }

    /// Execute a plan tier by tier, strictly in series.
    ///
    /// Each tier only runs if every prior tier was insufficient. A tier that
    /// errors or times out counts as insufficient for that tier and the chain
    /// continues; exhaustion yields [`ToolOutcome::NoData`].
    pub async fn execute(&self, query: &Query, plan: &ToolPlan) -> ArbitrationRecord {
        let mut invocations = Vec::new();

        for tier in &plan.tiers {
            let start = Instant::now();
            let (outcome, input, summary) = match tier {
                ToolTier::Retrieval => self.run_retrieval(query).await,
                ToolTier::WebSearch => self.run_web(query).await,
                ToolTier::Generative => self.run_generative(query).await,
            };
            let elapsed_ms = start.elapsed().as_millis() as u64;
            let sufficient = outcome.is_some();

            invocations.push(TierInvocation {
                tier: *tier,
                input,
                summary,
                sufficient,
                elapsed_ms,
            });

            if let Some(outcome) = outcome {
                info!(
                    tier = %tier,
                    authoritative = outcome.authoritative(),
                    elapsed_ms,
                    "Tier sufficient, halting fallback chain"
                );
                return ArbitrationRecord {
                    outcome,
                    invocations,
                };
            }

            info!(tier = %tier, elapsed_ms, "Tier insufficient, falling through");
        }

        ArbitrationRecord {
            outcome: ToolOutcome::NoData,
            invocations,
        }
    }

    /// Rewrite the query into hypothetical-answer form for similarity search.
    fn expand_query(&self, text: &str) -> String {
        if self.policy.expand_queries {
            format!("A curated concierge entry answering: {}", text)
        } else {
            text.to_string()
        }
    }

    async fn run_retrieval(&self, query: &Query) -> (Option<ToolOutcome>, String, String) {
        let input = self.expand_query(&query.text);

        let results = match tokio::time::timeout(self.tier_timeout, self.retrieval.search(&input))
            .await
        {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                warn!(error = %e, "Retrieval tier failed, treating as insufficient");
                return (None, input, format!("retrieval failed: {}", e));
            }
            Err(_) => {
                warn!("Retrieval tier timed out, treating as insufficient");
                return (None, input, "retrieval timed out".to_string());
            }
        };

        if self.retrieval_sufficient(&results) {
            let summary = format!(
                "{} curated matches, top score {:.2}",
                results.len(),
                results.first().map(|r| r.similarity_score).unwrap_or(0.0)
            );
            (Some(ToolOutcome::Retrieval { results }), input, summary)
        } else {
            let summary = format!("{} curated matches, none sufficient", results.len());
            (None, input, summary)
        }
    }

    async fn run_web(&self, query: &Query) -> (Option<ToolOutcome>, String, String) {
        let input = query.text.clone();

        let results = match tokio::time::timeout(self.tier_timeout, self.web.search(&input)).await {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                warn!(error = %e, "Web tier failed, treating as insufficient");
                return (None, input, format!("web search failed: {}", e));
            }
            Err(_) => {
                warn!("Web tier timed out, treating as insufficient");
                return (None, input, "web search timed out".to_string());
            }
        };

        if web_sufficient(&query.text, &results) {
            let summary = format!("{} web documents", results.len());
            (Some(ToolOutcome::Web { results }), input, summary)
        } else {
            let summary = format!("{} web documents, none topical", results.len());
            (None, input, summary)
        }
    }

    async fn run_generative(&self, query: &Query) -> (Option<ToolOutcome>, String, String) {
        let input = query.text.clone();
        let options = GenerateOptions::default();

        match tokio::time::timeout(self.tier_timeout, self.generative.generate(&input, &options))
            .await
        {
            Ok(Ok(artifact)) => {
                let summary = format!("artifact at {}", artifact.artifact_url);
                (Some(ToolOutcome::Generative { artifact }), input, summary)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Generative tier failed, treating as insufficient");
                (None, input, format!("generation failed: {}", e))
            }
            Err(_) => {
                warn!("Generative tier timed out, treating as insufficient");
                (None, input, "generation timed out".to_string())
            }
        }
    }

    /// Sufficiency test for curated matches.
    ///
    /// Strict mode: at least one match at or above the score threshold.
    /// Loose mode (`accept_weak_matches`): any non-trivial match. Exactly one
    /// policy is active per run.
    fn retrieval_sufficient(&self, results: &[RetrievalResult]) -> bool {
        if self.policy.accept_weak_matches {
            results
                .iter()
                .any(|r| r.text.trim().len() >= self.policy.min_result_chars)
        } else {
            results
                .iter()
                .any(|r| r.similarity_score >= self.policy.sufficiency_threshold)
        }
    }
}

/// Qualitative sufficiency for web documents: non-empty and topically
/// matching the query by keyword overlap.
fn web_sufficient(query_text: &str, results: &[WebResult]) -> bool {
    if results.is_empty() {
        return false;
    }

    let keywords = topical_keywords(query_text);
    if keywords.is_empty() {
        return true;
    }

    results.iter().any(|r| {
        let haystack = format!("{} {}", r.title, r.snippet).to_lowercase();
        keywords.iter().any(|k| haystack.contains(k.as_str()))
    })
}

const STOPWORDS: &[&str] = &[
    "with", "that", "this", "from", "have", "what", "where", "when", "which", "about", "would",
    "could", "there", "their", "some", "please", "recommend", "suggest", "plan",
];

/// Extract lowercase content words worth matching on.
fn topical_keywords(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 4 && !STOPWORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}
