//! Answer composition and citation discipline.
//!
//! Every externally sourced factual line must carry an inline markdown
//! citation `[n](url)`. Labels are numbered in order of first use and stable
//! within a turn. A bracketed label without a resolvable URL is a composition
//! violation and is rejected before delivery, never emitted.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arbiter::{Intent, Query, ToolOutcome};
use crate::clients::{GenerativeArtifact, RetrievalResult, WebResult};
use crate::error::{ComposeError, ComposeResult};
use crate::prompts;

/// How many curated matches a single answer draws on at most.
const MAX_CITED_RESULTS: usize = 3;

/// Maximum snippet length quoted from a web document.
const MAX_SNIPPET_CHARS: usize = 240;

/// An inline citation: numeric label plus resolvable URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based label, in order of first use.
    pub label: u32,
    /// The cited URL.
    pub url: String,
}

/// A composed answer ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerDraft {
    /// Markdown answer text with inline citations.
    pub text: String,
    /// Citations in label order.
    pub citations: Vec<Citation>,
}

/// Formats arbitration evidence into cited answer drafts.
#[derive(Debug, Clone)]
pub struct Composer {
    catalog_base_url: String,
}

impl Composer {
    /// Create a composer resolving curated source ids against the given base URL.
    pub fn new(catalog_base_url: &str) -> Self {
        Self {
            catalog_base_url: catalog_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Compose an answer from tool evidence.
    ///
    /// The curated-source-wins rule is enforced upstream: whatever single
    /// outcome the arbiter halted on is the only evidence composed here.
    pub fn compose(&self, query: &Query, outcome: &ToolOutcome) -> ComposeResult<AnswerDraft> {
        let draft = match outcome {
            ToolOutcome::Retrieval { results } => self.compose_curated(results)?,
            ToolOutcome::Web { results } => self.compose_web(results)?,
            ToolOutcome::Generative { artifact } => compose_artifact(artifact),
            ToolOutcome::NoData => AnswerDraft {
                text: prompts::NO_DATA_DISCLOSURE.to_string(),
                citations: Vec::new(),
            },
        };

        for citation in &draft.citations {
            if !citation.url.starts_with("http") {
                return Err(ComposeError::MissingCitationUrl {
                    label: citation.label,
                });
            }
        }
        validate_citations(&draft.text)?;

        debug!(
            intent = %query.intent,
            citations = draft.citations.len(),
            "Answer draft composed"
        );
        Ok(draft)
    }

    /// Compose an answer for a turn whose plan was empty (no tool allowed).
    ///
    /// Meta turns answer from the static self-description; casual and
    /// conceptual turns answer from conversational context. No citations.
    pub fn compose_untooled(&self, query: &Query) -> AnswerDraft {
        let text = match query.intent {
            Intent::MetaCapability => prompts::CAPABILITIES,
            Intent::Casual => prompts::CASUAL_REPLY,
            Intent::GeneralConceptual => prompts::CONCEPTUAL_REPLY,
            // A catalog query should never reach here; disclose rather than invent.
            Intent::DomainCatalog => prompts::NO_DATA_DISCLOSURE,
        };
        AnswerDraft {
            text: text.to_string(),
            citations: Vec::new(),
        }
    }

    fn compose_curated(&self, results: &[RetrievalResult]) -> ComposeResult<AnswerDraft> {
        if results.is_empty() {
            return Err(ComposeError::EmptyEvidence {
                message: "curated outcome carried no matches".to_string(),
            });
        }

        let mut citations: Vec<Citation> = Vec::new();
        let mut lines = vec!["From the curated collection:".to_string(), String::new()];

        for result in results.iter().take(MAX_CITED_RESULTS) {
            let url = self.resolve_source_url(&result.source_id);
            let label = cite(&mut citations, url);
            lines.push(format!(
                "- {} [{}]({})",
                result.text.trim(),
                label,
                citations[(label - 1) as usize].url
            ));
            if let Some(media) = &result.media_ref {
                lines.push(format!("  ![{}]({})", result.source_id, media));
            }
        }

        Ok(AnswerDraft {
            text: lines.join("\n"),
            citations,
        })
    }

    fn compose_web(&self, results: &[WebResult]) -> ComposeResult<AnswerDraft> {
        if results.is_empty() {
            return Err(ComposeError::EmptyEvidence {
                message: "web outcome carried no documents".to_string(),
            });
        }

        let mut citations: Vec<Citation> = Vec::new();
        let mut lines = vec![
            "My curated collection is quiet on this one; here is what careful external research \
             suggests:"
                .to_string(),
            String::new(),
        ];

        for result in results.iter().take(MAX_CITED_RESULTS) {
            let label = cite(&mut citations, result.url.clone());
            let snippet = truncate(result.snippet.trim(), MAX_SNIPPET_CHARS);
            if snippet.is_empty() {
                lines.push(format!("- {} [{}]({})", result.title, label, result.url));
            } else {
                lines.push(format!(
                    "- {}: {} [{}]({})",
                    result.title, snippet, label, result.url
                ));
            }
        }

        Ok(AnswerDraft {
            text: lines.join("\n"),
            citations,
        })
    }

    /// Resolve a curated source id into a citable URL.
    fn resolve_source_url(&self, source_id: &str) -> String {
        if source_id.starts_with("http://") || source_id.starts_with("https://") {
            source_id.to_string()
        } else {
            format!("{}/{}", self.catalog_base_url, source_id)
        }
    }
}

fn compose_artifact(artifact: &GenerativeArtifact) -> AnswerDraft {
    AnswerDraft {
        text: format!(
            "Here is the image you asked for.\n\n![{}]({})",
            artifact.prompt.trim(),
            artifact.artifact_url
        ),
        citations: Vec::new(),
    }
}

/// Register a URL in the citation list, reusing the label on repeat use.
fn cite(citations: &mut Vec<Citation>, url: String) -> u32 {
    if let Some(existing) = citations.iter().find(|c| c.url == url) {
        return existing.label;
    }
    let label = citations.len() as u32 + 1;
    citations.push(Citation { label, url });
    label
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut.trim_end())
    }
}

/// Reject drafts containing a bare numeric citation label.
///
/// Scans for `[n]` where `n` parses as an integer; each one must be followed
/// immediately by a non-empty `(url)`. Non-numeric brackets (image alt text,
/// the truncation marker) are ignored.
pub fn validate_citations(text: &str) -> ComposeResult<()> {
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'[' {
            if let Some(close) = text[i + 1..].find(']').map(|o| i + 1 + o) {
                let inner = &text[i + 1..close];
                if let Ok(label) = inner.parse::<u32>() {
                    let rest = &text[close + 1..];
                    let followed_by_url = rest.starts_with('(')
                        && rest[1..]
                            .find(')')
                            .map(|end| !rest[1..1 + end].trim().is_empty())
                            .unwrap_or(false);
                    if !followed_by_url {
                        return Err(ComposeError::BareCitation { label });
                    }
                }
                i = close + 1;
                continue;
            }
        }
        i += 1;
    }

    Ok(())
}
