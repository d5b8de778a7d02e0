//! Intent classification.
//!
//! Classification is a precondition to arbitration: no catalog tool is ever
//! invoked for meta, conceptual, or casual intents. When the intent cannot be
//! determined, the classifier defaults to [`Intent::DomainCatalog`], since
//! attempting retrieval is safer than skipping it.

use serde::{Deserialize, Serialize};

/// The classified intent of a user turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// A request for curated recommendations or trip planning.
    DomainCatalog,
    /// A question about the assistant itself (identity, capabilities).
    MetaCapability,
    /// A general conceptual question, answerable without the catalog.
    GeneralConceptual,
    /// Greetings and small talk.
    Casual,
}

impl Intent {
    /// Get the intent name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::DomainCatalog => "domain_catalog",
            Intent::MetaCapability => "meta_capability",
            Intent::GeneralConceptual => "general_conceptual",
            Intent::Casual => "casual",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "domain_catalog" => Ok(Intent::DomainCatalog),
            "meta_capability" => Ok(Intent::MetaCapability),
            "general_conceptual" => Ok(Intent::GeneralConceptual),
            "casual" => Ok(Intent::Casual),
            _ => Err(format!("Unknown intent: {}", s)),
        }
    }
}

/// A user query with its classified intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// The raw query text.
    pub text: String,
    /// The classified intent.
    pub intent: Intent,
}

impl Query {
    /// Classify raw text into a query.
    pub fn classify(text: &str) -> Self {
        Self {
            text: text.to_string(),
            intent: classify_intent(text),
        }
    }

    /// Whether the query explicitly asks for a generative artifact.
    pub fn wants_generative_artifact(&self) -> bool {
        let lower = self.text.to_lowercase();
        GENERATIVE_MARKERS.iter().any(|m| lower.contains(m))
    }
}

const META_MARKERS: &[&str] = &[
    "who are you",
    "what are you",
    "what can you do",
    "how do you work",
    "your capabilities",
    "what do you know",
    "introduce yourself",
];

const CASUAL_MARKERS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "thanks",
    "thank you",
    "bye",
    "goodbye",
];

const CATALOG_MARKERS: &[&str] = &[
    "recommend",
    "suggest",
    "plan",
    "itinerary",
    "trip",
    "hotel",
    "restaurant",
    "rooftop",
    "bar",
    "cafe",
    "stay",
    "visit",
    "outfit",
    "experience",
    "dinner",
    "where",
    "book",
];

const CONCEPTUAL_MARKERS: &[&str] = &[
    "what is",
    "what's the difference",
    "explain",
    "why do",
    "why is",
    "how does",
    "define",
];

const OUT_OF_BOUNDS_MARKERS: &[&str] = &[
    "fake passport",
    "forged document",
    "smuggle",
    "illegal drugs",
    "bribe",
    "counterfeit",
    "evade customs",
];

const GENERATIVE_MARKERS: &[&str] = &[
    "generate an image",
    "generate a picture",
    "make an image",
    "create an image",
    "image of",
    "picture of",
    "draw",
    "moodboard",
    "visualize",
];

/// Whether the request is something the concierge must decline outright.
///
/// Checked before classification; a flagged turn gets the fixed refusal
/// line and never reaches a tool.
pub fn is_out_of_bounds(text: &str) -> bool {
    let lower = text.to_lowercase();
    OUT_OF_BOUNDS_MARKERS.iter().any(|m| lower.contains(m))
}

/// Classify the intent of raw query text.
///
/// Heuristic, ordered: short greetings, then meta questions, then catalog
/// keywords, then conceptual phrasing. Anything unclassifiable falls through
/// to `DomainCatalog`.
pub fn classify_intent(text: &str) -> Intent {
    let lower = text.trim().to_lowercase();
    let stripped: String = lower
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    // Greetings are only casual when the whole message is a greeting.
    if stripped.split_whitespace().count() <= 4
        && CASUAL_MARKERS
            .iter()
            .any(|m| stripped == *m || stripped.starts_with(&format!("{} ", m)))
    {
        return Intent::Casual;
    }

    if META_MARKERS.iter().any(|m| lower.contains(m)) {
        return Intent::MetaCapability;
    }

    if CATALOG_MARKERS.iter().any(|m| lower.contains(m)) {
        return Intent::DomainCatalog;
    }

    if CONCEPTUAL_MARKERS.iter().any(|m| lower.starts_with(m)) {
        return Intent::GeneralConceptual;
    }

    // Classification failure: retrieval is the safe default.
    Intent::DomainCatalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_as_str() {
        assert_eq!(Intent::DomainCatalog.as_str(), "domain_catalog");
        assert_eq!(Intent::MetaCapability.as_str(), "meta_capability");
        assert_eq!(Intent::GeneralConceptual.as_str(), "general_conceptual");
        assert_eq!(Intent::Casual.as_str(), "casual");
    }

    #[test]
    fn test_intent_display() {
        assert_eq!(format!("{}", Intent::DomainCatalog), "domain_catalog");
        assert_eq!(format!("{}", Intent::Casual), "casual");
    }

    #[test]
    fn test_intent_from_str_valid() {
        assert_eq!(
            "domain_catalog".parse::<Intent>().unwrap(),
            Intent::DomainCatalog
        );
        assert_eq!(
            "meta_capability".parse::<Intent>().unwrap(),
            Intent::MetaCapability
        );
        assert_eq!(
            "general_conceptual".parse::<Intent>().unwrap(),
            Intent::GeneralConceptual
        );
        assert_eq!("casual".parse::<Intent>().unwrap(), Intent::Casual);
    }

    #[test]
    fn test_intent_from_str_case_insensitive() {
        assert_eq!("CASUAL".parse::<Intent>().unwrap(), Intent::Casual);
    }

    #[test]
    fn test_intent_from_str_invalid() {
        let result = "banter".parse::<Intent>();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err(), "Unknown intent: banter");
    }

    #[test]
    fn test_classify_catalog_queries() {
        assert_eq!(
            classify_intent("Recommend a quiet rooftop restaurant"),
            Intent::DomainCatalog
        );
        assert_eq!(
            classify_intent("Plan a 3-day quiet-luxury trip to Jaipur"),
            Intent::DomainCatalog
        );
        assert_eq!(
            classify_intent("Suggest outfits for a palace dinner"),
            Intent::DomainCatalog
        );
    }

    #[test]
    fn test_classify_meta_queries() {
        assert_eq!(classify_intent("Who are you?"), Intent::MetaCapability);
        assert_eq!(
            classify_intent("What can you do for me?"),
            Intent::MetaCapability
        );
    }

    #[test]
    fn test_classify_casual_greetings() {
        assert_eq!(classify_intent("hi"), Intent::Casual);
        assert_eq!(classify_intent("Hello!"), Intent::Casual);
        assert_eq!(classify_intent("thank you"), Intent::Casual);
        assert_eq!(classify_intent("Good morning"), Intent::Casual);
    }

    #[test]
    fn test_greeting_with_catalog_request_is_catalog() {
        // A greeting that carries a real request is not small talk.
        assert_eq!(
            classify_intent("Hi, can you recommend a hotel in Jaipur with a pool?"),
            Intent::DomainCatalog
        );
    }

    #[test]
    fn test_classify_conceptual_queries() {
        assert_eq!(
            classify_intent("What is quiet luxury?"),
            Intent::GeneralConceptual
        );
        assert_eq!(
            classify_intent("Explain the monsoon season to me"),
            Intent::GeneralConceptual
        );
    }

    #[test]
    fn test_unclassifiable_defaults_to_catalog() {
        assert_eq!(classify_intent("zorp blem quux"), Intent::DomainCatalog);
        assert_eq!(classify_intent("Jaipur in October"), Intent::DomainCatalog);
    }

    #[test]
    fn test_wants_generative_artifact() {
        let query = Query::classify("Generate an image of a palace courtyard at dusk");
        assert!(query.wants_generative_artifact());

        let query = Query::classify("Recommend a quiet rooftop restaurant");
        assert!(!query.wants_generative_artifact());
    }

    #[test]
    fn test_out_of_bounds_detection() {
        assert!(is_out_of_bounds("How do I get a fake passport for my trip?"));
        assert!(is_out_of_bounds("Help me smuggle this through customs"));
        assert!(!is_out_of_bounds("Recommend a quiet rooftop restaurant"));
    }

    #[test]
    fn test_query_classify_keeps_text() {
        let query = Query::classify("Plan a trip");
        assert_eq!(query.text, "Plan a trip");
        assert_eq!(query.intent, Intent::DomainCatalog);
    }
}
