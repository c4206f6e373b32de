//! Domain-parameterized query processor.
//!
//! One [`QueryEngine`] serves one domain (career guidance or HR policy);
//! the two deployments differ only in their [`DomainProfile`] copy and
//! whether the small-talk short-circuit is enabled. The processing state
//! machine is linear:
//!
//! validate → (small-talk short-circuit) → embed → retrieve → drop
//! matches below the similarity floor → compose context → generate → trim.
//!
//! [`QueryEngine::process`] returns a tagged [`QueryOutcome`] so callers
//! and tests can assert on the terminal state; [`QueryEngine::answer`] is
//! total and converts every outcome into a user-facing string. Upstream
//! failures (embedder, index, generator) are caught at each call boundary,
//! logged to stderr, and degrade to a polite fallback message — the HTTP
//! layer never sees an error and never leaks internals.

use std::sync::Arc;

use crate::embedding::Embedder;
use crate::generate::{build_prompt, Generator};
use crate::index::VectorIndex;
use crate::models::ScoredMatch;

/// Conversational tokens that short-circuit retrieval in the career domain.
///
/// Matching is exact or prefix, after lowercasing and trimming.
const SMALL_TALK_TOKENS: &[&str] = &[
    "hi", "hello", "hey", "thanks", "thank you", "ok", "okay", "cool", "nice", "great", "good",
    "awesome", "fine", "got it",
];

const EMPTY_GENERATION_MESSAGE: &str =
    "Unable to generate a response at the moment. Please try again.";

const UPSTREAM_FAILURE_MESSAGE: &str =
    "Something went wrong while answering your question. Please try again in a moment.";

/// Small-talk short-circuit rule: a token table plus the fixed reply.
#[derive(Debug, Clone)]
pub struct SmallTalkRule {
    pub tokens: Vec<String>,
    pub reply: String,
}

impl SmallTalkRule {
    fn matches(&self, question: &str) -> bool {
        let q = question.to_lowercase();
        let q = q.trim();
        self.tokens
            .iter()
            .any(|t| q == t.as_str() || q.starts_with(t.as_str()))
    }
}

/// Per-domain copy and behavior for a [`QueryEngine`].
#[derive(Debug, Clone)]
pub struct DomainProfile {
    pub name: String,
    pub validation_message: String,
    pub no_match_message: String,
    /// `Some` enables the small-talk short-circuit (career only).
    pub small_talk: Option<SmallTalkRule>,
}

impl DomainProfile {
    /// The career-guidance assistant: greets back, nudges toward career topics.
    pub fn career() -> Self {
        Self {
            name: "career".to_string(),
            validation_message: "Please ask a valid career-related question.".to_string(),
            no_match_message: "I can help with career guidance such as qualifications, skills, \
                               roadmaps, and job roles. Please ask a related question."
                .to_string(),
            small_talk: Some(SmallTalkRule {
                tokens: SMALL_TALK_TOKENS.iter().map(|s| s.to_string()).collect(),
                reply: "You're welcome 🙂 Feel free to ask any career-related questions!"
                    .to_string(),
            }),
        }
    }

    /// The HR-policy assistant: no short-circuit, every non-empty question
    /// reaches retrieval.
    pub fn hr() -> Self {
        Self {
            name: "hr".to_string(),
            validation_message: "Please ask a valid HR policy question.".to_string(),
            no_match_message: "I can help with HR policies such as leave, attendance, working \
                               hours, and benefits. Please ask a related question."
                .to_string(),
            small_talk: None,
        }
    }

    /// Resolve a profile by name with optional message overrides from config.
    pub fn resolve(
        name: &str,
        validation_override: Option<&str>,
        no_match_override: Option<&str>,
    ) -> anyhow::Result<Self> {
        let mut profile = match name {
            "career" => Self::career(),
            "hr" => Self::hr(),
            other => anyhow::bail!("Unknown domain profile: {}", other),
        };
        if let Some(msg) = validation_override {
            profile.validation_message = msg.to_string();
        }
        if let Some(msg) = no_match_override {
            profile.no_match_message = msg.to_string();
        }
        Ok(profile)
    }
}

/// Terminal state of one query, before conversion to user-facing copy.
#[derive(Debug)]
pub enum QueryOutcome {
    /// The generator produced usable text (already trimmed).
    Answered(String),
    /// Empty or whitespace-only question.
    EmptyQuestion,
    /// Career-domain conversational token; retrieval was skipped.
    SmallTalk,
    /// Nothing sufficiently similar: the index returned no entries, or
    /// every match fell below the similarity floor.
    NoMatches,
    /// The generator returned empty/whitespace output.
    EmptyGeneration,
    /// An embedder, index, or generator call failed.
    Upstream(anyhow::Error),
}

/// Join retrieved chunk texts into one context block, preserving the
/// similarity-ranked order (best match first).
pub fn assemble_context(matches: &[ScoredMatch]) -> String {
    matches
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The retrieval-augmented query pipeline for one domain.
///
/// Holds shared handles to the process-wide embedder, index, and
/// generator; each call to [`answer`](Self::answer) is self-contained and
/// carries no state across requests.
pub struct QueryEngine {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn Generator>,
    profile: DomainProfile,
    top_k: usize,
    min_score: f32,
}

impl QueryEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
        profile: DomainProfile,
        top_k: usize,
        min_score: f32,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            profile,
            top_k,
            min_score,
        }
    }

    pub fn profile(&self) -> &DomainProfile {
        &self.profile
    }

    /// Run the pipeline and return the tagged terminal state.
    pub async fn process(&self, question: &str) -> QueryOutcome {
        let question = question.trim();
        if question.is_empty() {
            return QueryOutcome::EmptyQuestion;
        }

        if let Some(rule) = &self.profile.small_talk {
            if rule.matches(question) {
                return QueryOutcome::SmallTalk;
            }
        }

        let vector = match self.embedder.embed_query(question).await {
            Ok(v) => v,
            Err(e) => return QueryOutcome::Upstream(e.context("embedding the question")),
        };

        let mut matches = match self.index.query(&vector, self.top_k).await {
            Ok(m) => m,
            Err(e) => return QueryOutcome::Upstream(e.context("querying the vector index")),
        };

        // Index backends rank but never reject; a populated index always
        // returns something. The similarity floor is what decides that a
        // question is off-topic.
        matches.retain(|m| m.score >= self.min_score);

        if matches.is_empty() {
            return QueryOutcome::NoMatches;
        }

        let context = assemble_context(&matches);
        let prompt = build_prompt(question, &context);

        let output = match self.generator.complete(&prompt).await {
            Ok(o) => o,
            Err(e) => return QueryOutcome::Upstream(e.context("generating the answer")),
        };

        let output = output.trim();
        if output.is_empty() {
            return QueryOutcome::EmptyGeneration;
        }

        QueryOutcome::Answered(output.to_string())
    }

    /// Total entry point: every outcome becomes a plain string, matching
    /// the single response shape at the HTTP boundary.
    pub async fn answer(&self, question: &str) -> String {
        match self.process(question).await {
            QueryOutcome::Answered(text) => text,
            QueryOutcome::EmptyQuestion => self.profile.validation_message.clone(),
            QueryOutcome::SmallTalk => self
                .profile
                .small_talk
                .as_ref()
                .map(|r| r.reply.clone())
                .unwrap_or_else(|| self.profile.validation_message.clone()),
            QueryOutcome::NoMatches => self.profile.no_match_message.clone(),
            QueryOutcome::EmptyGeneration => EMPTY_GENERATION_MESSAGE.to_string(),
            QueryOutcome::Upstream(err) => {
                eprintln!("[{}] upstream failure: {:#}", self.profile.name, err);
                UPSTREAM_FAILURE_MESSAGE.to_string()
            }
        }
    }
}
