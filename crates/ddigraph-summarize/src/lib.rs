//! Reaction summarization as an injected capability.
//!
//! Callers hold an `Option<&dyn ReactionSummarizer>`; when no provider is
//! configured, or the provider fails, they get [`FALLBACK_SUMMARY`] instead of
//! an error. Nothing in the graph or query path depends on this crate.

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAiSummarizer;

use std::collections::HashMap;
use std::time::Duration;

pub const API_KEY_ENV: &str = "DDIGRAPH_OPENAI_API_KEY";
pub const MODEL_ENV: &str = "DDIGRAPH_SUMMARY_MODEL";
pub const BASE_URL_ENV: &str = "DDIGRAPH_OPENAI_BASE_URL";
pub const TIMEOUT_SECS_ENV: &str = "DDIGRAPH_SUMMARY_TIMEOUT_SECS";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Returned whenever no summary can be produced.
pub const FALLBACK_SUMMARY: &str =
    "Reaction summaries are unavailable. Set DDIGRAPH_OPENAI_API_KEY to enable this functionality.";

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("summarizer unavailable: {0}")]
    Unavailable(String),
    #[error("summary request failed: {0}")]
    Http(String),
    #[error("invalid summary response: {0}")]
    InvalidResponse(String),
}

/// `summarize(term) -> text`.
pub trait ReactionSummarizer: Send + Sync {
    fn summarize(&self, term: &str) -> Result<String, SummaryError>;
}

/// Summarize `term`, degrading to [`FALLBACK_SUMMARY`] on any failure.
pub fn summarize_or_fallback(summarizer: Option<&dyn ReactionSummarizer>, term: &str) -> String {
    let term = term.trim();
    let Some(summarizer) = summarizer else {
        return FALLBACK_SUMMARY.to_string();
    };
    if term.is_empty() {
        return FALLBACK_SUMMARY.to_string();
    }
    match summarizer.summarize(term) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            tracing::warn!(term, "summarizer returned empty text");
            FALLBACK_SUMMARY.to_string()
        }
        Err(err) => {
            tracing::warn!(term, error = %err, "summarizer failed");
            FALLBACK_SUMMARY.to_string()
        }
    }
}

/// The instruction sent to text-generation providers.
pub fn summary_instructions() -> &'static str {
    "Provide a brief summary and the severity of the named medical reaction. \
     Always answer in exactly this format and nothing else:\n\
     Summary of <reaction_name>: <summary> (severity level: <severity_level>)"
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizerConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl SummarizerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();
        let timeout = match get(TIMEOUT_SECS_ENV).map(|v| v.parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => Duration::from_secs(secs),
            Some(_) => {
                tracing::warn!(var = TIMEOUT_SECS_ENV, "ignoring invalid timeout");
                defaults.timeout
            }
            None => defaults.timeout,
        };
        Self {
            api_key: get(API_KEY_ENV),
            model: get(MODEL_ENV).unwrap_or(defaults.model),
            base_url: get(BASE_URL_ENV).unwrap_or(defaults.base_url),
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

// ============================================================================
// Static provider
// ============================================================================

/// Canned answers keyed by reaction name (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct StaticSummarizer {
    answers: HashMap<String, String>,
}

impl StaticSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, term: &str, summary: impl Into<String>) -> Self {
        self.answers.insert(term.to_lowercase(), summary.into());
        self
    }
}

impl ReactionSummarizer for StaticSummarizer {
    fn summarize(&self, term: &str) -> Result<String, SummaryError> {
        self.answers
            .get(&term.to_lowercase())
            .cloned()
            .ok_or_else(|| SummaryError::Unavailable(format!("no canned summary for `{term}`")))
    }
}
