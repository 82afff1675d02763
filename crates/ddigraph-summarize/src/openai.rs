//! OpenAI-compatible chat-completions provider.

use crate::{summary_instructions, ReactionSummarizer, SummarizerConfig, SummaryError};
use serde_json::{json, Value};

pub struct OpenAiSummarizer {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiSummarizer {
    /// `None` when no API key is configured.
    pub fn from_config(config: &SummarizerConfig) -> Result<Option<Self>, SummaryError> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SummaryError::Unavailable(format!("failed to build http client: {e}")))?;
        Ok(Some(Self {
            client,
            url: format!("{}/v1/chat/completions", normalize_base_url(&config.base_url)),
            api_key,
            model: config.model.clone(),
        }))
    }
}

impl ReactionSummarizer for OpenAiSummarizer {
    fn summarize(&self, term: &str) -> Result<String, SummaryError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": summary_instructions() },
                { "role": "user", "content": format!("Summarize the reaction: {term}") },
            ],
        });

        tracing::debug!(model = %self.model, term, "requesting reaction summary");
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| SummaryError::Http(format!("failed to reach {}: {e}", self.url)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(SummaryError::Http(format!("{status}: {text}")));
        }
        let value: Value = resp
            .json()
            .map_err(|e| SummaryError::InvalidResponse(e.to_string()))?;
        extract_message_text(&value)
            .ok_or_else(|| SummaryError::InvalidResponse("no message content".into()))
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let mut host = base_url.trim().to_string();
    if host.is_empty() {
        host = crate::DEFAULT_BASE_URL.to_string();
    }
    if !host.starts_with("http://") && !host.starts_with("https://") {
        host = format!("https://{host}");
    }
    host.trim_end_matches('/').to_string()
}

fn extract_message_text(v: &Value) -> Option<String> {
    let text = v
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()?
        .trim();
    (!text.is_empty()).then(|| text.to_string())
}
