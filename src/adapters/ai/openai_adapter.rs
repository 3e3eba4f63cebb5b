//! OpenAI-compatible adapter for structured event suggestion.
//!
//! Works against OpenAI, OpenRouter, and any chat-completions-compatible API.
//! Implements `SuggestionPort` with JSON-mode output and fence stripping.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{DomainError, EventDraft};
use crate::ports::SuggestionPort;

const MAX_OUTPUT_TOKENS: u32 = 1200;
/// How much of an error body / bad reply to keep in logs and messages.
const SNIPPET_LEN: usize = 200;

/// OpenAI-compatible suggestion adapter.
///
/// Points at any chat-completions endpoint: api.openai.com, openrouter.ai,
/// or a local server speaking the same protocol.
pub struct OpenAiAdapter {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    extra_headers: Vec<(String, String)>,
}

impl OpenAiAdapter {
    /// Create a new adapter.
    ///
    /// # Arguments
    /// * `api_url` - Full endpoint, e.g. "https://api.openai.com/v1/chat/completions"
    /// * `api_key` - Bearer token
    /// * `model` - Model name (e.g., "gpt-4o-mini")
    /// * `temperature` - Sampling temperature
    pub fn new(api_url: String, api_key: String, model: String, temperature: f32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            model,
            temperature,
            extra_headers: Vec::new(),
        }
    }

    /// OpenRouter variant: same wire protocol, different host, plus the
    /// attribution header OpenRouter asks clients to send.
    pub fn for_openrouter(
        api_url: String,
        api_key: String,
        model: String,
        temperature: f32,
    ) -> Self {
        let mut adapter = Self::new(api_url, api_key, model, temperature);
        adapter
            .extra_headers
            .push(("X-Title".to_string(), "cal-sync".to_string()));
        adapter
    }

    fn system_prompt() -> &'static str {
        r#"You are a scheduling assistant. Turn the user's instruction into calendar event candidates.

Respond with valid JSON only. No markdown, no explanations outside JSON.

```json
{
  "candidates": [
    {
      "title": "Event title",
      "description": "Optional longer description (or null)",
      "start": "ISO-8601 date-time, offset optional",
      "end": "ISO-8601 date-time, offset optional",
      "timezone": "IANA zone name, or empty to use the request zone",
      "location": "Optional place (or null)",
      "attendees": [{"email": "person@example.com", "optional": false}],
      "reminders": [{"method": "popup|email", "minutes_before": 15}],
      "recurrence": {"rrule": "RRULE:... (or null)"},
      "source": "One short sentence on why this event exists"
    }
  ]
}
```

Interpret relative phrases ("tomorrow", "next week") against the provided Now and Timezone.
If the instruction yields no schedulable event, return an empty candidates array."#
    }

    fn user_prompt(instruction: &str, now_iso: &str, timezone: &str) -> String {
        format!(
            "Instruction:\n{instruction}\n\nNow = {now_iso}\nTimezone = {timezone}\nReturn ONLY valid JSON for the candidate list."
        )
    }

    /// Extract the JSON object from a model reply that may be fenced or
    /// surrounded by prose.
    fn extract_json(reply: &str) -> String {
        let body = strip_code_fence(reply.trim());
        match (body.find('{'), body.rfind('}')) {
            (Some(open), Some(close)) if open < close => body[open..=close].to_string(),
            _ => body.to_string(),
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag on the opening fence, then the closing fence
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_LEN).collect()
}

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<PromptMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct PromptMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

/// Parsed model reply (matches our JSON schema).
#[derive(Deserialize)]
struct SuggestionPayload {
    #[serde(default)]
    candidates: Vec<EventDraft>,
}

#[async_trait::async_trait]
impl SuggestionPort for OpenAiAdapter {
    async fn suggest_events(
        &self,
        instruction: &str,
        now_iso: &str,
        timezone: &str,
    ) -> Result<Vec<EventDraft>, DomainError> {
        info!(
            model = %self.model,
            instruction_len = instruction.len(),
            zone = timezone,
            "requesting event suggestions"
        );

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                PromptMessage {
                    role: "system",
                    content: Self::system_prompt().to_string(),
                },
                PromptMessage {
                    role: "user",
                    content: Self::user_prompt(instruction, now_iso, timezone),
                },
            ],
            temperature: self.temperature,
            max_tokens: MAX_OUTPUT_TOKENS,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let mut pending = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request);
        for (name, value) in &self.extra_headers {
            pending = pending.header(name, value);
        }

        let response = pending
            .send()
            .await
            .map_err(|e| DomainError::Provider(format!("request to LLM endpoint failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "LLM endpoint returned error");
            return Err(DomainError::Provider(format!(
                "LLM endpoint error {}: {}",
                status,
                snippet(&body)
            )));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            DomainError::Provider(format!("unparseable completion response: {}", e))
        })?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| DomainError::Provider("completion carried no choices".to_string()))?;

        debug!(reply_len = reply.len(), "received model reply");

        let clean = Self::extract_json(&reply);
        let payload: SuggestionPayload = serde_json::from_str(&clean).map_err(|e| {
            warn!(error = %e, json = %snippet(&clean), "model reply is not our schema");
            DomainError::Provider(format!("model reply is not valid suggestion JSON: {}", e))
        })?;

        info!(candidates = payload.candidates.len(), "suggestions received");

        Ok(payload.candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReminderMethod;

    #[test]
    fn test_extract_json_passthrough() {
        let clean = r#"{"candidates": []}"#;
        assert_eq!(OpenAiAdapter::extract_json(clean), clean);
    }

    #[test]
    fn test_extract_json_strips_fences() {
        for fenced in [
            "```json\n{\"candidates\": []}\n```",
            "```\n{\"candidates\": []}\n```",
        ] {
            assert_eq!(OpenAiAdapter::extract_json(fenced), r#"{"candidates": []}"#);
        }
    }

    #[test]
    fn test_extract_json_ignores_prose() {
        let wrapped = "Here you go:\n{\"candidates\": []}\nHope this helps!";
        assert_eq!(OpenAiAdapter::extract_json(wrapped), r#"{"candidates": []}"#);
    }

    #[test]
    fn test_payload_parses_loose_drafts() {
        let raw = r#"{
            "candidates": [{
                "title": "Standup",
                "start": "2025-05-20T09:00:00",
                "end": "2025-05-20T09:00:00",
                "timezone": "",
                "reminders": [{"method": "email", "minutes_before": 5}]
            }]
        }"#;
        let payload: SuggestionPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.candidates.len(), 1);
        let draft = &payload.candidates[0];
        assert_eq!(draft.title, "Standup");
        assert_eq!(draft.reminders[0].method, ReminderMethod::Email);
        assert_eq!(draft.reminders[0].minutes_before, 5);
    }

    #[test]
    fn test_payload_rejects_unparseable_timestamps() {
        let raw = r#"{"candidates": [{"title": "x", "start": "whenever", "end": "later"}]}"#;
        assert!(serde_json::from_str::<SuggestionPayload>(raw).is_err());
    }

    #[test]
    fn test_missing_candidates_defaults_empty() {
        let payload: SuggestionPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.candidates.is_empty());
    }
}
