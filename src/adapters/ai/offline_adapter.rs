//! Offline fallback used when no API key is configured.
//!
//! Suggestion degrades to an empty candidate list instead of failing.

use tracing::info;

use crate::domain::{DomainError, EventDraft};
use crate::ports::SuggestionPort;

/// No-op suggestion provider. Always returns zero candidates.
pub struct OfflineSuggestionAdapter;

impl OfflineSuggestionAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OfflineSuggestionAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SuggestionPort for OfflineSuggestionAdapter {
    async fn suggest_events(
        &self,
        instruction: &str,
        _now_iso: &str,
        _timezone: &str,
    ) -> Result<Vec<EventDraft>, DomainError> {
        info!(
            instruction_len = instruction.len(),
            "suggestion provider operating in offline mode"
        );
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_adapter_returns_empty() {
        let adapter = OfflineSuggestionAdapter::new();
        let drafts = adapter
            .suggest_events("book a dentist", "2025-05-20T09:00:00+03:00", "Europe/Riga")
            .await
            .unwrap();
        assert!(drafts.is_empty());
    }
}
