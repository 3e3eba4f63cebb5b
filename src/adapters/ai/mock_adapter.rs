//! Mock suggestion adapter for demos and testing without API calls.
//!
//! Fabricates one rough draft per instruction; downstream repair gives it a
//! real duration and timezone.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::domain::{DomainError, EventDraft, EventInstant};
use crate::ports::SuggestionPort;

const TITLE_MAX: usize = 48;

/// Mock provider. Returns a predetermined draft without making API calls.
/// Simulates network latency with a configurable delay.
pub struct MockSuggestionAdapter {
    /// Simulated network delay in milliseconds.
    delay_ms: u64,
}

impl MockSuggestionAdapter {
    /// Create a new mock adapter with default delay (100ms).
    pub fn new() -> Self {
        Self { delay_ms: 100 }
    }

    /// Create a mock adapter with custom delay.
    pub fn with_delay(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    fn short_title(instruction: &str) -> String {
        let cleaned = instruction.split_whitespace().collect::<Vec<_>>().join(" ");
        let title: String = cleaned.chars().take(TITLE_MAX).collect();
        if title.is_empty() {
            "Untitled event".to_string()
        } else {
            title
        }
    }
}

impl Default for MockSuggestionAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SuggestionPort for MockSuggestionAdapter {
    async fn suggest_events(
        &self,
        instruction: &str,
        now_iso: &str,
        _timezone: &str,
    ) -> Result<Vec<EventDraft>, DomainError> {
        info!(
            instruction_len = instruction.len(),
            "[MOCK] fabricating a candidate draft"
        );

        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        let anchor: NaiveDate = match EventInstant::parse(now_iso) {
            Some(EventInstant::Zoned(dt)) => dt.date_naive(),
            Some(EventInstant::Floating(naive)) => naive.date(),
            None => Utc::now().date_naive(),
        };
        // Tomorrow at 10:00, floating and zero-length: the repair pipeline
        // must supply zone and duration, same as it would for real LLM output.
        let start = (anchor + chrono::Duration::days(1))
            .and_hms_opt(10, 0, 0)
            .unwrap_or_default();

        Ok(vec![EventDraft {
            title: format!("[MOCK] {}", Self::short_title(instruction)),
            description: Some(format!("Simulated suggestion for: {}", instruction)),
            start: EventInstant::Floating(start),
            end: EventInstant::Floating(start),
            timezone: None,
            location: None,
            attendees: vec![],
            reminders: vec![],
            recurrence: None,
            source: Some("mock-suggestion".to_string()),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_adapter_fabricates_a_rough_draft() {
        let adapter = MockSuggestionAdapter::with_delay(10);
        let drafts = adapter
            .suggest_events("book a dentist visit", "2025-05-20T09:00:00+03:00", "Europe/Riga")
            .await
            .unwrap();

        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert!(draft.title.starts_with("[MOCK]"));
        // Deliberately rough: zero-length and zone-less
        assert_eq!(draft.start, draft.end);
        assert!(draft.timezone.is_none());
        assert_eq!(
            draft.start,
            EventInstant::Floating(
                NaiveDate::from_ymd_opt(2025, 5, 21)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap()
            )
        );
    }
}
