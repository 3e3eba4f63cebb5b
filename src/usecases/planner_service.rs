//! Suggest/commit orchestration: candidates from the LLM are repaired and
//! checked against the calendar; approved plans are applied item by item.
//!
//! - Provider failures degrade to an empty candidate list
//! - Busy-window lookups fail per candidate, never the whole request
//! - Commit isolates per-item backend errors; the batch always completes

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::normalize::normalize_event;
use crate::domain::{
    BusyInterval, CalendarEvent, CommitKind, CommitPlan, CommitResult, DomainError, EventDraft,
    EventInstant, SuggestResponse,
};
use crate::ports::{CalendarPort, SuggestionPort};

/// Planner service. Constructed once at startup and shared by reference;
/// holds no mutable state, so concurrent suggest calls are independent.
pub struct PlannerService {
    suggester: Arc<dyn SuggestionPort>,
    calendar: Arc<dyn CalendarPort>,
    default_tz: Tz,
}

impl PlannerService {
    pub fn new(
        suggester: Arc<dyn SuggestionPort>,
        calendar: Arc<dyn CalendarPort>,
        default_tz: Tz,
    ) -> Self {
        Self {
            suggester,
            calendar,
            default_tz,
        }
    }

    /// Turn an instruction into validated candidate events.
    ///
    /// Provider and calendar failures are absorbed: the response may carry an
    /// empty or unshifted candidate list, but only a normalization bug (empty
    /// title slipping through the provider) surfaces as `Err`.
    pub async fn suggest(
        &self,
        instruction: &str,
        now: Option<DateTime<FixedOffset>>,
        timezone: Option<&str>,
    ) -> Result<SuggestResponse, DomainError> {
        let trace_id = Uuid::new_v4().to_string();
        let tz = self.resolve_zone(timezone);
        let now = now.unwrap_or_else(|| Utc::now().with_timezone(&tz).fixed_offset());
        let now_iso = now.to_rfc3339();

        let drafts = match self
            .suggester
            .suggest_events(instruction, &now_iso, tz.name())
            .await
        {
            Ok(drafts) => drafts,
            Err(e) => {
                warn!(trace_id = %trace_id, error = %e, "provider unavailable, returning no candidates");
                Vec::new()
            }
        };

        info!(trace_id = %trace_id, drafts = drafts.len(), zone = tz.name(), "repairing candidates");

        let mut candidates = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            candidates.push(self.repair_candidate(draft, tz).await?);
        }

        Ok(SuggestResponse {
            candidates,
            trace_id,
        })
    }

    /// Apply an approved plan item by item, in plan order.
    ///
    /// Backend errors are recorded per item and never abort the batch. A
    /// failed create/update counts into `errors`, not into its bucket.
    pub async fn commit(&self, plan: CommitPlan) -> CommitResult {
        let mut created = 0;
        let mut updated = 0;
        let mut skipped = 0;
        let mut errors = Vec::new();

        for item in &plan.items {
            match item.decision.kind {
                CommitKind::Create => match self.calendar.create_event(&item.event).await {
                    Ok(id) => {
                        info!(trace_id = %plan.trace_id, event_id = %id, title = %item.event.title, "event created");
                        created += 1;
                    }
                    Err(e) => {
                        warn!(trace_id = %plan.trace_id, title = %item.event.title, error = %e, "create failed");
                        errors.push(e.to_string());
                    }
                },
                CommitKind::Update => {
                    // Provenance id when recorded; the title is a weak fallback.
                    let event_id = item
                        .event
                        .source
                        .clone()
                        .unwrap_or_else(|| item.event.title.clone());
                    match self.calendar.update_event(&event_id, &item.event).await {
                        Ok(id) => {
                            info!(trace_id = %plan.trace_id, event_id = %id, title = %item.event.title, "event updated");
                            updated += 1;
                        }
                        Err(e) => {
                            warn!(trace_id = %plan.trace_id, title = %item.event.title, error = %e, "update failed");
                            errors.push(e.to_string());
                        }
                    }
                }
                CommitKind::Skip => skipped += 1,
            }
        }

        CommitResult {
            created,
            updated,
            skipped,
            errors,
            trace_id: plan.trace_id,
        }
    }

    /// Normalize one draft, then shift it off the busy window reported by the
    /// calendar for its slot.
    async fn repair_candidate(
        &self,
        draft: &EventDraft,
        tz: Tz,
    ) -> Result<CalendarEvent, DomainError> {
        let base = normalize_event(draft, Some(tz.name()), self.default_tz, &[])?;
        let busy = self.busy_intervals(&base).await;
        if busy.is_empty() {
            return Ok(base);
        }
        let redraft = EventDraft::from(&base);
        normalize_event(&redraft, Some(base.timezone.as_str()), self.default_tz, &busy)
    }

    /// Busy intervals overlapping the candidate window. A failed lookup means
    /// "no known conflicts" for this candidate only.
    async fn busy_intervals(&self, event: &CalendarEvent) -> Vec<BusyInterval> {
        let raw = match self
            .calendar
            .list_between(&event.start.to_rfc3339(), &event.end.to_rfc3339())
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(title = %event.title, error = %e, "busy window lookup failed, assuming free");
                return Vec::new();
            }
        };

        let offset = *event.start.offset();
        raw.iter()
            .filter_map(|item| parse_busy_interval(item, offset))
            .collect()
    }

    fn resolve_zone(&self, timezone: Option<&str>) -> Tz {
        match timezone.filter(|s| !s.trim().is_empty()) {
            Some(name) => Tz::from_str(name).unwrap_or_else(|_| {
                warn!(zone = name, fallback = %self.default_tz, "unknown request timezone, using default");
                self.default_tz
            }),
            None => self.default_tz,
        }
    }
}

/// One busy interval out of a raw calendar payload. Accepts start/end as
/// plain ISO strings or as `{dateTime|date}` objects; anything else is
/// discarded rather than failing the candidate.
fn parse_busy_interval(payload: &Value, offset: FixedOffset) -> Option<BusyInterval> {
    let start = coerce_instant(payload.get("start")?, offset)?;
    let end = coerce_instant(payload.get("end")?, offset)?;
    Some(BusyInterval::new(start, end))
}

fn coerce_instant(value: &Value, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let raw = match value {
        Value::Object(map) => map.get("dateTime").or_else(|| map.get("date"))?.as_str()?,
        Value::String(s) => s.as_str(),
        _ => return None,
    };
    if let Some(instant) = EventInstant::parse(raw) {
        return match instant {
            EventInstant::Zoned(dt) => Some(dt),
            EventInstant::Floating(naive) => offset.from_local_datetime(&naive).single(),
        };
    }
    // All-day entries carry a bare date
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    offset
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommitDecision, CommitPlanItem, Reminder};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::Mutex;

    const RIGA: Tz = chrono_tz::Europe::Riga;

    struct StubSuggester {
        drafts: Vec<EventDraft>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl SuggestionPort for StubSuggester {
        async fn suggest_events(
            &self,
            _instruction: &str,
            _now_iso: &str,
            _timezone: &str,
        ) -> Result<Vec<EventDraft>, DomainError> {
            if self.fail {
                return Err(DomainError::Provider("model down".into()));
            }
            Ok(self.drafts.clone())
        }
    }

    #[derive(Default)]
    struct StubCalendar {
        busy: Vec<Value>,
        fail_busy: bool,
        fail_create_titled: Option<String>,
        created: Mutex<Vec<String>>,
        updated: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl CalendarPort for StubCalendar {
        async fn create_event(&self, event: &CalendarEvent) -> Result<String, DomainError> {
            if self.fail_create_titled.as_deref() == Some(event.title.as_str()) {
                return Err(DomainError::Calendar("backend rejected event".into()));
            }
            self.created.lock().unwrap().push(event.title.clone());
            Ok("created-id".into())
        }

        async fn update_event(
            &self,
            event_id: &str,
            _event: &CalendarEvent,
        ) -> Result<String, DomainError> {
            self.updated.lock().unwrap().push(event_id.to_string());
            Ok(event_id.to_string())
        }

        async fn list_between(
            &self,
            _time_min_iso: &str,
            _time_max_iso: &str,
        ) -> Result<Vec<Value>, DomainError> {
            if self.fail_busy {
                return Err(DomainError::Calendar("busy lookup failed".into()));
            }
            Ok(self.busy.clone())
        }
    }

    fn rough_draft() -> EventDraft {
        let nine = NaiveDate::from_ymd_opt(2025, 5, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        EventDraft {
            title: "Deep Work".into(),
            description: Some("Focus session".into()),
            // Naive and zero-length on purpose
            start: EventInstant::Floating(nine),
            end: EventInstant::Floating(nine),
            timezone: Some(String::new()),
            location: None,
            attendees: vec![],
            reminders: vec![],
            recurrence: None,
            source: None,
        }
    }

    fn valid_event(title: &str, source: Option<&str>) -> CalendarEvent {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        CalendarEvent::new(
            title,
            None,
            tz.with_ymd_and_hms(2025, 5, 20, 10, 0, 0).unwrap(),
            tz.with_ymd_and_hms(2025, 5, 20, 11, 0, 0).unwrap(),
            "Europe/Riga",
            None,
            vec![],
            vec![],
            None,
            source.map(str::to_string),
        )
        .unwrap()
    }

    fn planner(suggester: StubSuggester, calendar: Arc<StubCalendar>) -> PlannerService {
        PlannerService::new(Arc::new(suggester), calendar, RIGA)
    }

    #[tokio::test]
    async fn test_suggest_repairs_and_relocates() {
        let calendar = Arc::new(StubCalendar {
            busy: vec![json!({
                "start": "2025-05-20T09:00:00+03:00",
                "end": "2025-05-20T10:00:00+03:00",
            })],
            ..Default::default()
        });
        let planner = planner(
            StubSuggester { drafts: vec![rough_draft()], fail: false },
            calendar,
        );

        let response = planner.suggest("schedule focus", None, None).await.unwrap();

        assert!(!response.trace_id.is_empty());
        assert_eq!(response.candidates.len(), 1);
        let event = &response.candidates[0];
        assert_eq!(event.timezone, "Europe/Riga");
        assert_eq!(event.duration(), chrono::Duration::hours(1));
        assert_eq!(event.reminders, vec![Reminder::default()]);
        // Shifted off the 09:00-10:00 block
        assert_eq!(event.start.to_rfc3339(), "2025-05-20T10:00:00+03:00");
    }

    #[tokio::test]
    async fn test_suggest_accepts_object_shaped_busy_payloads() {
        let calendar = Arc::new(StubCalendar {
            busy: vec![
                json!({
                    "start": {"dateTime": "2025-05-20T09:00:00+03:00"},
                    "end": {"dateTime": "2025-05-20T10:00:00+03:00"},
                }),
                // Unreadable entry is discarded, not fatal
                json!({"start": 42, "end": true}),
            ],
            ..Default::default()
        });
        let planner = planner(
            StubSuggester { drafts: vec![rough_draft()], fail: false },
            calendar,
        );

        let response = planner.suggest("schedule focus", None, None).await.unwrap();
        assert_eq!(
            response.candidates[0].start.to_rfc3339(),
            "2025-05-20T10:00:00+03:00"
        );
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_empty() {
        let planner = planner(
            StubSuggester { drafts: vec![], fail: true },
            Arc::new(StubCalendar::default()),
        );

        let response = planner.suggest("schedule focus", None, None).await.unwrap();
        assert!(response.candidates.is_empty());
        assert!(!response.trace_id.is_empty());
    }

    #[tokio::test]
    async fn test_busy_lookup_failure_keeps_requested_slot() {
        let calendar = Arc::new(StubCalendar {
            fail_busy: true,
            ..Default::default()
        });
        let planner = planner(
            StubSuggester { drafts: vec![rough_draft()], fail: false },
            calendar,
        );

        let response = planner.suggest("schedule focus", None, None).await.unwrap();
        // Unknown calendar state: repaired but not relocated
        assert_eq!(
            response.candidates[0].start.to_rfc3339(),
            "2025-05-20T09:00:00+03:00"
        );
    }

    #[tokio::test]
    async fn test_commit_counts_and_isolates_failures() {
        let calendar = Arc::new(StubCalendar {
            fail_create_titled: Some("Retro".into()),
            ..Default::default()
        });
        let planner = planner(StubSuggester { drafts: vec![], fail: false }, Arc::clone(&calendar));

        let plan = CommitPlan {
            items: vec![
                CommitPlanItem {
                    event: valid_event("Standup", None),
                    decision: CommitDecision { kind: CommitKind::Create, reason: None },
                },
                CommitPlanItem {
                    event: valid_event("Retro", None),
                    decision: CommitDecision { kind: CommitKind::Create, reason: None },
                },
                CommitPlanItem {
                    event: valid_event("Planning", None),
                    decision: CommitDecision {
                        kind: CommitKind::Skip,
                        reason: Some("not approved".into()),
                    },
                },
            ],
            trace_id: "trace-123".into(),
        };

        let result = planner.commit(plan).await;

        assert_eq!(result.created, 1);
        assert_eq!(result.updated, 0);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("backend rejected event"));
        assert_eq!(result.trace_id, "trace-123");
        assert_eq!(*calendar.created.lock().unwrap(), vec!["Standup".to_string()]);
    }

    #[tokio::test]
    async fn test_update_prefers_source_id_over_title() {
        let calendar = Arc::new(StubCalendar::default());
        let planner = planner(StubSuggester { drafts: vec![], fail: false }, Arc::clone(&calendar));

        let plan = CommitPlan {
            items: vec![
                CommitPlanItem {
                    event: valid_event("Planning sync", Some("evt-42")),
                    decision: CommitDecision { kind: CommitKind::Update, reason: None },
                },
                CommitPlanItem {
                    event: valid_event("Planning sync", None),
                    decision: CommitDecision { kind: CommitKind::Update, reason: None },
                },
            ],
            trace_id: "trace-456".into(),
        };

        let result = planner.commit(plan).await;

        assert_eq!(result.updated, 2);
        assert_eq!(
            *calendar.updated.lock().unwrap(),
            vec!["evt-42".to_string(), "Planning sync".to_string()]
        );
    }

    #[test]
    fn test_coerce_instant_shapes() {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        assert!(coerce_instant(&json!("2025-05-20T09:00:00+03:00"), offset).is_some());
        assert!(coerce_instant(&json!({"dateTime": "2025-05-20T09:00:00Z"}), offset).is_some());
        assert!(coerce_instant(&json!({"date": "2025-05-20"}), offset).is_some());
        assert!(coerce_instant(&json!(42), offset).is_none());
        assert!(coerce_instant(&json!({"dateTime": "tomorrow"}), offset).is_none());
    }

    #[test]
    fn test_naive_busy_instant_gets_event_offset() {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let dt = coerce_instant(&json!("2025-05-20T09:00:00"), offset).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-05-20T09:00:00+03:00");
    }
}
