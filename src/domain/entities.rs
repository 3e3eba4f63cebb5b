//! Domain entities. Pure data structures for the scheduling core.
//!
//! No HTTP/SQL types here — adapters map wire payloads into these.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Someone invited to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMethod {
    #[default]
    Popup,
    Email,
}

impl ReminderMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Popup => "popup",
            Self::Email => "email",
        }
    }
}

/// Notification before an event. Lists are de-duplicated by
/// (method, minutes_before) during normalization, first occurrence wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(default)]
    pub method: ReminderMethod,
    #[serde(default = "default_minutes_before")]
    pub minutes_before: u32,
}

fn default_minutes_before() -> u32 {
    15
}

impl Default for Reminder {
    fn default() -> Self {
        Self {
            method: ReminderMethod::Popup,
            minutes_before: 15,
        }
    }
}

/// Recurrence rule, e.g. "RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR". Opaque to the
/// core; passed through to the backend unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub rrule: Option<String>,
}

/// Timestamp as emitted by the LLM: a full RFC 3339 instant, or a floating
/// local date-time without an offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventInstant {
    Zoned(DateTime<FixedOffset>),
    Floating(NaiveDateTime),
}

impl EventInstant {
    /// Parse an ISO-8601 timestamp, with or without a UTC offset.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Self::Zoned(dt));
        }
        for fmt in [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M",
        ] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Self::Floating(naive));
            }
        }
        None
    }

    /// Resolve against a zone: floating instants are wall-clock local time in
    /// that zone, zoned instants are converted to it.
    pub fn with_zone(&self, tz: Tz) -> DateTime<FixedOffset> {
        match self {
            Self::Zoned(dt) => dt.with_timezone(&tz).fixed_offset(),
            Self::Floating(naive) => tz
                .from_local_datetime(naive)
                // DST gap: map through UTC instead of failing
                .earliest()
                .unwrap_or_else(|| tz.from_utc_datetime(naive))
                .fixed_offset(),
        }
    }
}

impl Serialize for EventInstant {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Zoned(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Self::Floating(naive) => {
                serializer.serialize_str(&naive.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
        }
    }
}

impl<'de> Deserialize<'de> for EventInstant {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw}")))
    }
}

/// Untrusted candidate event. Produced only by suggestion adapters; becomes a
/// [`CalendarEvent`] through normalization, never directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: EventInstant,
    pub end: EventInstant,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub source: Option<String>,
}

impl From<&CalendarEvent> for EventDraft {
    /// Re-draft a valid event so it can be run through normalization again
    /// (e.g. with a freshly fetched busy window). Lossless.
    fn from(ev: &CalendarEvent) -> Self {
        Self {
            title: ev.title.clone(),
            description: ev.description.clone(),
            start: EventInstant::Zoned(ev.start),
            end: EventInstant::Zoned(ev.end),
            timezone: Some(ev.timezone.clone()),
            location: ev.location.clone(),
            attendees: ev.attendees.clone(),
            reminders: ev.reminders.clone(),
            recurrence: ev.recurrence.clone(),
            source: ev.source.clone(),
        }
    }
}

/// A validated calendar event. Construct through [`CalendarEvent::new`], which
/// guarantees a non-empty title, end > start, and at least one reminder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// IANA zone name. Non-empty after normalization.
    pub timezone: String,
    pub location: Option<String>,
    pub attendees: Vec<Attendee>,
    pub reminders: Vec<Reminder>,
    pub recurrence: Option<Recurrence>,
    /// Free-text provenance (why this event exists). Doubles as the backend
    /// identifier on update.
    pub source: Option<String>,
}

impl CalendarEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        timezone: impl Into<String>,
        location: Option<String>,
        attendees: Vec<Attendee>,
        reminders: Vec<Reminder>,
        recurrence: Option<Recurrence>,
        source: Option<String>,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::Validation("event title must not be empty".into()));
        }
        if end <= start {
            return Err(DomainError::Validation(format!(
                "event end {} must be after start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            )));
        }
        let reminders = if reminders.is_empty() {
            vec![Reminder::default()]
        } else {
            reminders
        };
        Ok(Self {
            title,
            description,
            start,
            end,
            timezone: timezone.into(),
            location,
            attendees,
            reminders,
            recurrence,
            source,
        })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Externally-held calendar slot. Half-open: two intervals conflict iff
/// `a.start < b.end && a.end > b.start`, so touching boundaries are fine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusyInterval {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl BusyInterval {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> bool {
        self.start < end && self.end > start
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitKind {
    #[default]
    Create,
    Update,
    Skip,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitDecision {
    #[serde(default)]
    pub kind: CommitKind,
    #[serde(default)]
    pub reason: Option<String>,
}

/// One approved action. Decisions come from the operator; the core never
/// invents them.
#[derive(Debug, Clone, Serialize)]
pub struct CommitPlanItem {
    pub event: CalendarEvent,
    pub decision: CommitDecision,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitPlan {
    pub items: Vec<CommitPlanItem>,
    /// Correlation id from the suggest call that produced these events.
    pub trace_id: String,
}

/// Per-plan outcome. `created + updated + skipped + errors.len()` always
/// equals the number of plan items.
#[derive(Debug, Serialize)]
pub struct CommitResult {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub trace_id: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub candidates: Vec<CalendarEvent>,
    pub trace_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 5, 20, hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_event_end_must_be_after_start() {
        let err = CalendarEvent::new(
            "x",
            None,
            at(9),
            at(9),
            "Europe/Riga",
            None,
            vec![],
            vec![],
            None,
            None,
        );
        assert!(matches!(err, Err(DomainError::Validation(_))));

        let ok = CalendarEvent::new(
            "x",
            None,
            at(9),
            at(10),
            "Europe/Riga",
            None,
            vec![],
            vec![],
            None,
            None,
        )
        .unwrap();
        assert!(ok.end > ok.start);
    }

    #[test]
    fn test_empty_title_rejected() {
        let err = CalendarEvent::new(
            "   ",
            None,
            at(9),
            at(10),
            "Europe/Riga",
            None,
            vec![],
            vec![],
            None,
            None,
        );
        assert!(matches!(err, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_empty_reminders_get_default() {
        let ev = CalendarEvent::new(
            "x",
            None,
            at(9),
            at(10),
            "Europe/Riga",
            None,
            vec![],
            vec![],
            None,
            None,
        )
        .unwrap();
        assert_eq!(ev.reminders, vec![Reminder::default()]);
    }

    #[test]
    fn test_instant_parses_zoned_and_floating() {
        assert!(matches!(
            EventInstant::parse("2025-05-20T09:00:00+03:00"),
            Some(EventInstant::Zoned(_))
        ));
        assert!(matches!(
            EventInstant::parse("2025-05-20T09:00:00Z"),
            Some(EventInstant::Zoned(_))
        ));
        assert!(matches!(
            EventInstant::parse("2025-05-20T09:00:00"),
            Some(EventInstant::Floating(_))
        ));
        assert!(EventInstant::parse("next tuesday").is_none());
    }

    #[test]
    fn test_floating_instant_attaches_zone() {
        let naive = NaiveDate::from_ymd_opt(2025, 5, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let resolved = EventInstant::Floating(naive).with_zone(chrono_tz::Europe::Riga);
        // Riga is UTC+3 in May
        assert_eq!(resolved.to_rfc3339(), "2025-05-20T09:00:00+03:00");
    }

    #[test]
    fn test_busy_interval_half_open() {
        let slot = BusyInterval::new(at(9), at(10));
        assert!(slot.overlaps(at(9), at(10)));
        // Touching boundaries do not conflict
        assert!(!slot.overlaps(at(10), at(11)));
        assert!(!slot.overlaps(at(8), at(9)));
    }
}
