//! Draft repair: resolve timezones, fix durations, coerce sub-entities.
//!
//! Malformed durations and unknown zone names are common LLM output; they are
//! repaired, never rejected. Every event leaving this module satisfies the
//! [`CalendarEvent::new`] invariants.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::Duration;
use chrono_tz::Tz;
use tracing::warn;

use crate::domain::conflict;
use crate::domain::entities::{BusyInterval, CalendarEvent, EventDraft, Reminder};
use crate::domain::errors::DomainError;

/// Applied when a draft arrives with end <= start.
pub const DEFAULT_EVENT_DURATION_MINS: i64 = 60;

/// Normalize one draft into a valid event.
///
/// Zone resolution order: explicit override, the draft's own zone, then the
/// configured default. An unknown zone name falls back to the default instead
/// of failing. When `busy` is non-empty the normalized event is additionally
/// shifted off the supplied intervals.
///
/// Normalizing an already-normalized event with its own zone and no busy set
/// is the identity on start/end/timezone.
pub fn normalize_event(
    draft: &EventDraft,
    timezone: Option<&str>,
    default_tz: Tz,
    busy: &[BusyInterval],
) -> Result<CalendarEvent, DomainError> {
    let requested = timezone
        .filter(|s| !s.trim().is_empty())
        .or_else(|| draft.timezone.as_deref().filter(|s| !s.trim().is_empty()));

    let tz = match requested {
        Some(name) => Tz::from_str(name).unwrap_or_else(|_| {
            warn!(zone = name, fallback = %default_tz, "unknown timezone, using default");
            default_tz
        }),
        None => default_tz,
    };

    let start = draft.start.with_zone(tz);
    let mut end = draft.end.with_zone(tz);
    if end <= start {
        end = start + Duration::minutes(DEFAULT_EVENT_DURATION_MINS);
    }

    let event = CalendarEvent::new(
        draft.title.clone(),
        draft.description.clone(),
        start,
        end,
        tz.name(),
        draft.location.clone(),
        draft.attendees.clone(),
        dedup_reminders(&draft.reminders),
        draft.recurrence.clone(),
        draft.source.clone(),
    )?;

    if busy.is_empty() {
        Ok(event)
    } else {
        Ok(conflict::shift_to_free_slot(event, busy))
    }
}

/// Keep the first occurrence of each (method, minutes_before) pair.
pub fn dedup_reminders(reminders: &[Reminder]) -> Vec<Reminder> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(reminders.len());
    for r in reminders {
        if seen.insert((r.method, r.minutes_before)) {
            out.push(*r);
        }
    }
    out
}
