//! Conflict detection against busy intervals and fixed-increment relocation.

use chrono::{DateTime, Duration, FixedOffset};

use crate::domain::entities::{BusyInterval, CalendarEvent};

/// Probe step when relocating a conflicting event.
pub const CONFLICT_SHIFT_MINS: i64 = 15;
/// Probe attempts before giving up and returning the last position.
pub const MAX_SHIFT_ATTEMPTS: u32 = 8;

/// True when [start, end) overlaps any busy interval.
pub fn has_conflict(
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    busy: &[BusyInterval],
) -> bool {
    busy.iter().any(|slot| slot.overlaps(start, end))
}

/// Relocate an event off the busy intervals by linear probing in fixed
/// increments. Returns the event unchanged when already free, or at its last
/// probed position when attempts are exhausted — possibly still conflicting,
/// which the caller must tolerate.
pub fn shift_to_free_slot(mut event: CalendarEvent, busy: &[BusyInterval]) -> CalendarEvent {
    let shift = Duration::minutes(CONFLICT_SHIFT_MINS);
    for _ in 0..MAX_SHIFT_ATTEMPTS {
        if !has_conflict(event.start, event.end, busy) {
            return event;
        }
        event.start = event.start + shift;
        event.end = event.end + shift;
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 5, 20, hour, min, 0)
            .unwrap()
    }

    fn event(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> CalendarEvent {
        CalendarEvent::new(
            "Deep Work",
            None,
            start,
            end,
            "Europe/Riga",
            None,
            vec![],
            vec![],
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_free_event_is_untouched() {
        let ev = event(at(9, 0), at(10, 0));
        let busy = vec![BusyInterval::new(at(11, 0), at(12, 0))];
        let resolved = shift_to_free_slot(ev.clone(), &busy);
        assert_eq!(resolved.start, ev.start);
        assert_eq!(resolved.end, ev.end);
    }

    #[test]
    fn test_shifts_past_busy_hour() {
        let ev = event(at(9, 0), at(10, 0));
        let busy = vec![BusyInterval::new(at(9, 0), at(10, 0))];
        let resolved = shift_to_free_slot(ev, &busy);
        // 15-minute probes land on the first non-overlapping slot: [10:00, 11:00)
        assert_eq!(resolved.start, at(10, 0));
        assert_eq!(resolved.end, at(11, 0));
        assert!(!has_conflict(resolved.start, resolved.end, &busy));
    }

    #[test]
    fn test_exhaustion_returns_last_position() {
        let ev = event(at(9, 0), at(10, 0));
        // One block covering every probe the resolver can reach
        let busy = vec![BusyInterval::new(at(9, 0), at(13, 0))];
        let resolved = shift_to_free_slot(ev, &busy);
        // 8 shifts of 15 minutes from 09:00
        assert_eq!(resolved.start, at(11, 0));
        assert_eq!(resolved.end, at(12, 0));
        assert!(has_conflict(resolved.start, resolved.end, &busy));
    }
}
