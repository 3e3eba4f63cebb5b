//! CalendarEvent to Google Calendar wire payload mapping.

use serde_json::{json, Value};

use crate::domain::normalize::dedup_reminders;
use crate::domain::CalendarEvent;

/// Build the Google Calendar v3 event body.
pub fn to_google_payload(event: &CalendarEvent) -> Value {
    let overrides: Vec<Value> = dedup_reminders(&event.reminders)
        .iter()
        .map(|r| {
            json!({
                "method": r.method.as_str(),
                "minutes": r.minutes_before,
            })
        })
        .collect();

    let mut body = json!({
        "summary": event.title,
        "description": event.description,
        "start": {
            "dateTime": event.start.to_rfc3339(),
            "timeZone": event.timezone,
        },
        "end": {
            "dateTime": event.end.to_rfc3339(),
            "timeZone": event.timezone,
        },
        "reminders": {
            "useDefault": false,
            "overrides": overrides,
        },
    });

    if let Some(location) = &event.location {
        body["location"] = json!(location);
    }
    if !event.attendees.is_empty() {
        body["attendees"] = json!(event
            .attendees
            .iter()
            .map(|a| json!({"email": a.email, "optional": a.optional}))
            .collect::<Vec<_>>());
    }
    if let Some(rrule) = event.recurrence.as_ref().and_then(|r| r.rrule.as_ref()) {
        body["recurrence"] = json!([rrule]);
    }
    if let Some(source) = &event.source {
        body["extendedProperties"] = json!({"private": {"source": source}});
    }

    body
}

/// ISO timestamp out of either wire shape: a plain string, or an object with
/// a `dateTime`/`date` field.
pub fn coerce_iso(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("dateTime").or_else(|| map.get("date"))?.as_str(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Attendee, Recurrence, Reminder, ReminderMethod};
    use chrono::{FixedOffset, TimeZone};

    fn event() -> CalendarEvent {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        CalendarEvent::new(
            "Deep Work",
            Some("Focus session".into()),
            tz.with_ymd_and_hms(2025, 5, 20, 10, 0, 0).unwrap(),
            tz.with_ymd_and_hms(2025, 5, 20, 11, 0, 0).unwrap(),
            "Europe/Riga",
            Some("Home office".into()),
            vec![Attendee { email: "ops@example.com".into(), optional: true }],
            vec![
                Reminder { method: ReminderMethod::Popup, minutes_before: 15 },
                Reminder { method: ReminderMethod::Popup, minutes_before: 15 },
                Reminder { method: ReminderMethod::Email, minutes_before: 5 },
            ],
            Some(Recurrence { rrule: Some("RRULE:FREQ=WEEKLY;BYDAY=TU".into()) }),
            Some("weekly focus block".into()),
        )
        .unwrap()
    }

    #[test]
    fn test_payload_core_fields() {
        let body = to_google_payload(&event());
        assert_eq!(body["summary"], "Deep Work");
        assert_eq!(body["start"]["dateTime"], "2025-05-20T10:00:00+03:00");
        assert_eq!(body["start"]["timeZone"], "Europe/Riga");
        assert_eq!(body["end"]["dateTime"], "2025-05-20T11:00:00+03:00");
        assert_eq!(body["location"], "Home office");
        assert_eq!(body["recurrence"], json!(["RRULE:FREQ=WEEKLY;BYDAY=TU"]));
        assert_eq!(body["extendedProperties"]["private"]["source"], "weekly focus block");
    }

    #[test]
    fn test_payload_deduplicates_reminder_overrides() {
        let body = to_google_payload(&event());
        assert_eq!(body["reminders"]["useDefault"], false);
        assert_eq!(
            body["reminders"]["overrides"],
            json!([
                {"method": "popup", "minutes": 15},
                {"method": "email", "minutes": 5},
            ])
        );
    }

    #[test]
    fn test_payload_attendees() {
        let body = to_google_payload(&event());
        assert_eq!(
            body["attendees"],
            json!([{"email": "ops@example.com", "optional": true}])
        );
    }

    #[test]
    fn test_coerce_iso_shapes() {
        assert_eq!(coerce_iso(&json!("2025-05-20T10:00:00Z")), Some("2025-05-20T10:00:00Z"));
        assert_eq!(
            coerce_iso(&json!({"dateTime": "2025-05-20T10:00:00Z"})),
            Some("2025-05-20T10:00:00Z")
        );
        assert_eq!(coerce_iso(&json!({"date": "2025-05-20"})), Some("2025-05-20"));
        assert_eq!(coerce_iso(&json!(42)), None);
        assert_eq!(coerce_iso(&json!({"when": "2025-05-20"})), None);
    }
}
