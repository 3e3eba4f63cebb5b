//! Core domain layer. No external I/O dependencies.
//!
//! Entities and repair rules live here. Dependencies flow inward.

pub mod conflict;
pub mod entities;
pub mod errors;
pub mod normalize;

pub use entities::{
    Attendee, BusyInterval, CalendarEvent, CommitDecision, CommitKind, CommitPlan, CommitPlanItem,
    CommitResult, EventDraft, EventInstant, Recurrence, Reminder, ReminderMethod, SuggestResponse,
};
pub use errors::DomainError;
