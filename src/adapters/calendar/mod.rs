//! Calendar adapter module. Implements CalendarPort against Google Calendar.
//!
//! REST client with OAuth token lifecycle and a dry-run mode backed by the
//! local store.

pub mod google;
pub mod oauth;
pub mod payload;

pub use google::GoogleCalendarAdapter;
pub use oauth::GoogleOAuthManager;
