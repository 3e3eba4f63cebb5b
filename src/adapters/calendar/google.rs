//! Google Calendar adapter. REST v3 with a local mirror and dry-run fallback.
//!
//! Without working credentials every mutation persists into the store under a
//! synthetic id, and busy lookups are served from the mirror — the planner
//! sees the same contract either way.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::oauth::GoogleOAuthManager;
use super::payload::to_google_payload;
use crate::domain::{CalendarEvent, DomainError};
use crate::ports::{CalendarPort, EventStorePort};

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

pub struct GoogleCalendarAdapter {
    client: reqwest::Client,
    auth: GoogleOAuthManager,
    store: Arc<dyn EventStorePort>,
    calendar_id: String,
}

impl GoogleCalendarAdapter {
    pub fn new(
        auth: GoogleOAuthManager,
        store: Arc<dyn EventStorePort>,
        calendar_id: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth,
            store,
            calendar_id,
        }
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", CALENDAR_API_BASE, self.calendar_id)
    }

    /// Current bearer token, or None when running dry.
    async fn token(&self) -> Option<String> {
        match self.auth.access_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "credential lookup failed, falling back to dry-run");
                None
            }
        }
    }

    /// Mirror a backend payload into the local store. Best effort.
    async fn mirror(&self, event_id: &str, payload: &Value) {
        if let Err(e) = self.store.save_payload(event_id, payload).await {
            warn!(event_id, error = %e, "failed to mirror event payload");
        }
    }
}

#[async_trait::async_trait]
impl CalendarPort for GoogleCalendarAdapter {
    async fn create_event(&self, event: &CalendarEvent) -> Result<String, DomainError> {
        let body = to_google_payload(event);

        if let Some(token) = self.token().await {
            let response = self
                .client
                .post(self.events_url())
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await
                .map_err(|e| DomainError::Calendar(format!("create request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(DomainError::Calendar(format!(
                    "create failed {}: {}",
                    status,
                    text.chars().take(200).collect::<String>()
                )));
            }

            let created: Value = response
                .json()
                .await
                .map_err(|e| DomainError::Calendar(format!("create response unparseable: {}", e)))?;
            let event_id = created
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| DomainError::Calendar("create response missing id".into()))?
                .to_string();

            self.mirror(&event_id, &created).await;
            info!(event_id = %event_id, title = %event.title, "event created in Google Calendar");
            return Ok(event_id);
        }

        // Dry-run: synthetic id, local persistence only.
        let event_id = format!("dry-run-{}", Uuid::new_v4().simple());
        let mut payload = body;
        payload["id"] = Value::String(event_id.clone());
        self.store.save_payload(&event_id, &payload).await?;
        info!(event_id = %event_id, title = %event.title, "dry-run: event stored locally");
        Ok(event_id)
    }

    async fn update_event(
        &self,
        event_id: &str,
        event: &CalendarEvent,
    ) -> Result<String, DomainError> {
        let body = to_google_payload(event);

        if let Some(token) = self.token().await {
            let url = format!("{}/{}", self.events_url(), event_id);
            let response = self
                .client
                .put(&url)
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await
                .map_err(|e| DomainError::Calendar(format!("update request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                return Err(DomainError::Calendar(format!(
                    "update failed {}: {}",
                    status,
                    text.chars().take(200).collect::<String>()
                )));
            }

            self.mirror(event_id, &body).await;
            info!(event_id, title = %event.title, "event updated in Google Calendar");
            return Ok(event_id.to_string());
        }

        let mut payload = body;
        payload["id"] = Value::String(event_id.to_string());
        self.store.save_payload(event_id, &payload).await?;
        info!(event_id, title = %event.title, "dry-run: event update stored locally");
        Ok(event_id.to_string())
    }

    async fn list_between(
        &self,
        time_min_iso: &str,
        time_max_iso: &str,
    ) -> Result<Vec<Value>, DomainError> {
        if let Some(token) = self.token().await {
            let result = self
                .client
                .get(self.events_url())
                .bearer_auth(&token)
                .query(&[
                    ("timeMin", time_min_iso),
                    ("timeMax", time_max_iso),
                    ("singleEvents", "true"),
                    ("orderBy", "startTime"),
                ])
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => {
                    let listed: Value = response.json().await.map_err(|e| {
                        DomainError::Calendar(format!("list response unparseable: {}", e))
                    })?;
                    let items: Vec<Value> = listed
                        .get("items")
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default();
                    for item in &items {
                        if let Some(id) = item.get("id").and_then(Value::as_str) {
                            self.mirror(id, item).await;
                        }
                    }
                    return Ok(items);
                }
                Ok(response) => {
                    let status = response.status();
                    warn!(status = %status, "list request rejected, serving from local mirror");
                }
                Err(e) => {
                    warn!(error = %e, "list request failed, serving from local mirror");
                }
            }
        }

        self.store.list_between(time_min_iso, time_max_iso).await
    }
}
