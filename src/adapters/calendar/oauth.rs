//! OAuth credential lifecycle for Google Calendar.
//!
//! Tokens live in the event store; refresh goes through the standard
//! oauth2.googleapis.com flow. Everything here is best-effort: a missing or
//! unrefreshable token means the calendar runs dry, not that the app fails.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::DomainError;
use crate::ports::EventStorePort;

pub const TOKEN_PROVIDER: &str = "google_calendar";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
/// Refresh slightly early so a token never expires mid-request.
const EXPIRY_SLACK_SECS: i64 = 60;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredToken {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    /// RFC 3339 expiry of the access token.
    #[serde(default)]
    expiry: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Handles OAuth credential lifecycle for Google Calendar.
pub struct GoogleOAuthManager {
    store: Arc<dyn EventStorePort>,
    client: reqwest::Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    /// Token seed from configuration: a file path or inline JSON.
    seed_token_json: Option<String>,
}

impl GoogleOAuthManager {
    pub fn new(
        store: Arc<dyn EventStorePort>,
        client_id: Option<String>,
        client_secret: Option<String>,
        seed_token_json: Option<String>,
    ) -> Self {
        Self {
            store,
            client: reqwest::Client::new(),
            client_id,
            client_secret,
            seed_token_json,
        }
    }

    /// A valid bearer token, refreshing when necessary. `None` means the
    /// calendar must run in dry-run mode.
    pub async fn access_token(&self) -> Result<Option<String>, DomainError> {
        let Some(token) = self.load_token().await? else {
            return Ok(None);
        };
        if let Some(access) = token.access_token.as_deref() {
            if !is_expired(token.expiry.as_deref()) {
                return Ok(Some(access.to_string()));
            }
        }
        self.refresh(token).await
    }

    /// Token from the store, seeded from configuration on first use.
    async fn load_token(&self) -> Result<Option<StoredToken>, DomainError> {
        if let Some(raw) = self.store.load_token(TOKEN_PROVIDER).await? {
            return Ok(serde_json::from_str(&raw).ok());
        }

        let Some(seed) = self.seed_token_json.as_deref() else {
            return Ok(None);
        };
        let Some(raw) = read_possible_json(seed) else {
            return Ok(None);
        };
        match serde_json::from_str::<StoredToken>(&raw) {
            Ok(token) => {
                self.store.save_token(TOKEN_PROVIDER, &raw).await?;
                info!("seeded Google token from configuration");
                Ok(Some(token))
            }
            Err(e) => {
                warn!(error = %e, "configured Google token JSON is not parseable");
                Ok(None)
            }
        }
    }

    /// Exchange the refresh token for a fresh access token. Any failure logs
    /// and yields `None` so the caller drops to dry-run.
    async fn refresh(&self, mut token: StoredToken) -> Result<Option<String>, DomainError> {
        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            token.refresh_token.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
        ) else {
            warn!("access token expired and refresh is not configured");
            return Ok(None);
        };

        let response = match self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "token refresh request failed");
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "token refresh rejected");
            return Ok(None);
        }

        let refreshed: RefreshResponse = match response.json().await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                warn!(error = %e, "token refresh response unparseable");
                return Ok(None);
            }
        };

        let expires_in = refreshed.expires_in.unwrap_or(3600);
        token.access_token = Some(refreshed.access_token.clone());
        token.expiry = Some((Utc::now() + Duration::seconds(expires_in)).to_rfc3339());

        match serde_json::to_string(&token) {
            Ok(raw) => self.store.save_token(TOKEN_PROVIDER, &raw).await?,
            Err(e) => warn!(error = %e, "failed to serialize refreshed token"),
        }

        info!(expires_in, "Google access token refreshed");
        Ok(Some(refreshed.access_token))
    }
}

fn is_expired(expiry: Option<&str>) -> bool {
    let Some(raw) = expiry else {
        return true;
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&Utc) <= Utc::now() + Duration::seconds(EXPIRY_SLACK_SECS),
        Err(_) => true,
    }
}

/// Accepts a filesystem path or an inline JSON object.
fn read_possible_json(source: &str) -> Option<String> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return None;
    }
    let path = Path::new(trimmed);
    if path.exists() {
        return std::fs::read_to_string(path).ok();
    }
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed.to_string());
    }
    None
}
