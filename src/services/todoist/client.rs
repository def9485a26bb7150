use std::cell::RefCell;
use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::models::settings::Settings;
use crate::services::auth::CredentialStore;

use super::error::SyncError;
use super::protocol::{Command, CommandReport, ResourceKind, SyncCursor, SyncResponse, SyncSnapshot};
use super::TaskBackend;

const MAX_ERROR_BODY_CHARS: usize = 512;

/// HTTP client for the incremental sync endpoint.
///
/// Owns the sync cursor: every successful exchange replaces it, and it only
/// goes back to a full sync when the credentials change.
///
/// Requests take `&self` so several can be in flight at once. The cursor and
/// credentials are only borrowed between awaits.
pub struct SyncClient {
    http: Client,
    endpoint: String,
    credentials: RefCell<Box<dyn CredentialStore>>,
    cursor: RefCell<SyncCursor>,
}

impl SyncClient {
    pub fn new(settings: &Settings, credentials: Box<dyn CredentialStore>) -> Result<Self> {
        let endpoint = format!("{}/sync", settings.api_base_url.trim_end_matches('/'));
        Self::with_endpoint(
            endpoint,
            Duration::from_secs(settings.request_timeout_secs),
            credentials,
        )
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        timeout: Duration,
        credentials: Box<dyn CredentialStore>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build sync HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            credentials: RefCell::new(credentials),
            cursor: RefCell::new(SyncCursor::full()),
        })
    }

    pub fn cursor(&self) -> SyncCursor {
        self.cursor.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.borrow().is_authenticated()
    }

    /// Store a new token. The old cursor belongs to the old account, so the
    /// next read is a full sync.
    pub fn sign_in(&mut self, token: &str) -> Result<()> {
        self.credentials.get_mut().set_token(token)?;
        self.cursor.get_mut().reset();
        Ok(())
    }

    pub fn sign_out(&mut self) -> Result<()> {
        self.credentials.get_mut().clear()?;
        self.cursor.get_mut().reset();
        Ok(())
    }

    pub async fn fetch_all(&self, kinds: &[ResourceKind]) -> Result<SyncSnapshot, SyncError> {
        let resource_types = serde_json::to_string(kinds)?;
        let form = vec![
            ("sync_token", self.cursor.borrow().as_str().to_string()),
            ("resource_types", resource_types),
        ];

        let response = self.exchange(form).await?;
        log::info!(
            "Fetched {} items, {} projects, {} labels (full_sync={})",
            response.items.len(),
            response.projects.len(),
            response.labels.len(),
            response.full_sync
        );
        Ok(response.into())
    }

    pub async fn submit(&self, commands: &[Command]) -> Result<CommandReport, SyncError> {
        if commands.is_empty() {
            return Ok(CommandReport::default());
        }

        let form = vec![
            ("sync_token", self.cursor.borrow().as_str().to_string()),
            ("commands", serde_json::to_string(commands)?),
        ];

        let report = CommandReport::from(self.exchange(form).await?);
        let rejected = commands
            .iter()
            .filter(|command| report.check(command).is_err())
            .count();
        log::info!(
            "Submitted {} command(s), {} rejected",
            commands.len(),
            rejected
        );
        Ok(report)
    }

    async fn exchange(&self, form: Vec<(&'static str, String)>) -> Result<SyncResponse, SyncError> {
        let token = self
            .credentials
            .borrow()
            .token()
            .ok_or(SyncError::NotAuthenticated)?;

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.invalidate_credentials();
            return Err(SyncError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Sync request failed with HTTP status {}", status);
            return Err(SyncError::Http {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body = response.text().await?;
        let parsed: SyncResponse = serde_json::from_str(&body)?;
        self.cursor.borrow_mut().advance(&parsed.sync_token);
        Ok(parsed)
    }

    fn invalidate_credentials(&self) {
        log::warn!("Task service rejected the API token; clearing stored credentials");
        if let Err(err) = self.credentials.borrow_mut().clear() {
            log::error!("Failed to clear rejected API token: {}", err);
        }
        self.cursor.borrow_mut().reset();
    }
}

impl fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncClient")
            .field("endpoint", &self.endpoint)
            .field("cursor", &*self.cursor.borrow())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[async_trait(?Send)]
impl TaskBackend for SyncClient {
    async fn fetch_all(&self, kinds: &[ResourceKind]) -> Result<SyncSnapshot, SyncError> {
        SyncClient::fetch_all(self, kinds).await
    }

    async fn submit(&self, commands: &[Command]) -> Result<CommandReport, SyncError> {
        SyncClient::submit(self, commands).await
    }
}
