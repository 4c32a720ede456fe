//! Credential store and refresh scheduler.
//!
//! `TokenManager` owns the token pair for the whole process: requests read
//! the access token through it, refreshes go through its single-flight
//! gate, and two background timers keep the session alive while the
//! application is running. Clone is cheap - all clones share one
//! credential slot.

use std::sync::{Arc, Mutex as StdMutex, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::Duration;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::config::ClientConfig;

use super::claims;
use super::storage::TokenFile;
use super::{AuthError, AuthEvent, TokenPair};

/// Capacity of the auth event channel. Subscribers that lag only miss
/// stale events; the latest one carries all the state that matters.
const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Error, Debug)]
enum RefreshError {
    #[error("refresh request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("refresh rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    #[error("refresh response was not a token pair: {0}")]
    Decode(String),
}

/// The in-memory credential slot. The generation counter changes on every
/// store and clear so a refresh that raced a sign-out can tell it lost.
#[derive(Default)]
struct TokenCell {
    pair: Option<TokenPair>,
    generation: u64,
}

struct ScheduleHandles {
    expiry_check: JoinHandle<()>,
    refresh_health: JoinHandle<()>,
}

struct ManagerInner {
    http: Client,
    refresh_url: String,
    access_refresh_threshold: Duration,
    refresh_renew_threshold: Duration,
    expiry_check_interval: StdDuration,
    refresh_health_interval: StdDuration,
    tokens: RwLock<TokenCell>,
    file: TokenFile,
    /// Serializes refreshes. Waiters re-check the slot after acquiring,
    /// which collapses a stampede into one network call.
    refresh_gate: Mutex<()>,
    schedule: StdMutex<Option<ScheduleHandles>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.schedule.lock() {
            if let Some(handles) = slot.take() {
                handles.expiry_check.abort();
                handles.refresh_health.abort();
            }
        }
    }
}

/// Credential store and refresh scheduler handle.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<ManagerInner>,
}

impl TokenManager {
    /// Build a manager, loading any persisted pair from disk. An
    /// unreadable token file is logged and treated as no stored session.
    ///
    /// The background schedule is not started here; call
    /// [`start_schedule`](Self::start_schedule) from within the runtime
    /// (storing a pair also starts it).
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build refresh HTTP client")?;

        let file = TokenFile::new(config.token_file_path()?);
        let pair = match file.load() {
            Ok(pair) => pair,
            Err(err) => {
                warn!(error = %err, "Ignoring unreadable token file");
                None
            }
        };

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            inner: Arc::new(ManagerInner {
                http,
                refresh_url: config.endpoint("/auth/refresh"),
                access_refresh_threshold: config.access_refresh_threshold(),
                refresh_renew_threshold: config.refresh_renew_threshold(),
                expiry_check_interval: config.expiry_check_interval(),
                refresh_health_interval: config.refresh_health_interval(),
                tokens: RwLock::new(TokenCell { pair, generation: 0 }),
                file,
                refresh_gate: Mutex::new(()),
                schedule: StdMutex::new(None),
                events,
            }),
        })
    }

    // A poisoned lock means a reader panicked mid-access; the cell holds
    // plain values, so the data is still usable.
    fn cell(&self) -> RwLockReadGuard<'_, TokenCell> {
        self.inner.tokens.read().unwrap_or_else(|e| e.into_inner())
    }

    fn cell_mut(&self) -> RwLockWriteGuard<'_, TokenCell> {
        self.inner.tokens.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn access_token(&self) -> Option<String> {
        self.cell().pair.as_ref().map(|p| p.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.cell().pair.as_ref().map(|p| p.refresh_token.clone())
    }

    pub fn token_pair(&self) -> Option<TokenPair> {
        self.cell().pair.clone()
    }

    /// Both tokens are present and the refresh token has not expired.
    /// An expired access token does not matter here - it can be refreshed.
    pub fn has_valid_tokens(&self) -> bool {
        match self.cell().pair.as_ref() {
            Some(pair) => !claims::is_expired(&pair.refresh_token),
            None => false,
        }
    }

    /// Replace both tokens atomically, persist them, and (re)start the
    /// background schedule. Persistence failures are logged, not fatal:
    /// the in-memory session keeps working for this process.
    pub fn store(&self, pair: TokenPair) {
        {
            let mut cell = self.cell_mut();
            cell.pair = Some(pair.clone());
            cell.generation += 1;
        }
        self.persist(Some(&pair));
        self.start_schedule();
    }

    /// Remove both tokens, persist the removal, and stop the schedule.
    /// Idempotent.
    pub fn clear(&self) {
        let had_tokens = {
            let mut cell = self.cell_mut();
            let had = cell.pair.is_some();
            cell.pair = None;
            cell.generation += 1;
            had
        };
        self.persist(None);
        self.stop_schedule();
        if had_tokens {
            debug!("Cleared stored credentials");
        }
    }

    /// Store only if no store/clear happened since `expected_generation`
    /// was read. A refresh that raced a sign-out loses here and must not
    /// resurrect the session.
    fn store_if_current(&self, pair: TokenPair, expected_generation: u64) -> bool {
        {
            let mut cell = self.cell_mut();
            if cell.generation != expected_generation {
                return false;
            }
            cell.pair = Some(pair.clone());
            cell.generation += 1;
        }
        self.persist(Some(&pair));
        self.start_schedule();
        true
    }

    fn persist(&self, pair: Option<&TokenPair>) {
        let result = match pair {
            Some(pair) => self.inner.file.save(pair),
            None => self.inner.file.clear(),
        };
        if let Err(err) = result {
            error!(
                error = %err,
                path = %self.inner.file.path().display(),
                "Failed to persist token state"
            );
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    /// Broadcast that the session is gone and sign-in is needed. Emitted
    /// by the request pipeline on terminal failures under redirect policy.
    pub(crate) fn signal_sign_in_required(&self) {
        let _ = self.inner.events.send(AuthEvent::SignInRequired);
    }

    // ========================================================================
    // On-demand refresh
    // ========================================================================

    /// Return an access token that is safe to attach to a request,
    /// refreshing first when the stored one is missing or expiring soon.
    ///
    /// Concurrent callers share a single refresh: the first through the
    /// gate performs the network call, the rest find the fresh pair when
    /// they re-check. A failed refresh clears credentials and is terminal.
    pub async fn ensure_fresh_access_token(&self) -> Result<String, AuthError> {
        self.fresh_access_token(None).await
    }

    /// Like [`ensure_fresh_access_token`](Self::ensure_fresh_access_token),
    /// but treats `rejected` as stale even if its local expiry looks fine.
    /// The pipeline passes the token the server just refused, which covers
    /// clock skew and server-side revocation.
    pub(crate) async fn fresh_access_token(
        &self,
        rejected: Option<&str>,
    ) -> Result<String, AuthError> {
        if let Some(token) = self.usable_access_token(rejected) {
            return Ok(token);
        }

        let _guard = self.inner.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate.
        if let Some(token) = self.usable_access_token(rejected) {
            return Ok(token);
        }

        self.refresh_locked().await
    }

    fn usable_access_token(&self, rejected: Option<&str>) -> Option<String> {
        let token = self.access_token()?;
        if rejected == Some(token.as_str()) {
            return None;
        }
        if claims::is_expiring_soon(&token, self.inner.access_refresh_threshold) {
            return None;
        }
        Some(token)
    }

    /// Perform the refresh. Caller must hold `refresh_gate`.
    async fn refresh_locked(&self) -> Result<String, AuthError> {
        let (refresh_token, generation) = {
            let cell = self.cell();
            match cell.pair.as_ref() {
                Some(pair) => (pair.refresh_token.clone(), cell.generation),
                None => return Err(AuthError::SessionExpired),
            }
        };

        match self.request_refresh(&refresh_token).await {
            Ok(pair) => {
                if !self.store_if_current(pair.clone(), generation) {
                    debug!("Discarding refresh that completed after sign-out");
                    return Err(AuthError::SessionExpired);
                }
                debug!("Access token refreshed");
                let _ = self.inner.events.send(AuthEvent::Refreshed);
                Ok(pair.access_token)
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed; clearing credentials");
                self.clear();
                Err(AuthError::SessionExpired)
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<TokenPair, RefreshError> {
        let response = self
            .inner
            .http
            .post(&self.inner.refresh_url)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                detail: body.chars().take(200).collect(),
            });
        }

        let token: RefreshResponse = response
            .json()
            .await
            .map_err(|err| RefreshError::Decode(err.to_string()))?;

        // The backend rotates the refresh token on every refresh.
        Ok(TokenPair {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        })
    }

    // ========================================================================
    // Background schedule
    // ========================================================================

    /// Start (or restart) the two lifecycle timers: the access-token
    /// expiry check and the refresh-token health check. Must be called
    /// from within the tokio runtime.
    pub fn start_schedule(&self) {
        let expiry_check = self.spawn_expiry_check();
        let refresh_health = self.spawn_refresh_health();

        // Spawn replacements before aborting the old tasks, so a tick task
        // that triggered this restart is never left without a successor.
        let mut slot = self
            .inner
            .schedule
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(old) = slot.replace(ScheduleHandles { expiry_check, refresh_health }) {
            old.expiry_check.abort();
            old.refresh_health.abort();
        }
    }

    pub fn stop_schedule(&self) {
        let mut slot = self
            .inner
            .schedule
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(handles) = slot.take() {
            handles.expiry_check.abort();
            handles.refresh_health.abort();
        }
    }

    fn spawn_expiry_check(&self) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.expiry_check_interval;
        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                let Some(manager) = Self::upgrade(&weak) else { return };
                manager.run_expiry_check().await;
            }
        })
    }

    fn spawn_refresh_health(&self) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let period = self.inner.refresh_health_interval;
        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                let Some(manager) = Self::upgrade(&weak) else { return };
                manager.run_refresh_health_check().await;
            }
        })
    }

    fn upgrade(weak: &Weak<ManagerInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// One tick of the expiry timer. Errors are logged and swallowed;
    /// the on-demand path surfaces failures to callers.
    async fn run_expiry_check(&self) {
        if self.refresh_token().is_none() {
            return;
        }
        if let Err(err) = self.ensure_fresh_access_token().await {
            debug!(error = %err, "Scheduled expiry check could not refresh");
        }
    }

    /// One tick of the refresh-token health timer. Renewing early keeps
    /// active users signed in across the refresh token's own expiry.
    async fn run_refresh_health_check(&self) {
        let Some(refresh_token) = self.refresh_token() else { return };
        if !claims::is_expiring_soon(&refresh_token, self.inner.refresh_renew_threshold) {
            return;
        }

        debug!("Refresh token nearing expiry; renewing session");
        let _guard = self.inner.refresh_gate.lock().await;

        // Re-check under the gate; a concurrent refresh may have rotated it.
        let Some(refresh_token) = self.refresh_token() else { return };
        if !claims::is_expiring_soon(&refresh_token, self.inner.refresh_renew_threshold) {
            return;
        }

        if self.refresh_locked().await.is_err() {
            debug!("Scheduled session renewal failed; credentials were cleared");
        }
    }
}
