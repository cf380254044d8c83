//! Session Manager
//!
//! Owns the per-client session: obtains the first token, refreshes it on a
//! timer and tells parked calls when they may proceed.

use chrono::Utc;
use futures::FutureExt;
use parking_lot::Mutex;
use secrecy::ExposeSecret;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::client::executor::build_request;
use crate::core::{
    ClientEvent, EventBus, HttpMethod, HttpRequest, HttpTransport, ScheduledTask, Scheduler,
};
use crate::error::{ApiError, ApiResult, ConfigurationError, ErrorClassifier, ErrorKind, Severity};
use crate::session::gate::PendingQueue;
use crate::types::{
    Credentials, Grant, NetatmoConfig, Session, SessionState, TokenResponse, TOKEN_PATH,
};

const AUTH_CONTEXT: &str = "Authenticate error";
const REFRESH_CONTEXT: &str = "Authenticate refresh error";

pub(crate) struct Shared {
    pub(crate) session: Session,
    pub(crate) pending: PendingQueue,
    refresh_timer: Option<RefreshTimer>,
    timer_generation: u64,
}

struct RefreshTimer {
    generation: u64,
    handle: Box<dyn ScheduledTask>,
}

impl Shared {
    fn cancel_refresh_timer(&mut self) {
        if let Some(timer) = self.refresh_timer.take() {
            timer.handle.cancel();
        }
    }
}

pub(crate) struct SessionInner {
    pub(crate) config: NetatmoConfig,
    pub(crate) credentials: Credentials,
    pub(crate) transport: Arc<dyn HttpTransport>,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) classifier: ErrorClassifier,
    pub(crate) shared: Mutex<Shared>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.shared.get_mut().cancel_refresh_timer();
    }
}

/// Per-client OAuth2 session manager.
///
/// Cheap to clone; clones share one session. Refresh timers only hold the
/// session weakly, so dropping the last clone stops them.
#[derive(Clone)]
pub struct SessionManager {
    pub(crate) inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &self.inner.shared.lock().session)
            .finish()
    }
}

impl SessionManager {
    /// Create a manager. Nothing is sent until [`SessionManager::authenticate`].
    pub fn new(
        config: NetatmoConfig,
        credentials: Credentials,
        transport: Arc<dyn HttpTransport>,
        scheduler: Arc<dyn Scheduler>,
        events: EventBus,
    ) -> Self {
        let pending = PendingQueue::new(config.max_pending_calls);
        Self {
            inner: Arc::new(SessionInner {
                config,
                credentials,
                transport,
                scheduler,
                classifier: ErrorClassifier::new(events),
                shared: Mutex::new(Shared {
                    session: Session::default(),
                    pending,
                    refresh_timer: None,
                    timer_generation: 0,
                }),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.shared.lock().session.state
    }

    /// Snapshot of the session.
    pub fn session(&self) -> Session {
        self.inner.shared.lock().session.clone()
    }

    /// Current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.inner.shared.lock().session.access_token.clone()
    }

    /// Check if a refresh is currently scheduled.
    pub fn has_refresh_scheduled(&self) -> bool {
        self.inner
            .shared
            .lock()
            .refresh_timer
            .as_ref()
            .map_or(false, |t| !t.handle.is_cancelled())
    }

    /// Configuration in use.
    pub fn config(&self) -> &NetatmoConfig {
        &self.inner.config
    }

    /// Credentials in use.
    pub fn credentials(&self) -> &Credentials {
        &self.inner.credentials
    }

    /// Classifier shared with the rest of the client.
    pub fn classifier(&self) -> &ErrorClassifier {
        &self.inner.classifier
    }

    /// Subscribe to client events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.classifier.events().subscribe()
    }

    /// Obtain an access token using the configured grant.
    ///
    /// On success parked calls are released and `Authenticated` is broadcast.
    /// On failure the error is broadcast as critical, parked calls fail with
    /// it, and a later call may try again.
    pub async fn authenticate(&self) -> ApiResult<()> {
        if let Grant::PreissuedToken { token } = &self.inner.credentials.grant {
            let released = {
                let mut shared = self.inner.shared.lock();
                shared.cancel_refresh_timer();
                shared.session = Session {
                    access_token: Some(token.expose_secret().clone()),
                    refresh_token: None,
                    expires_at: None,
                    state: SessionState::Authenticated,
                };
                shared.pending.release_all()
            };
            info!(released, "Using pre-issued access token");
            self.inner.classifier.events().publish(ClientEvent::Authenticated);
            return Ok(());
        }

        let form = match self.inner.credentials.token_form() {
            Ok(form) => form,
            Err(error) => {
                let error = self.inner.classifier.report(error);
                return Err(self.fail_authentication(error));
            }
        };

        let request = match token_request(&self.inner.config, &form) {
            Ok(request) => request,
            Err(error) => {
                let error = self.inner.classifier.report(error.into());
                return Err(self.fail_authentication(error));
            }
        };

        {
            let mut shared = self.inner.shared.lock();
            if !shared.session.is_usable() {
                shared.session.state = SessionState::Authenticating;
            }
        }

        debug!(
            grant_type = self.inner.credentials.grant.grant_type().unwrap_or_default(),
            "Requesting access token"
        );

        let response = match self.inner.transport.send(request).await {
            Ok(response) if response.is_ok() => response,
            Ok(response) => {
                let error = self.inner.classifier.classify_as(
                    ErrorKind::Auth,
                    &response,
                    AUTH_CONTEXT,
                    Severity::Critical,
                );
                return Err(self.fail_authentication(error));
            }
            Err(failure) => {
                let error = self.inner.classifier.classify_as(
                    ErrorKind::Auth,
                    &failure,
                    AUTH_CONTEXT,
                    Severity::Critical,
                );
                return Err(self.fail_authentication(error));
            }
        };

        let token: TokenResponse = match serde_json::from_slice(&response.body) {
            Ok(token) => token,
            Err(e) => {
                let error = self.inner.classifier.protocol(
                    AUTH_CONTEXT,
                    format!("Invalid token response: {}", e),
                    Severity::Critical,
                );
                return Err(self.fail_authentication(error));
            }
        };

        let released = install_token(&self.inner, &token);
        info!(
            released,
            expires_in = ?token.expires_in,
            "Authenticated"
        );
        self.inner.classifier.events().publish(ClientEvent::Authenticated);
        Ok(())
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// A failure is reported as a warning and leaves the current token and
    /// any scheduled refresh in place. On success the scheduled refresh is
    /// replaced.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<()> {
        self.refresh_with(refresh_token).await
    }

    async fn scheduled_refresh(&self, generation: u64, refresh_token: Option<String>) {
        let refresh_token = {
            let mut shared = self.inner.shared.lock();
            match &shared.refresh_timer {
                Some(timer) if timer.generation == generation => {}
                _ => {
                    debug!(generation, "Skipping superseded token refresh");
                    return;
                }
            }
            // The running task owns this handle; cancelling it would abort us.
            shared.refresh_timer = None;
            refresh_token.or_else(|| shared.session.refresh_token.clone())
        };

        match refresh_token {
            Some(refresh_token) => {
                let _ = self.refresh_with(&refresh_token).await;
            }
            None => {
                self.inner.classifier.report(ApiError::new(
                    ErrorKind::Auth,
                    format!("{}: No refresh token", REFRESH_CONTEXT),
                    Severity::Warning,
                ));
            }
        }
    }

    async fn refresh_with(&self, refresh_token: &str) -> ApiResult<()> {
        let form = self
            .inner
            .credentials
            .refresh_form(refresh_token)
            .map_err(|e| self.inner.classifier.report(e))?;
        let request = token_request(&self.inner.config, &form)
            .map_err(|e| self.inner.classifier.report(e.into()))?;

        {
            let mut shared = self.inner.shared.lock();
            if shared.session.state == SessionState::Authenticated {
                shared.session.state = SessionState::Refreshing;
            }
        }

        debug!("Refreshing access token");

        let outcome = match self.inner.transport.send(request).await {
            Ok(response) if response.is_ok() => {
                serde_json::from_slice::<TokenResponse>(&response.body).map_err(|e| {
                    self.inner.classifier.protocol(
                        REFRESH_CONTEXT,
                        format!("Invalid token response: {}", e),
                        Severity::Warning,
                    )
                })
            }
            Ok(response) => Err(self.inner.classifier.classify_as(
                ErrorKind::Auth,
                &response,
                REFRESH_CONTEXT,
                Severity::Warning,
            )),
            Err(failure) => Err(self.inner.classifier.classify_as(
                ErrorKind::Auth,
                &failure,
                REFRESH_CONTEXT,
                Severity::Warning,
            )),
        };

        match outcome {
            Ok(token) => {
                install_token(&self.inner, &token);
                info!(expires_in = ?token.expires_in, "Access token refreshed");
                Ok(())
            }
            Err(error) => {
                let mut shared = self.inner.shared.lock();
                if shared.session.state == SessionState::Refreshing {
                    shared.session.state = SessionState::Authenticated;
                }
                Err(error)
            }
        }
    }

    fn fail_authentication(&self, error: ApiError) -> ApiError {
        let failed = {
            let mut shared = self.inner.shared.lock();
            shared.session.state = if shared.session.access_token.is_some() {
                SessionState::Authenticated
            } else {
                SessionState::Failed
            };
            shared.pending.fail_all(&error)
        };
        warn!(failed_calls = failed, "Authentication failed");
        error
    }
}

fn token_request(
    config: &NetatmoConfig,
    form: &[(String, String)],
) -> Result<HttpRequest, ConfigurationError> {
    build_request(config, HttpMethod::Post, TOKEN_PATH, form, None)
}

/// Store a token response, replace the refresh timer and release parked calls.
fn install_token(inner: &Arc<SessionInner>, token: &TokenResponse) -> usize {
    let mut shared = inner.shared.lock();
    shared.session.apply(token, Utc::now());
    shared.cancel_refresh_timer();

    if let Some(expires_in) = token.expires_in {
        let delay = Duration::from_secs(expires_in).saturating_sub(inner.config.refresh_margin);
        shared.timer_generation += 1;
        let generation = shared.timer_generation;
        let handle = schedule_refresh(
            inner,
            delay,
            generation,
            shared.session.refresh_token.clone(),
        );
        shared.refresh_timer = Some(RefreshTimer { generation, handle });
        debug!(delay_secs = delay.as_secs(), generation, "Scheduled token refresh");
    }

    shared.pending.release_all()
}

fn schedule_refresh(
    inner: &Arc<SessionInner>,
    delay: Duration,
    generation: u64,
    refresh_token: Option<String>,
) -> Box<dyn ScheduledTask> {
    let weak: Weak<SessionInner> = Arc::downgrade(inner);
    inner.scheduler.schedule(
        delay,
        async move {
            if let Some(inner) = weak.upgrade() {
                SessionManager { inner }
                    .scheduled_refresh(generation, refresh_token)
                    .await;
            }
        }
        .boxed(),
    )
}
