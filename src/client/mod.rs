//! Netatmo Client
//!
//! High-level client combining the session, the executor and the services.

pub mod executor;

pub use executor::RequestExecutor;

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info_span, Instrument};

use crate::core::{
    ClientEvent, EventBus, HttpResponse, HttpTransport, ReqwestHttpTransport, Scheduler,
    TokioScheduler,
};
use crate::error::{ApiResult, ConfigurationError, ErrorClassifier, Severity};
use crate::services::{
    AircareService, Endpoint, EnergyService, Params, SecurityService, WeatherService,
};
use crate::session::SessionManager;
use crate::types::{Credentials, NetatmoConfig, SessionState};

struct ClientInner {
    session: SessionManager,
    executor: RequestExecutor,
    events: EventBus,
}

/// Netatmo API client.
///
/// Cheap to clone; clones share one session. Endpoint calls made before the
/// session is authenticated wait for it.
#[derive(Clone)]
pub struct NetatmoClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for NetatmoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetatmoClient")
            .field("base_url", &self.inner.session.config().base_url.as_str())
            .field("state", &self.inner.session.state())
            .finish()
    }
}

impl NetatmoClient {
    /// Start a client builder.
    pub fn builder() -> NetatmoClientBuilder {
        NetatmoClientBuilder::new()
    }

    /// Create a client with default transport and scheduler.
    pub fn new(config: NetatmoConfig, credentials: Credentials) -> ApiResult<Self> {
        Self::builder().config(config).credentials(credentials).build()
    }

    /// Create a client from `NETATMO_*` environment variables.
    pub fn from_env() -> ApiResult<Self> {
        let config = NetatmoConfig::from_env()?;
        let credentials = Credentials::from_env()?;
        Self::new(config, credentials)
    }

    /// Authenticate in the background.
    ///
    /// Endpoint calls can be made right away; they proceed once the returned
    /// task succeeds.
    pub fn start(&self) -> JoinHandle<ApiResult<()>> {
        let session = self.inner.session.clone();
        tokio::spawn(
            async move { session.authenticate().await }
                .instrument(info_span!("netatmo_authenticate")),
        )
    }

    /// Authenticate and wait for the outcome.
    pub async fn authenticate(&self) -> ApiResult<()> {
        self.inner.session.authenticate().await
    }

    /// Subscribe to client events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// Session lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.session.state()
    }

    /// Session manager of this client.
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// Fail every call still waiting for authentication.
    pub fn cancel_pending(&self) -> usize {
        self.inner.session.cancel_pending()
    }

    pub fn weather(&self) -> WeatherService {
        WeatherService::new(self.clone())
    }

    pub fn security(&self) -> SecurityService {
        SecurityService::new(self.clone())
    }

    pub fn energy(&self) -> EnergyService {
        EnergyService::new(self.clone())
    }

    pub fn aircare(&self) -> AircareService {
        AircareService::new(self.clone())
    }

    fn classifier(&self) -> &ErrorClassifier {
        self.inner.session.classifier()
    }

    /// Call a JSON endpoint and return the payload inside its `body` envelope.
    ///
    /// Responses without an envelope, such as `{"status": "ok"}` from write
    /// endpoints, are returned whole.
    pub async fn call(&self, endpoint: &Endpoint, options: Option<Params>) -> ApiResult<Value> {
        let response = self.dispatch(endpoint, options).await?;

        let document: Value = serde_json::from_slice(&response.body).map_err(|e| {
            self.classifier().protocol(
                &endpoint.error_context(),
                format!("Invalid JSON response: {}", e),
                Severity::Warning,
            )
        })?;

        let payload = match document {
            Value::Object(mut map) if map.contains_key("body") => {
                map.remove("body").unwrap_or(Value::Null)
            }
            Value::Object(map) => Value::Object(map),
            other => {
                return Err(self.classifier().protocol(
                    &endpoint.error_context(),
                    format!("Unexpected response envelope: {}", type_name(&other)),
                    Severity::Warning,
                ));
            }
        };

        self.inner.events.publish(ClientEvent::Response {
            label: endpoint.label,
            body: payload.clone(),
        });
        Ok(payload)
    }

    /// Call an endpoint and return the raw response body.
    pub async fn call_raw(
        &self,
        endpoint: &Endpoint,
        options: Option<Params>,
    ) -> ApiResult<Vec<u8>> {
        let response = self.dispatch(endpoint, options).await?;
        self.inner.events.publish(ClientEvent::Raw {
            label: endpoint.label,
            body: response.body.clone(),
        });
        Ok(response.body)
    }

    async fn dispatch(
        &self,
        endpoint: &Endpoint,
        options: Option<Params>,
    ) -> ApiResult<HttpResponse> {
        self.inner.session.ready(endpoint.name).await?;

        let descriptor = endpoint
            .describe(options)
            .map_err(|e| self.classifier().report(e))?;

        debug!(endpoint = endpoint.name, "Dispatching");

        let context = endpoint.error_context();
        match self.inner.executor.execute(&descriptor).await {
            Ok(response) if response.is_ok() => Ok(response),
            Ok(response) => Err(self.classifier().classify(&response, &context, Severity::Warning)),
            Err(failure) => Err(self.classifier().classify(&failure, &context, Severity::Warning)),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Client builder.
#[derive(Default)]
pub struct NetatmoClientBuilder {
    config: Option<NetatmoConfig>,
    credentials: Option<Credentials>,
    transport: Option<Arc<dyn HttpTransport>>,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl NetatmoClientBuilder {
    /// Create new client builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration. Defaults to [`NetatmoConfig::default`].
    pub fn config(mut self, config: NetatmoConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Use a custom HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom scheduler for token refresh.
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Build the client. Nothing is sent until the client authenticates.
    pub fn build(self) -> ApiResult<NetatmoClient> {
        let config = self.config.unwrap_or_default();
        let credentials = self.credentials.ok_or_else(|| ConfigurationError::MissingField {
            field: "credentials".to_string(),
        })?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestHttpTransport::with_options(
                config.timeout,
                config.max_response_size,
            )?),
        };
        let scheduler: Arc<dyn Scheduler> = self
            .scheduler
            .unwrap_or_else(|| Arc::new(TokioScheduler::new()));

        let events = EventBus::new(config.event_capacity);
        let session = SessionManager::new(
            config,
            credentials,
            transport.clone(),
            scheduler,
            events.clone(),
        );
        let executor = RequestExecutor::new(session.clone(), transport);

        Ok(NetatmoClient {
            inner: Arc::new(ClientInner {
                session,
                executor,
                events,
            }),
        })
    }
}
