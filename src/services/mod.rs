//! Services
//!
//! Endpoint wrappers grouped the way the API documentation groups them.
//! Every endpoint is a static [`Endpoint`] descriptor; the wrappers only pick
//! the descriptor and hand it to [`NetatmoClient::call`].
//!
//! - **weather**: public data, station data and measurements
//! - **security**: cameras, events, persons and webhooks
//! - **energy**: homes, schedules, rooms and thermostat modes
//! - **aircare**: home coach data
//!
//! [`NetatmoClient::call`]: crate::NetatmoClient::call

pub mod aircare;
pub mod energy;
pub mod params;
pub mod security;
pub mod weather;

pub use aircare::AircareService;
pub use energy::EnergyService;
pub use params::{validate_required, Params};
pub use security::SecurityService;
pub use weather::WeatherService;

use crate::core::HttpMethod;
use crate::error::ApiResult;

/// Option handling applied before a request is sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Normalization {
    /// Options are forwarded as given.
    Passthrough,
    /// `required_data` is normalized, everything else forwarded.
    PublicData,
    /// Only the listed keys plus dates, `limit` and flags are forwarded.
    Measure { forward: &'static [&'static str] },
}

/// How a successful response is handed back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload {
    /// JSON with a `body` envelope.
    Json,
    /// Raw bytes.
    Raw,
}

/// Static description of one API endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Operation name used in error messages, e.g. `getMeasure`.
    pub name: &'static str,
    /// Path below the base URL.
    pub path: &'static str,
    /// HTTP method.
    pub method: HttpMethod,
    /// Options that must be present.
    pub required: &'static [&'static str],
    /// Label of the broadcast response event.
    pub label: &'static str,
    /// Option normalization.
    pub normalization: Normalization,
    /// Response handling.
    pub payload: Payload,
}

impl Endpoint {
    pub(crate) const fn get(
        name: &'static str,
        path: &'static str,
        required: &'static [&'static str],
        label: &'static str,
    ) -> Self {
        Self {
            name,
            path,
            method: HttpMethod::Get,
            required,
            label,
            normalization: Normalization::Passthrough,
            payload: Payload::Json,
        }
    }

    pub(crate) const fn post(
        name: &'static str,
        path: &'static str,
        required: &'static [&'static str],
        label: &'static str,
    ) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(name, path, required, label)
        }
    }

    pub(crate) const fn normalized(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub(crate) const fn raw(mut self) -> Self {
        self.payload = Payload::Raw;
        self
    }

    /// Context prefix for error messages.
    pub fn error_context(&self) -> String {
        format!("{} error", self.name)
    }

    /// Validate and normalize `options` into a request.
    pub fn describe(&self, options: Option<Params>) -> ApiResult<RequestDescriptor> {
        validate_required(self.name, options.as_ref(), self.required)?;

        let options = options.unwrap_or_default();
        let normalized = match self.normalization {
            Normalization::Passthrough => options,
            Normalization::PublicData => params::normalize_public_data(options),
            Normalization::Measure { forward } => {
                params::normalize_measure(self.name, &options, forward)?
            }
        };

        Ok(RequestDescriptor {
            method: self.method,
            path: self.path,
            params: params::to_wire_pairs(&normalized),
            requires_auth: true,
        })
    }
}

/// A single request, built per call and not retained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub path: &'static str,
    /// Wire parameters: query for GET, form for POST.
    pub params: Vec<(String, String)>,
    pub requires_auth: bool,
}

/// Every endpoint the client exposes.
pub const ENDPOINTS: &[Endpoint] = &[
    weather::GET_PUBLIC_DATA,
    weather::GET_STATIONS_DATA,
    weather::GET_MEASURE,
    security::GET_HOME_DATA,
    security::GET_EVENTS_UNTIL,
    security::GET_LAST_EVENT_OF,
    security::GET_NEXT_EVENTS,
    security::GET_CAMERA_PICTURE,
    security::SET_PERSONS_AWAY,
    security::SET_PERSONS_HOME,
    security::ADD_WEBHOOK,
    security::DROP_WEBHOOK,
    energy::HOMES_DATA,
    energy::HOME_STATUS,
    energy::CREATE_NEW_HOME_SCHEDULE,
    energy::DELETE_HOME_SCHEDULE,
    energy::RENAME_HOME_SCHEDULE,
    energy::SYNC_HOME_SCHEDULE,
    energy::SWITCH_HOME_SCHEDULE,
    energy::GET_ROOM_MEASURE,
    energy::SET_ROOM_THERM_POINT,
    energy::SET_THERM_MODE,
    aircare::GET_HOME_COACHS_DATA,
];

/// Look up an endpoint by operation name.
pub fn endpoint(name: &str) -> Option<&'static Endpoint> {
    ENDPOINTS.iter().find(|e| e.name == name)
}
