//! Weather service: public data, station data and measurements.

use serde_json::Value;

use super::{Endpoint, Normalization, Params};
use crate::client::NetatmoClient;
use crate::error::ApiResult;

pub const GET_PUBLIC_DATA: Endpoint = Endpoint::get(
    "getPublicData",
    "/api/getpublicdata",
    &["lat_ne", "lon_ne", "lat_sw", "lon_sw"],
    "get-publicdata",
)
.normalized(Normalization::PublicData);

pub const GET_STATIONS_DATA: Endpoint =
    Endpoint::get("getStationsData", "/api/getstationsdata", &[], "get-stationsdata");

pub const GET_MEASURE: Endpoint = Endpoint::get(
    "getMeasure",
    "/api/getmeasure",
    &["device_id", "scale", "type"],
    "get-measure",
)
.normalized(Normalization::Measure {
    forward: &["device_id", "module_id", "scale", "type"],
});

/// Weather station endpoints.
#[derive(Clone, Debug)]
pub struct WeatherService {
    client: NetatmoClient,
}

impl WeatherService {
    pub(crate) fn new(client: NetatmoClient) -> Self {
        Self { client }
    }

    /// Public station data inside a bounding box.
    ///
    /// Requires `lat_ne`, `lon_ne`, `lat_sw`, `lon_sw`. `required_data` may be
    /// a list.
    pub async fn get_public_data(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&GET_PUBLIC_DATA, options).await
    }

    /// Stations owned by the user.
    pub async fn get_stations_data(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&GET_STATIONS_DATA, options).await
    }

    /// Measurements of a device or module.
    ///
    /// Requires `device_id`, `scale`, `type`. Dates may be seconds,
    /// milliseconds or RFC 3339; `limit` is capped at 1024.
    pub async fn get_measure(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&GET_MEASURE, options).await
    }
}
