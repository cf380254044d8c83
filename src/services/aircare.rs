//! Aircare service.

use serde_json::Value;

use super::{Endpoint, Params};
use crate::client::NetatmoClient;
use crate::error::ApiResult;

pub const GET_HOME_COACHS_DATA: Endpoint = Endpoint::get(
    "getHomeCoachsData",
    "/api/gethomecoachsdata",
    &[],
    "get-homecoachesdata",
);

/// Indoor air quality endpoints.
#[derive(Clone, Debug)]
pub struct AircareService {
    client: NetatmoClient,
}

impl AircareService {
    pub(crate) fn new(client: NetatmoClient) -> Self {
        Self { client }
    }

    /// Data of every home coach the user owns.
    pub async fn get_home_coachs_data(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&GET_HOME_COACHS_DATA, options).await
    }
}
