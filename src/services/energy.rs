//! Energy service: homes, schedules, rooms and thermostat modes.

use serde_json::Value;

use super::{Endpoint, Normalization, Params};
use crate::client::NetatmoClient;
use crate::error::ApiResult;

pub const HOMES_DATA: Endpoint = Endpoint::get("homesData", "/api/homesdata", &[], "get-homesdata");

pub const HOME_STATUS: Endpoint =
    Endpoint::get("homeStatus", "/api/homestatus", &["home_id"], "get-homestatus");

pub const CREATE_NEW_HOME_SCHEDULE: Endpoint = Endpoint::post(
    "createNewHomeSchedule",
    "/api/createnewhomeschedule",
    &["home_id", "timetable", "zone", "name", "hg_temp", "away_temp"],
    "set-createnewhomeschedule",
);

pub const DELETE_HOME_SCHEDULE: Endpoint = Endpoint::post(
    "deleteHomeSchedule",
    "/api/deletehomeschedule",
    &["home_id", "schedule_id"],
    "set-deletehomeschedule",
);

pub const RENAME_HOME_SCHEDULE: Endpoint = Endpoint::post(
    "renameHomeSchedule",
    "/api/renamehomeschedule",
    &["home_id", "schedule_id", "name"],
    "set-renamehomeschedule",
);

pub const SYNC_HOME_SCHEDULE: Endpoint = Endpoint::post(
    "syncHomeSchedule",
    "/api/synchomeschedule",
    &["home_id", "zones", "timetable", "hg_temp", "away_temp"],
    "set-synchomeschedule",
);

pub const SWITCH_HOME_SCHEDULE: Endpoint = Endpoint::post(
    "switchHomeSchedule",
    "/api/switchhomeschedule",
    &["schedule_id", "home_id"],
    "set-switchhomeschedule",
);

pub const GET_ROOM_MEASURE: Endpoint = Endpoint::get(
    "getRoomMeasure",
    "/api/getroommeasure",
    &["home_id", "room_id", "scale", "type"],
    "get-roommeasure",
)
.normalized(Normalization::Measure {
    forward: &["home_id", "room_id", "scale", "type"],
});

pub const SET_ROOM_THERM_POINT: Endpoint = Endpoint::post(
    "setRoomThermPoint",
    "/api/setroomthermpoint",
    &["home_id", "room_id", "mode"],
    "set-setroomthermpoint",
);

pub const SET_THERM_MODE: Endpoint = Endpoint::post(
    "setThermMode",
    "/api/setthermmode",
    &["home_id", "mode"],
    "set-setthermmode",
);

/// Thermostat and valve endpoints.
#[derive(Clone, Debug)]
pub struct EnergyService {
    client: NetatmoClient,
}

impl EnergyService {
    pub(crate) fn new(client: NetatmoClient) -> Self {
        Self { client }
    }

    /// Homes with their rooms, modules and schedules.
    pub async fn homes_data(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&HOMES_DATA, options).await
    }

    /// Current status of `home_id`.
    pub async fn home_status(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&HOME_STATUS, options).await
    }

    pub async fn create_new_home_schedule(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&CREATE_NEW_HOME_SCHEDULE, options).await
    }

    pub async fn delete_home_schedule(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&DELETE_HOME_SCHEDULE, options).await
    }

    pub async fn rename_home_schedule(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&RENAME_HOME_SCHEDULE, options).await
    }

    /// Replace the timetable and zones of the active schedule.
    pub async fn sync_home_schedule(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&SYNC_HOME_SCHEDULE, options).await
    }

    pub async fn switch_home_schedule(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&SWITCH_HOME_SCHEDULE, options).await
    }

    /// Room temperature history. Options are normalized like `getMeasure`.
    pub async fn get_room_measure(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&GET_ROOM_MEASURE, options).await
    }

    /// Set a room setpoint (`mode`, optionally `temp` and `endtime`).
    pub async fn set_room_therm_point(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&SET_ROOM_THERM_POINT, options).await
    }

    /// Set the home heating mode.
    pub async fn set_therm_mode(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&SET_THERM_MODE, options).await
    }
}
