//! Security service: cameras, events, persons and webhooks.

use serde_json::Value;

use super::{Endpoint, Params};
use crate::client::NetatmoClient;
use crate::error::ApiResult;

pub const GET_HOME_DATA: Endpoint =
    Endpoint::get("getHomeData", "/api/gethomedata", &[], "get-homedata");

pub const GET_EVENTS_UNTIL: Endpoint = Endpoint::get(
    "getEventsUntil",
    "/api/geteventsuntil",
    &["home_id", "event_id"],
    "get-eventsuntil",
);

pub const GET_LAST_EVENT_OF: Endpoint = Endpoint::get(
    "getLastEventOf",
    "/api/getlasteventof",
    &["home_id", "person_id"],
    "get-lasteventof",
);

pub const GET_NEXT_EVENTS: Endpoint = Endpoint::get(
    "getNextEvents",
    "/api/getnextevents",
    &["home_id", "event_id"],
    "get-nextevents",
);

pub const GET_CAMERA_PICTURE: Endpoint = Endpoint::get(
    "getCameraPicture",
    "/api/getcamerapicture",
    &["image_id", "key"],
    "get-camerapicture",
)
.raw();

pub const SET_PERSONS_AWAY: Endpoint = Endpoint::post(
    "setPersonsAway",
    "/api/setpersonsaway",
    &["home_id"],
    "set-personsaway",
);

pub const SET_PERSONS_HOME: Endpoint = Endpoint::post(
    "setPersonsHome",
    "/api/setpersonshome",
    &["home_id"],
    "set-personshome",
);

pub const ADD_WEBHOOK: Endpoint =
    Endpoint::post("addWebHook", "/api/addwebhook", &["url"], "set-addwebhook");

pub const DROP_WEBHOOK: Endpoint =
    Endpoint::post("dropWebHook", "/api/dropwebhook", &[], "set-dropwebhook");

/// Camera and home security endpoints.
#[derive(Clone, Debug)]
pub struct SecurityService {
    client: NetatmoClient,
}

impl SecurityService {
    pub(crate) fn new(client: NetatmoClient) -> Self {
        Self { client }
    }

    /// Homes, cameras, persons and recent events.
    pub async fn get_home_data(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&GET_HOME_DATA, options).await
    }

    /// Events until `event_id`.
    pub async fn get_events_until(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&GET_EVENTS_UNTIL, options).await
    }

    /// Last event of `person_id`.
    pub async fn get_last_event_of(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&GET_LAST_EVENT_OF, options).await
    }

    /// Events older than `event_id`.
    pub async fn get_next_events(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&GET_NEXT_EVENTS, options).await
    }

    /// Snapshot or event picture, returned as raw image bytes.
    pub async fn get_camera_picture(&self, options: Option<Params>) -> ApiResult<Vec<u8>> {
        self.client.call_raw(&GET_CAMERA_PICTURE, options).await
    }

    pub async fn set_persons_away(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&SET_PERSONS_AWAY, options).await
    }

    pub async fn set_persons_home(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&SET_PERSONS_HOME, options).await
    }

    /// Register a webhook `url`.
    pub async fn add_webhook(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&ADD_WEBHOOK, options).await
    }

    /// Drop the registered webhook.
    pub async fn drop_webhook(&self, options: Option<Params>) -> ApiResult<Value> {
        self.client.call(&DROP_WEBHOOK, options).await
    }
}
