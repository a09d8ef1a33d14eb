pub mod websocket;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::{
    Client,
    StatusCode,
    Url,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    api::client,
    host::{SensorSink, StateSource},
    prelude::*,
    sensor::Sensor,
};

/// Home Assistant REST API client.
pub struct Api {
    client: Client,
    base_url: Url,
}

impl Api {
    /// Base URL is the API root, for example: `http://localhost:8123/api`.
    pub fn try_new(access_token: &str, base_url: Url) -> Result<Self> {
        let headers = HeaderMap::from_iter([(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}"))?,
        )]);
        let client = client::builder().default_headers(headers).build()?;
        Ok(Self { client, base_url })
    }

    fn state_url(&self, entity_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("invalid base URL"))?
            .pop_if_empty()
            .push("states")
            .push(entity_id);
        Ok(url)
    }

    #[instrument(skip_all, fields(entity_id = entity_id))]
    pub async fn get_entity_state(&self, entity_id: &str) -> Result<Option<EntityState>> {
        let response = self
            .client
            .get(self.state_url(entity_id)?)
            .send()
            .await
            .with_context(|| format!("failed to request the state of `{entity_id}`"))?;
        if response.status() == StatusCode::NOT_FOUND {
            warn!("the entity does not exist");
            return Ok(None);
        }
        let state: EntityState = response
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("failed to deserialize the state of `{entity_id}`"))?;
        debug!(state = %state.state, last_changed_at = %state.last_changed_at, "fetched");
        Ok(Some(state))
    }

    #[instrument(skip_all, fields(entity_id = entity_id, state = %state.state))]
    pub async fn set_entity_state(&self, entity_id: &str, state: &NewState) -> Result {
        self.client
            .post(self.state_url(entity_id)?)
            .json(state)
            .send()
            .await
            .with_context(|| format!("failed to update the state of `{entity_id}`"))?
            .error_for_status()?;
        debug!("updated");
        Ok(())
    }
}

#[async_trait]
impl StateSource for Api {
    async fn get_state(&self, entity_id: &str) -> Result<Option<String>> {
        Ok(self.get_entity_state(entity_id).await?.map(|state| state.state))
    }
}

#[async_trait]
impl SensorSink for Api {
    async fn publish(&self, sensor: &dyn Sensor) -> Result {
        let state =
            NewState { state: sensor.native_value().to_string(), attributes: sensor.attributes() };
        self.set_entity_state(&sensor.entity_id(), &state).await
    }
}

#[must_use]
#[derive(Clone, Debug, Deserialize)]
pub struct EntityState {
    pub entity_id: String,

    /// Raw state, also `unknown` or `unavailable` when the entity has no value.
    pub state: String,

    #[serde(rename = "last_changed")]
    pub last_changed_at: DateTime<Local>,
}

#[must_use]
#[derive(Clone, Debug, Serialize)]
pub struct NewState {
    pub state: String,
    pub attributes: Map<String, Value>,
}
