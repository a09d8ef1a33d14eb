//! Seams towards the home-automation host.

use async_trait::async_trait;

use crate::{prelude::*, sensor::Sensor, statistics::History};

/// Reads the current raw state of an entity.
#[async_trait]
pub trait StateSource: Sync {
    /// Returns [`None`] if the entity does not exist.
    async fn get_state(&self, entity_id: &str) -> Result<Option<String>>;
}

/// Publishes the derived sensors.
#[async_trait]
pub trait SensorSink: Sync {
    async fn publish(&self, sensor: &dyn Sensor) -> Result;
}

/// Long-term statistics store.
#[async_trait]
pub trait StatisticsSink: Sync {
    async fn import(&self, history: &History) -> Result;
}
