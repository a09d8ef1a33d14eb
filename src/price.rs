use crate::{
    host::StateSource,
    prelude::*,
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
    reading::{available, parse_number},
};

#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub enum PriceSource {
    Fixed(KilowattHourRate),

    /// Latest numeric state of the entity.
    Sensor { entity_id: String },
}

impl PriceSource {
    /// Entity that needs to be watched for price changes, if any.
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            Self::Fixed(_) => None,
            Self::Sensor { entity_id } => Some(entity_id),
        }
    }

    /// Read the price afresh, falling back to zero when the sensor has no usable value.
    #[instrument(skip_all)]
    pub async fn current_price(&self, states: &impl StateSource) -> KilowattHourRate {
        match self {
            Self::Fixed(price) => *price,
            Self::Sensor { entity_id } => match states.get_state(entity_id).await {
                Ok(state) => available(state.as_deref())
                    .and_then(parse_number)
                    .map_or(KilowattHourRate::ZERO, KilowattHourRate),
                Err(error) => {
                    warn!(%entity_id, "failed to read the price: {error:#}");
                    KilowattHourRate::ZERO
                }
            },
        }
    }
}

pub fn monthly_cost(consumption: KilowattHours, price: KilowattHourRate) -> Cost {
    (consumption * price).round_to_cents()
}
