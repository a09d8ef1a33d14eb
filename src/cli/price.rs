use clap::{Parser, ValueEnum};

use crate::{price::PriceSource, prelude::*, quantity::rate::KilowattHourRate};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PriceType {
    Fixed,
    Sensor,
}

#[derive(Parser)]
pub struct PriceArgs {
    #[clap(long = "price-type", env = "PRICE_TYPE", value_enum, default_value = "fixed")]
    price_type: PriceType,

    /// Fixed price in euros per kilowatt-hour, required for the fixed price type.
    #[clap(long = "fixed-price", env = "FIXED_PRICE")]
    fixed_price: Option<KilowattHourRate>,

    /// Entity holding the current price, required for the sensor price type.
    #[clap(long = "price-sensor", env = "PRICE_SENSOR")]
    price_sensor: Option<String>,
}

impl PriceArgs {
    /// Validate the combination, the same way the setup form does.
    pub fn source(&self) -> Result<PriceSource> {
        match self.price_type {
            PriceType::Fixed => {
                let price = self
                    .fixed_price
                    .filter(|price| *price != KilowattHourRate::ZERO)
                    .context("missing fixed price")?;
                Ok(PriceSource::Fixed(price))
            }
            PriceType::Sensor => {
                let entity_id = self
                    .price_sensor
                    .as_deref()
                    .map(str::trim)
                    .filter(|entity_id| !entity_id.is_empty())
                    .context("missing price sensor")?;
                Ok(PriceSource::Sensor { entity_id: entity_id.to_owned() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<PriceSource> {
        PriceArgs::try_parse_from(std::iter::once("octopus-ledger").chain(args.iter().copied()))?
            .source()
    }

    #[test]
    fn test_fixed() -> Result {
        assert_eq!(
            parse(&["--fixed-price", "0.25"])?,
            PriceSource::Fixed(KilowattHourRate(0.25))
        );
        Ok(())
    }

    #[test]
    fn test_missing_fixed_price() {
        assert!(parse(&["--price-type", "fixed"]).is_err());
        assert!(parse(&["--price-type", "fixed", "--fixed-price", "0"]).is_err());
    }

    #[test]
    fn test_sensor() -> Result {
        assert_eq!(
            parse(&["--price-type", "sensor", "--price-sensor", "sensor.electricity_price"])?,
            PriceSource::Sensor { entity_id: "sensor.electricity_price".to_owned() }
        );
        Ok(())
    }

    #[test]
    fn test_missing_price_sensor() {
        assert!(parse(&["--price-type", "sensor", "--fixed-price", "0.25"]).is_err());
        assert!(parse(&["--price-type", "sensor", "--price-sensor", " "]).is_err());
    }
}
