use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::{
    accumulator::Snapshot,
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
};

/// Derived value exposed to the host.
pub trait Sensor: Send + Sync {
    /// Kind of the sensor, unique within an instance.
    fn kind(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn native_value(&self) -> f64;

    fn unit(&self) -> &'static str;

    fn device_class(&self) -> Option<DeviceClass> {
        None
    }

    fn state_class(&self) -> StateClass;

    fn device(&self) -> &Device;

    fn extra_attributes(&self) -> Map<String, Value> {
        Map::new()
    }

    fn unique_id(&self) -> String {
        format!("octopus_{}_{}", self.kind(), self.device().instance_id)
    }

    fn entity_id(&self) -> String {
        format!("sensor.{}", self.unique_id())
    }

    /// Full attribute set published along with the state.
    fn attributes(&self) -> Map<String, Value> {
        let mut attributes = self.extra_attributes();
        attributes.insert("friendly_name".to_owned(), self.name().into());
        attributes.insert("unit_of_measurement".to_owned(), self.unit().into());
        attributes.insert("state_class".to_owned(), json!(self.state_class()));
        if let Some(device_class) = self.device_class() {
            attributes.insert("device_class".to_owned(), json!(device_class));
        }
        attributes.insert("unique_id".to_owned(), self.unique_id().into());
        attributes.insert("device".to_owned(), json!(self.device().info));
        attributes
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Energy,
    Monetary,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    Total,
}

/// Configured instance, grouping its sensors under one device.
#[must_use]
#[derive(Clone, Debug)]
pub struct Device {
    pub instance_id: String,
    pub info: DeviceInfo,
}

impl Device {
    /// The device is keyed by the meter value entity.
    pub fn new(instance_id: impl Into<String>, value_entity_id: &str) -> Self {
        Self { instance_id: instance_id.into(), info: DeviceInfo::for_meter(value_entity_id) }
    }
}

#[must_use]
#[derive(Clone, Debug, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: &'static str,
    pub manufacturer: &'static str,
    pub model: &'static str,
    pub sw_version: &'static str,
    pub hw_version: &'static str,
    pub entry_type: &'static str,
}

impl DeviceInfo {
    fn for_meter(value_entity_id: &str) -> Self {
        Self {
            identifier: format!("device_{value_entity_id}"),
            name: "Octopus Electricity Monitor",
            manufacturer: "Octopus Adapter",
            model: "Monthly Cost Calculator",
            sw_version: env!("CARGO_PKG_VERSION"),
            hw_version: "Software",
            entry_type: "service",
        }
    }
}

pub struct CurrentPrice<'a> {
    pub device: &'a Device,
    pub price: KilowattHourRate,
}

impl Sensor for CurrentPrice<'_> {
    fn kind(&self) -> &'static str {
        "current_price"
    }

    fn name(&self) -> &'static str {
        "Octopus Current Price"
    }

    fn native_value(&self) -> f64 {
        self.price.0
    }

    fn unit(&self) -> &'static str {
        KilowattHourRate::UNIT
    }

    fn state_class(&self) -> StateClass {
        StateClass::Measurement
    }

    fn device(&self) -> &Device {
        self.device
    }
}

pub struct MonthlyEnergy<'a> {
    pub device: &'a Device,
    pub consumption: KilowattHours,
}

impl Sensor for MonthlyEnergy<'_> {
    fn kind(&self) -> &'static str {
        "monthly_energy"
    }

    fn name(&self) -> &'static str {
        "Octopus Monthly Energy"
    }

    fn native_value(&self) -> f64 {
        self.consumption.0
    }

    fn unit(&self) -> &'static str {
        KilowattHours::UNIT
    }

    fn device_class(&self) -> Option<DeviceClass> {
        Some(DeviceClass::Energy)
    }

    fn state_class(&self) -> StateClass {
        StateClass::Total
    }

    fn device(&self) -> &Device {
        self.device
    }
}

pub struct MonthlyCost<'a> {
    pub device: &'a Device,
    pub cost: Cost,
    pub price: KilowattHourRate,
    pub consumption: KilowattHours,
}

impl Sensor for MonthlyCost<'_> {
    fn kind(&self) -> &'static str {
        "monthly_cost"
    }

    fn name(&self) -> &'static str {
        "Octopus Monthly Cost"
    }

    fn native_value(&self) -> f64 {
        self.cost.0
    }

    fn unit(&self) -> &'static str {
        Cost::UNIT
    }

    fn device_class(&self) -> Option<DeviceClass> {
        Some(DeviceClass::Monetary)
    }

    fn state_class(&self) -> StateClass {
        StateClass::Total
    }

    fn device(&self) -> &Device {
        self.device
    }

    fn extra_attributes(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        attributes.insert("current_price".to_owned(), self.price.0.into());
        attributes.insert("price_unit".to_owned(), KilowattHourRate::UNIT.into());
        attributes.insert("last_energy_reading".to_owned(), self.consumption.0.into());
        attributes
    }
}

impl Snapshot {
    /// All the sensors of the device, reflecting this snapshot.
    pub fn sensors<'a>(&self, device: &'a Device) -> [Box<dyn Sensor + 'a>; 3] {
        [
            Box::new(CurrentPrice { device, price: self.price }),
            Box::new(MonthlyEnergy { device, consumption: self.consumption }),
            Box::new(MonthlyCost {
                device,
                cost: self.cost,
                price: self.price,
                consumption: self.consumption,
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> Device {
        Device::new("main", "sensor.octopus_daily_kwh")
    }

    #[test]
    fn test_ids() {
        let device = device();
        let sensor = MonthlyEnergy { device: &device, consumption: KilowattHours(1.0) };
        assert_eq!(sensor.unique_id(), "octopus_monthly_energy_main");
        assert_eq!(sensor.entity_id(), "sensor.octopus_monthly_energy_main");
    }

    #[test]
    fn test_monthly_energy_attributes() {
        let device = device();
        let attributes =
            MonthlyEnergy { device: &device, consumption: KilowattHours(1.0) }.attributes();
        assert_eq!(attributes["unit_of_measurement"], "kWh");
        assert_eq!(attributes["device_class"], "energy");
        assert_eq!(attributes["state_class"], "total");
        assert_eq!(attributes["device"]["identifier"], "device_sensor.octopus_daily_kwh");
        assert_eq!(attributes["device"]["entry_type"], "service");
    }

    #[test]
    fn test_current_price_has_no_device_class() {
        let device = device();
        let attributes = CurrentPrice { device: &device, price: KilowattHourRate(0.25) }.attributes();
        assert!(!attributes.contains_key("device_class"));
        assert_eq!(attributes["state_class"], "measurement");
        assert_eq!(attributes["unit_of_measurement"], "EUR/kWh");
    }

    #[test]
    fn test_monthly_cost_extra_attributes() {
        let device = device();
        let sensor = MonthlyCost {
            device: &device,
            cost: Cost(7.5),
            price: KilowattHourRate(0.25),
            consumption: KilowattHours(30.0),
        };
        assert_eq!(sensor.native_value(), 7.5);
        let attributes = sensor.attributes();
        assert_eq!(attributes["device_class"], "monetary");
        assert_eq!(attributes["current_price"], 0.25);
        assert_eq!(attributes["price_unit"], "EUR/kWh");
        assert_eq!(attributes["last_energy_reading"], 30.0);
    }

    #[test]
    fn test_snapshot_sensors() {
        let device = device();
        let snapshot = Snapshot {
            consumption: KilowattHours(30.0),
            price: KilowattHourRate(0.25),
            cost: Cost(7.5),
        };
        let values: Vec<_> = snapshot
            .sensors(&device)
            .iter()
            .map(|sensor| (sensor.kind(), sensor.native_value()))
            .collect();
        assert_eq!(
            values,
            [("current_price", 0.25), ("monthly_energy", 30.0), ("monthly_cost", 7.5)]
        );
    }
}
