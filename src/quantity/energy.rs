use std::ops::Mul;

use crate::quantity::{cost::Cost, rate::KilowattHourRate, round_to};

quantity!(KilowattHours, "kWh");

impl KilowattHours {
    /// Round to watt-hours, which is the ledger precision.
    #[must_use]
    pub fn round_to_watt_hours(self) -> Self {
        Self(round_to(self.0, 3))
    }
}

impl Mul<KilowattHourRate> for KilowattHours {
    type Output = Cost;

    fn mul(self, rhs: KilowattHourRate) -> Self::Output {
        Cost(self.0 * rhs.0)
    }
}
