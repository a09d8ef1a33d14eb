quantity!(
    /// Euro per kilowatt-hour.
    KilowattHourRate,
    "EUR/kWh"
);
