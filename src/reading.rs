use chrono::NaiveDate;

use crate::{prelude::*, quantity::energy::KilowattHours};

/// Date format of the upstream reading date sensor.
pub const SOURCE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Placeholder states the host reports when an entity has no value.
const UNAVAILABLE_STATES: [&str; 2] = ["unknown", "unavailable"];

/// One day's meter reading, consumed once by the ledger.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DailyReading {
    pub date: NaiveDate,
    pub value: KilowattHours,
}

impl DailyReading {
    /// Combine the raw states of the date and value entities.
    ///
    /// Returns [`None`] if either state is missing, unavailable, or malformed.
    pub fn from_states(date_state: Option<&str>, value_state: Option<&str>) -> Option<Self> {
        let date = parse_date(available(date_state)?)?;
        let value = parse_number(available(value_state)?)?;
        Some(Self { date, value: KilowattHours(value) })
    }
}

/// Filter out the placeholder states.
#[must_use]
pub fn available(state: Option<&str>) -> Option<&str> {
    state.map(str::trim).filter(|state| !UNAVAILABLE_STATES.contains(state))
}

#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), SOURCE_DATE_FORMAT)
        .inspect_err(|error| warn!(text, "skipping a malformed reading date: {error}"))
        .ok()
}

/// Parse a finite decimal number.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        Ok(value) => {
            warn!(value, "skipping a non-finite reading");
            None
        }
        Err(error) => {
            warn!(text, "skipping a non-numeric reading: {error}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_states_ok() {
        let reading = DailyReading::from_states(Some("15/05/2024"), Some("12.345")).unwrap();
        assert_eq!(reading.date, NaiveDate::from_ymd_opt(2024, 5, 15).unwrap());
        assert_eq!(reading.value, KilowattHours(12.345));
    }

    #[test]
    fn test_from_states_unpadded_date() {
        let reading = DailyReading::from_states(Some("1/5/2024"), Some("1")).unwrap();
        assert_eq!(reading.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn test_from_states_missing() {
        assert_eq!(DailyReading::from_states(None, Some("1.0")), None);
        assert_eq!(DailyReading::from_states(Some("01/05/2024"), None), None);
    }

    #[test]
    fn test_from_states_unavailable() {
        assert_eq!(DailyReading::from_states(Some("unknown"), Some("1.0")), None);
        assert_eq!(DailyReading::from_states(Some("01/05/2024"), Some("unavailable")), None);
    }

    #[test]
    fn test_from_states_malformed() {
        assert_eq!(DailyReading::from_states(Some("2024-05-01"), Some("1.0")), None);
        assert_eq!(DailyReading::from_states(Some("31/02/2024"), Some("1.0")), None);
        assert_eq!(DailyReading::from_states(Some("01/05/2024"), Some("1,5")), None);
        assert_eq!(DailyReading::from_states(Some("01/05/2024"), Some("NaN")), None);
    }

    #[test]
    fn test_negative_value_passes_through() {
        let reading = DailyReading::from_states(Some("01/05/2024"), Some("-5")).unwrap();
        assert_eq!(reading.value, KilowattHours(-5.0));
    }
}
