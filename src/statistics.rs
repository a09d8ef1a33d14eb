use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    prelude::*,
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
};

pub const ENERGY_STATISTIC_ID: &str = "sensor:octopus_energy_total";
pub const COST_STATISTIC_ID: &str = "sensor:octopus_energy_cost_total";

/// Ledger history prepared for the host's long-term statistics.
#[must_use]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct History(pub Vec<HistoryPoint>);

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HistoryPoint {
    /// Midnight UTC of the ledger date.
    pub start: DateTime<Utc>,

    pub energy: KilowattHours,

    pub cost: Cost,
}

impl History {
    /// Replay the ledger entries in ascending date order, pricing every cumulative total
    /// at the given price.
    ///
    /// Negative and non-finite totals are skipped.
    pub fn replay(
        entries: impl IntoIterator<Item = (NaiveDate, KilowattHours)>,
        price: KilowattHourRate,
    ) -> Self {
        let points = entries
            .into_iter()
            .sorted_by_key(|(date, _)| *date)
            .filter_map(|(date, total)| {
                let energy = total.round_to_watt_hours();
                if !energy.is_finite() || energy < KilowattHours::ZERO {
                    error!(%date, ?energy, "skipping an invalid statistic");
                    return None;
                }
                Some(HistoryPoint {
                    start: date.and_time(NaiveTime::MIN).and_utc(),
                    energy,
                    cost: (energy * price).round_to_cents(),
                })
            })
            .collect();
        Self(points)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn energy_statistics(&self) -> Statistics<KilowattHours> {
        Statistics {
            metadata: StatisticMetadata::sum(
                ENERGY_STATISTIC_ID,
                "Octopus Total Energy",
                KilowattHours::UNIT,
            ),
            stats: self.0.iter().map(|point| StatisticPoint::sum(point.start, point.energy)).collect(),
        }
    }

    pub fn cost_statistics(&self) -> Statistics<Cost> {
        Statistics {
            metadata: StatisticMetadata::sum(COST_STATISTIC_ID, "Octopus Total Cost", Cost::UNIT),
            stats: self.0.iter().map(|point| StatisticPoint::sum(point.start, point.cost)).collect(),
        }
    }
}

/// One statistic series in the host's import format.
#[must_use]
#[derive(Clone, Debug, Serialize)]
pub struct Statistics<V> {
    pub metadata: StatisticMetadata,
    pub stats: Vec<StatisticPoint<V>>,
}

#[must_use]
#[derive(Clone, Debug, Serialize)]
pub struct StatisticMetadata {
    pub has_mean: bool,
    pub has_sum: bool,
    pub name: &'static str,
    pub source: &'static str,
    pub statistic_id: &'static str,
    pub unit_of_measurement: &'static str,
}

impl StatisticMetadata {
    /// Metadata of a cumulative external statistic.
    const fn sum(
        statistic_id: &'static str,
        name: &'static str,
        unit_of_measurement: &'static str,
    ) -> Self {
        Self { has_mean: false, has_sum: true, name, source: "sensor", statistic_id, unit_of_measurement }
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct StatisticPoint<V> {
    pub start: DateTime<Utc>,
    pub last_reset: Option<DateTime<Utc>>,
    pub sum: V,
}

impl<V> StatisticPoint<V> {
    const fn sum(start: DateTime<Utc>, sum: V) -> Self {
        Self { start, last_reset: None, sum }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_replay_sorted_and_priced() {
        let history = History::replay(
            [
                (date(2024, 5, 2), KilowattHours(20.4567)),
                (date(2024, 5, 1), KilowattHours(10.0)),
            ],
            KilowattHourRate(0.1234),
        );
        assert_eq!(history.len(), 2);

        let first = history.0[0];
        assert_eq!(first.start, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert_abs_diff_eq!(first.energy.0, 10.0);
        assert_abs_diff_eq!(first.cost.0, 1.23);

        let second = history.0[1];
        assert_eq!(second.start, Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap());
        assert_abs_diff_eq!(second.energy.0, 20.457);
        assert_abs_diff_eq!(second.cost.0, 2.52);
    }

    #[test]
    fn test_replay_skips_negative() {
        let history = History::replay(
            [(date(2024, 5, 1), KilowattHours(-1.0)), (date(2024, 5, 2), KilowattHours(1.0))],
            KilowattHourRate(0.2),
        );
        assert_eq!(history.len(), 1);
        assert_eq!(history.0[0].energy, KilowattHours(1.0));
    }

    #[test]
    fn test_serialize_energy_statistics() -> Result {
        let history =
            History::replay([(date(2024, 5, 1), KilowattHours(12.5))], KilowattHourRate(0.2));
        let actual = serde_json::to_value(history.energy_statistics())?;
        let expected = serde_json::json!({
            "metadata": {
                "has_mean": false,
                "has_sum": true,
                "name": "Octopus Total Energy",
                "source": "sensor",
                "statistic_id": "sensor:octopus_energy_total",
                "unit_of_measurement": "kWh",
            },
            "stats": [
                {"start": "2024-05-01T00:00:00Z", "last_reset": null, "sum": 12.5},
            ],
        });
        assert_eq!(actual, expected);
        Ok(())
    }

    #[test]
    fn test_cost_statistics() {
        let history =
            History::replay([(date(2024, 5, 1), KilowattHours(12.5))], KilowattHourRate(0.2));
        let statistics = history.cost_statistics();
        assert_eq!(statistics.metadata.statistic_id, COST_STATISTIC_ID);
        assert_eq!(statistics.metadata.unit_of_measurement, "EUR");
        assert_abs_diff_eq!(statistics.stats[0].sum.0, 2.5);
    }
}
