pub mod file;

use std::collections::{BTreeMap, btree_map::Entry};

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{prelude::*, quantity::energy::KilowattHours};

/// Daily readings above this are treated as sensor glitches.
pub const MAX_DAILY_READING: KilowattHours = KilowattHours(150.0);

/// Append-only mapping from calendar date to the cumulative meter reading.
///
/// Serialized as a JSON object with `YYYY-MM-DD` keys. Entries with a malformed key or value
/// are dropped on deserialization instead of failing the whole ledger.
#[must_use]
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger(
    #[serde_as(deserialize_as = "serde_with::MapSkipError<_, _>")]
    BTreeMap<NaiveDate, KilowattHours>,
);

impl<const N: usize> From<[(NaiveDate, KilowattHours); N]> for Ledger {
    fn from(entries: [(NaiveDate, KilowattHours); N]) -> Self {
        Self(BTreeMap::from(entries))
    }
}

impl Ledger {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0.contains_key(&date)
    }

    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<KilowattHours> {
        self.0.get(&date).copied()
    }

    /// Entries in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, KilowattHours)> + '_ {
        self.0.iter().map(|(date, total)| (*date, *total))
    }

    /// Cumulative total at the latest recorded date.
    #[must_use]
    pub fn last_total(&self) -> Option<KilowattHours> {
        self.0.last_key_value().map(|(_, total)| *total)
    }

    /// Fold the daily reading into the ledger.
    ///
    /// At most one entry is ever recorded per date: a repeated date is a no-op, even when
    /// the value differs. The new total is built on top of the latest recorded total,
    /// regardless of whether `date` comes after it.
    #[instrument(skip_all, fields(date = %date, value = ?value))]
    pub fn ingest(&mut self, date: NaiveDate, value: KilowattHours) -> Ingestion {
        if let Err(rejection) = validate(value) {
            return Ingestion::Rejected(rejection);
        }
        let last_total = self.last_total().unwrap_or(KilowattHours::ZERO);
        match self.0.entry(date) {
            Entry::Occupied(_) => {
                debug!("the date is already recorded");
                Ingestion::AlreadyRecorded
            }
            Entry::Vacant(entry) => {
                let total = (last_total + value).round_to_watt_hours();
                entry.insert(total);
                info!(?total, "appended");
                Ingestion::Appended(total)
            }
        }
    }

    /// Consumption since the start of the `as_of` month.
    ///
    /// The base is the latest total recorded strictly before the first day of the month,
    /// or zero when there is none. A negative result is returned as is.
    pub fn monthly_consumption(&self, as_of: NaiveDate) -> KilowattHours {
        let Some(last_total) = self.last_total() else {
            return KilowattHours::ZERO;
        };
        let first_of_month = as_of - Days::new(u64::from(as_of.day0()));
        let base = self
            .0
            .range(..first_of_month)
            .next_back()
            .map_or(KilowattHours::ZERO, |(_, total)| *total);
        let consumption = (last_total - base).round_to_watt_hours();
        if consumption < KilowattHours::ZERO {
            warn!(?last_total, ?base, ?consumption, "the monthly consumption is negative");
        }
        consumption
    }
}

fn validate(value: KilowattHours) -> Result<(), Rejection> {
    if !value.is_finite() {
        error!(?value, "discarded a non-finite reading");
        Err(Rejection::NonFinite)
    } else if value < KilowattHours::ZERO {
        warn!(?value, "discarded an anomalous negative reading, check the source sensor");
        Err(Rejection::Negative)
    } else if value > MAX_DAILY_READING {
        error!(?value, max = ?MAX_DAILY_READING, "discarded a suspiciously high reading");
        Err(Rejection::Spike)
    } else {
        Ok(())
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ingestion {
    /// New entry with the new cumulative total.
    Appended(KilowattHours),

    AlreadyRecorded,

    Rejected(Rejection),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, derive_more::Display)]
pub enum Rejection {
    #[display("negative reading")]
    Negative,

    #[display("reading above the daily ceiling")]
    Spike,

    #[display("non-finite reading")]
    NonFinite,
}
