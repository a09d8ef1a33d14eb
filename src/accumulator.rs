use bon::Builder;
use chrono::NaiveDate;
use tokio::task::spawn_blocking;

use crate::{
    host::StateSource,
    ledger::{Ingestion, Ledger, file::LedgerFile},
    prelude::*,
    price::{PriceSource, monthly_cost},
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
    reading::DailyReading,
};

/// Instance-scoped ledger context.
///
/// Every operation re-reads the ledger file, so the file stays the only source of truth.
/// Calls are not expected to run concurrently for the same ledger.
#[must_use]
#[derive(Clone, Debug, Builder)]
pub struct Accumulator {
    ledger_file: LedgerFile,
    price_source: PriceSource,
}

impl Accumulator {
    pub const fn ledger_file(&self) -> &LedgerFile {
        &self.ledger_file
    }

    pub const fn price_source(&self) -> &PriceSource {
        &self.price_source
    }

    pub fn load(&self) -> Ledger {
        self.ledger_file.load()
    }

    /// Fold the reading into the ledger and persist the ledger if it changed.
    pub fn ingest(&self, reading: DailyReading) -> Ingestion {
        self.ledger_file.ingest(reading)
    }

    pub fn monthly_consumption(&self, as_of: NaiveDate) -> KilowattHours {
        self.ledger_file.load().monthly_consumption(as_of)
    }

    pub async fn current_price(&self, states: &impl StateSource) -> KilowattHourRate {
        self.price_source.current_price(states).await
    }

    /// Derived figures as of the given date, with the price read afresh.
    ///
    /// The ledger is read on the blocking pool.
    pub async fn snapshot(&self, states: &impl StateSource, as_of: NaiveDate) -> Result<Snapshot> {
        let this = self.clone();
        let consumption = spawn_blocking(move || this.monthly_consumption(as_of)).await?;
        Ok(Snapshot::new(consumption, self.current_price(states).await))
    }
}

/// Monthly figures published to the host.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub consumption: KilowattHours,
    pub price: KilowattHourRate,
    pub cost: Cost,
}

impl Snapshot {
    pub fn new(consumption: KilowattHours, price: KilowattHourRate) -> Self {
        Self { consumption, price, cost: monthly_cost(consumption, price) }
    }
}
