use chrono::Local;
use clap::Parser;

use crate::{
    cli::ledger::LedgerArgs,
    ledger::Ingestion,
    prelude::*,
    reading::DailyReading,
};

#[derive(Parser)]
pub struct IngestArgs {
    /// Reading date in the `DD/MM/YYYY` format.
    #[clap(long)]
    date: String,

    /// Daily consumption in kilowatt-hours.
    #[clap(long)]
    value: String,

    #[clap(flatten)]
    ledger: LedgerArgs,
}

impl IngestArgs {
    pub fn run(self) -> Result {
        let reading = DailyReading::from_states(Some(&self.date), Some(&self.value))
            .with_context(|| format!("malformed reading: `{}` `{}`", self.date, self.value))?;
        let ledger_file = self.ledger.file();
        match ledger_file.ingest(reading) {
            Ingestion::Appended(total) => info!(%total, "recorded"),
            Ingestion::AlreadyRecorded => warn!(date = %reading.date, "already recorded"),
            Ingestion::Rejected(rejection) => bail!("the reading is rejected: {rejection}"),
        }
        let consumption = ledger_file.load().monthly_consumption(Local::now().date_naive());
        info!(%consumption, "month to date");
        Ok(())
    }
}
