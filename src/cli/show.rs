use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::{
    cli::ledger::LedgerArgs,
    price::monthly_cost,
    prelude::*,
    quantity::rate::KilowattHourRate,
    tables::build_ledger_table,
};

#[derive(Parser)]
pub struct ShowArgs {
    /// Price to evaluate the costs at.
    #[clap(long = "fixed-price", env = "FIXED_PRICE", default_value = "0")]
    price: KilowattHourRate,

    /// Evaluate the monthly figures as of this date (`YYYY-MM-DD`), today by default.
    #[clap(long)]
    as_of: Option<NaiveDate>,

    #[clap(flatten)]
    ledger: LedgerArgs,
}

impl ShowArgs {
    pub fn run(self) -> Result {
        let ledger = self.ledger.file().load();
        println!("{}", build_ledger_table(&ledger, self.price));

        let as_of = self.as_of.unwrap_or_else(|| Local::now().date_naive());
        let consumption = ledger.monthly_consumption(as_of);
        info!(
            %as_of,
            n_entries = ledger.len(),
            last_total = ?ledger.last_total(),
            %consumption,
            cost = %monthly_cost(consumption, self.price),
            "month to date",
        );
        Ok(())
    }
}
