use clap::Parser;

use crate::{
    cli::{home_assistant::HomeAssistantArgs, ledger::LedgerArgs, price::PriceArgs},
    host::StatisticsSink,
    prelude::*,
    statistics::History,
    tables::build_history_table,
};

#[derive(Parser)]
pub struct ReplayArgs {
    /// Only print the statistics without importing them.
    #[clap(long)]
    dry_run: bool,

    #[clap(flatten)]
    home_assistant: HomeAssistantArgs,

    #[clap(flatten)]
    price: PriceArgs,

    #[clap(flatten)]
    ledger: LedgerArgs,
}

impl ReplayArgs {
    pub async fn run(self) -> Result {
        let api = self.home_assistant.api()?;
        let price = self.price.source()?.current_price(&api).await;
        let ledger = self.ledger.file().load();
        let history = History::replay(ledger.iter(), price);
        println!("{}", build_history_table(&history));

        if self.dry_run {
            info!(n_points = history.len(), "dry run, not importing");
            return Ok(());
        }
        self.home_assistant.statistics_importer()?.import(&history).await
    }
}
