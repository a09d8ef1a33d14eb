use std::path::PathBuf;

use clap::Parser;

use crate::ledger::file::LedgerFile;

#[derive(Parser)]
pub struct LedgerArgs {
    /// JSON file with the cumulative daily totals.
    #[clap(
        long = "ledger-path",
        env = "LEDGER_PATH",
        default_value = "octopus_data/octopus_energy.json"
    )]
    path: PathBuf,
}

impl LedgerArgs {
    pub fn file(&self) -> LedgerFile {
        LedgerFile::new(&self.path)
    }
}
