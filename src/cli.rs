mod heartbeat;
mod home_assistant;
mod ingest;
mod ledger;
mod poll;
mod price;
mod replay;
mod show;

use clap::{Parser, Subcommand};

use crate::{
    cli::{ingest::IngestArgs, poll::PollArgs, replay::ReplayArgs, show::ShowArgs},
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: poll the meter sensors, keep the ledger, and publish the monthly figures.
    #[clap(name = "poll")]
    Poll(Box<PollArgs>),

    /// Record a single daily reading by hand.
    #[clap(name = "ingest")]
    Ingest(Box<IngestArgs>),

    /// Print the ledger along with the monthly figures.
    #[clap(name = "show")]
    Show(Box<ShowArgs>),

    /// Import the whole ledger into the long-term statistics.
    #[clap(name = "replay")]
    Replay(Box<ReplayArgs>),
}

impl Command {
    pub async fn run(self) -> Result {
        match self {
            Self::Poll(args) => args.run().await,
            Self::Ingest(args) => args.run(),
            Self::Show(args) => args.run(),
            Self::Replay(args) => args.run().await,
        }
    }
}
