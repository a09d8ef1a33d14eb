use clap::Parser;
use reqwest::Url;

use crate::{api::heartbeat, prelude::*};

#[derive(Parser)]
pub struct HeartbeatArgs {
    /// URL to ping after every successful polling cycle.
    #[clap(long = "heartbeat-url", env = "HEARTBEAT_URL")]
    url: Option<Url>,
}

impl HeartbeatArgs {
    pub fn client(self) -> Result<heartbeat::Client> {
        heartbeat::Client::new(self.url)
    }
}
