use clap::Parser;
use reqwest::Url;

use crate::{
    api::home_assistant::{Api, websocket::StatisticsImporter},
    prelude::*,
};

#[derive(Parser)]
pub struct HomeAssistantArgs {
    /// Long-lived access token.
    #[clap(
        long = "home-assistant-access-token",
        env = "HOME_ASSISTANT_ACCESS_TOKEN",
        hide_env_values = true
    )]
    access_token: String,

    /// API root, for example: `http://localhost:8123/api`.
    #[clap(long = "home-assistant-api-base-url", env = "HOME_ASSISTANT_API_BASE_URL")]
    base_url: Url,
}

impl HomeAssistantArgs {
    pub fn api(&self) -> Result<Api> {
        Api::try_new(&self.access_token, self.base_url.clone())
    }

    pub fn statistics_importer(&self) -> Result<StatisticsImporter> {
        StatisticsImporter::try_new(&self.base_url, &self.access_token)
    }
}
