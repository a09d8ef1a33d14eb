use std::time::Duration;

use reqwest::ClientBuilder;

/// Default client builder, shared by the HTTP clients.
pub fn builder() -> ClientBuilder {
    reqwest::Client::builder().timeout(Duration::from_secs(10))
}
