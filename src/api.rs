pub mod exchange;
pub mod forecast;

use std::time::Duration;

use reqwest::Client;

use crate::prelude::*;

/// Default client for both endpoints.
pub(crate) fn try_new_client() -> Result<Client> {
    Ok(Client::builder()
        .user_agent(concat!("myna/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(10))
        .build()?)
}
