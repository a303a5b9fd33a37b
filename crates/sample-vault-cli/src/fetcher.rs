use sample_vault_core::session::{FetchError, Fetcher};
use std::time::Duration;
use tracing::info;

/// Downloads `open --url` targets, optionally through a Tor SOCKS proxy.
pub struct HttpFetcher {
    tor_proxy: String,
}

impl HttpFetcher {
    pub fn new(tor_proxy: impl Into<String>) -> Self {
        Self {
            tor_proxy: tor_proxy.into(),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, use_tor: bool) -> Result<Vec<u8>, FetchError> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("sample-vault/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30));
        if use_tor {
            builder = builder.proxy(reqwest::Proxy::all(&self.tor_proxy)?);
        }
        let client = builder.build()?;

        info!("Downloading {}{}", url, if use_tor { " via Tor" } else { "" });
        let response = client.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}
