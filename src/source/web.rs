use crate::timeslot::Timeslot;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Fetches one fetch cycle's worth of weather XML from the remote weather
/// server. One GET per attempt; transport failures are terminal and retry is
/// simply the next fetch tick.
pub struct WebFetcher {
    client: reqwest::Client,
    server_url: String,
    location: String,
}

impl WebFetcher {
    pub fn new(client: reqwest::Client, server_url: &str, location: &str) -> Self {
        Self {
            client,
            server_url: server_url.to_string(),
            location: location.to_string(),
        }
    }

    fn query_url(&self, slot: Timeslot) -> String {
        format!(
            "{}?weatherDate={}&weatherLocation={}",
            self.server_url,
            slot.date_key(),
            self.location
        )
    }

    /// Request the batch anchored at `slot` and return the raw XML body.
    pub async fn fetch(&self, slot: Timeslot) -> Result<String, FetchError> {
        let url = self.query_url(slot);
        debug!(url = %url, "requesting weather data");
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_query_url_uses_compact_date_key() {
        let fetcher = WebFetcher::new(
            reqwest::Client::new(),
            "http://example.com/weather",
            "rotterdam",
        );
        let slot = Timeslot::new(0, Utc.with_ymd_and_hms(2009, 7, 1, 9, 0, 0).unwrap());
        assert_eq!(
            fetcher.query_url(slot),
            "http://example.com/weather?weatherDate=2009070109&weatherLocation=rotterdam"
        );
    }
}
