use crate::config::Config;
use crate::decode::{self, DecodeError};
use crate::model::{bundle_forecasts, AcquisitionBatch, AcquisitionResult, BatchError, BundleError};
use crate::source::archive::{self, ExtractError};
use crate::source::state_log::{StateLogError, StateLogExtractor};
use crate::source::web::{FetchError, WebFetcher};
use crate::timeslot::{TimeSource, TimeslotSequencer, MILLIS_PER_HOUR};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("web fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("archive extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("state log extraction failed: {0}")]
    StateLog(#[from] StateLogError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("malformed batch: {0}")]
    Batch(#[from] BatchError),

    #[error("bundling failed: {0}")]
    Bundle(#[from] BundleError),
}

/// Per-tick acquisition driver.
///
/// Owns the mutable session state: the replay cursor for state-log sources
/// and the shared HTTP client. On each fetch tick it tries sources in fixed
/// priority (archive window, state log, live web) and returns the first
/// complete, validated batch as a normalized result. Every failure is
/// recovered locally; a tick where all sources fail simply yields nothing.
pub struct AcquisitionService {
    weather_data: String,
    interval: u32,
    horizon: u32,
    fetcher: WebFetcher,
    client: reqwest::Client,
    replay_cursor: u64,
}

impl AcquisitionService {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let fetcher = WebFetcher::new(client.clone(), &config.server_url, &config.location);
        Ok(Self {
            weather_data: config.weather_data.clone(),
            interval: config.request_interval_hours.min(24),
            horizon: config.forecast_horizon,
            fetcher,
            client,
            replay_cursor: 0,
        })
    }

    /// Evaluate one tick. Returns a normalized result only on a fetch tick
    /// where some source produced a complete batch; all other ticks are
    /// acquisition no-ops.
    pub async fn poll<T: TimeSource>(&mut self, time: &T) -> Option<AcquisitionResult> {
        let now = time.now_millis();
        if now % (self.interval as i64 * MILLIS_PER_HOUR) != 0 {
            debug!("not a fetch tick");
            return None;
        }
        info!(
            slot = time.current_timeslot().serial(),
            "fetch tick, requesting weather data"
        );

        if self.weather_data.ends_with(".xml") {
            match self.try_archive(time) {
                Ok(result) => {
                    debug!("acquired weather data from archive");
                    return Some(result);
                }
                Err(e) => warn!(error = %e, "archive source failed, falling back"),
            }
        }
        if self.weather_data.ends_with(".state") {
            match self.try_state_log(time).await {
                Ok(result) => {
                    debug!("acquired weather data from state log");
                    return Some(result);
                }
                Err(e) => warn!(error = %e, "state log source failed, falling back"),
            }
        }
        match self.try_web(time).await {
            Ok(result) => {
                debug!("acquired weather data from web");
                Some(result)
            }
            Err(e) => {
                warn!(error = %e, "web fetch failed, no weather data this tick");
                None
            }
        }
    }

    fn try_archive<T: TimeSource>(&mut self, time: &T) -> Result<AcquisitionResult, AcquireError> {
        let anchor = time.current_timeslot();
        let window = archive::extract_window(
            Path::new(&self.weather_data),
            anchor,
            self.interval,
            self.horizon,
        )?;
        self.decode_xml(&window, time)
    }

    async fn try_state_log<T: TimeSource>(
        &mut self,
        time: &T,
    ) -> Result<AcquisitionResult, AcquireError> {
        let mut sequencer = TimeslotSequencer::seeded(time.current_timeslot());
        let batch = {
            let mut extractor =
                StateLogExtractor::new(self.interval, self.horizon, &mut self.replay_cursor);
            extractor
                .extract(&self.weather_data, &self.client, &mut sequencer)
                .await?
        };
        self.normalize(batch)
    }

    async fn try_web<T: TimeSource>(&mut self, time: &T) -> Result<AcquisitionResult, AcquireError> {
        let xml = self.fetcher.fetch(time.current_timeslot()).await?;
        self.decode_xml(&xml, time)
    }

    fn decode_xml<T: TimeSource>(
        &self,
        xml: &str,
        time: &T,
    ) -> Result<AcquisitionResult, AcquireError> {
        let mut sequencer = TimeslotSequencer::seeded(time.current_timeslot());
        let batch = decode::decode(xml, &mut sequencer, self.interval, self.horizon)?;
        self.normalize(batch)
    }

    /// Validate counts and regroup the flat predictions into per-origin
    /// bundles. Bundle k's origin is report k's slot.
    fn normalize(&self, batch: AcquisitionBatch) -> Result<AcquisitionResult, AcquireError> {
        batch.validate(self.interval, self.horizon)?;
        let origins: Vec<_> = batch.reports.iter().map(|r| r.timeslot).collect();
        let bundles = bundle_forecasts(batch.predictions, &origins, self.horizon)?;
        Ok(AcquisitionResult {
            reports: batch.reports,
            bundles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeslot::Timeslot;
    use chrono::{DateTime, TimeZone, Utc};

    struct FixedClock {
        current: Timeslot,
    }

    impl FixedClock {
        fn at_hour(serial: u64, hour: u32) -> Self {
            let start = Utc
                .with_ymd_and_hms(2009, 7, 1, hour, 0, 0)
                .unwrap();
            Self {
                current: Timeslot::new(serial, start),
            }
        }
    }

    impl TimeSource for FixedClock {
        fn current_timeslot(&self) -> Timeslot {
            self.current
        }

        fn now_millis(&self) -> i64 {
            self.current.start().timestamp_millis()
        }
    }

    fn config_with(weather_data: &str) -> Config {
        Config {
            weather_data: weather_data.to_string(),
            server_url: "http://127.0.0.1:1/weather".to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_poll_skips_off_interval_ticks() {
        let mut config = config_with("");
        config.request_interval_hours = 24;
        let mut service = AcquisitionService::new(&config).unwrap();

        // 01:00 UTC is not a multiple of the 24h fetch interval.
        let clock = FixedClock::at_hour(1, 1);
        assert!(service.poll(&clock).await.is_none());
    }

    #[tokio::test]
    async fn test_interval_clamped_to_24() {
        let mut config = config_with("");
        config.request_interval_hours = 48;
        let service = AcquisitionService::new(&config).unwrap();
        assert_eq!(service.interval, 24);
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_nothing() {
        // Nonexistent archive plus an unreachable server: the tick is due
        // but produces nothing.
        let mut config = config_with("/nonexistent/run.xml");
        config.request_interval_hours = 1;
        let mut service = AcquisitionService::new(&config).unwrap();

        let clock = FixedClock::at_hour(0, 0);
        assert!(service.poll(&clock).await.is_none());
    }

    #[test]
    fn test_normalize_pairs_bundle_origins_with_reports() {
        let config = config_with("");
        let service = AcquisitionService::new(&Config {
            request_interval_hours: 2,
            forecast_horizon: 3,
            ..config
        })
        .unwrap();

        let start: DateTime<Utc> = Utc.with_ymd_and_hms(2009, 7, 1, 0, 0, 0).unwrap();
        let slot0 = Timeslot::new(0, start);
        let slot1 = slot0.next();
        let batch = AcquisitionBatch {
            reports: vec![
                crate::model::WeatherReport::zero(slot0),
                crate::model::WeatherReport::zero(slot1),
            ],
            predictions: (0..6)
                .map(|i| crate::model::WeatherForecastPrediction::zero(i % 3 + 1))
                .collect(),
        };

        let result = service.normalize(batch).unwrap();
        assert_eq!(result.bundles.len(), 2);
        assert_eq!(result.bundles[0].origin, slot0);
        assert_eq!(result.bundles[1].origin, slot1);
    }

    #[test]
    fn test_normalize_rejects_partial_batch() {
        let service = AcquisitionService::new(&Config {
            request_interval_hours: 2,
            forecast_horizon: 3,
            ..config_with("")
        })
        .unwrap();

        let start = Utc.with_ymd_and_hms(2009, 7, 1, 0, 0, 0).unwrap();
        let batch = AcquisitionBatch {
            reports: vec![crate::model::WeatherReport::zero(Timeslot::new(0, start))],
            predictions: vec![],
        };
        assert!(matches!(
            service.normalize(batch),
            Err(AcquireError::Batch(_))
        ));
    }
}
