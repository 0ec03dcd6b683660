use crate::acquire::AcquisitionService;
use crate::config::{load_config, Config};
use crate::model::{WeatherForecastBundle, WeatherReport};
use crate::publish::{Publisher, Sink};
use crate::timeslot::{TimeSource, Timeslot};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info};

/// Simulated clock driving the polling loop: slot zero starts at the
/// configured instant and each tick advances one hour of simulated time.
struct SimClock {
    current: Timeslot,
}

impl SimClock {
    fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Timeslot::new(0, start),
        }
    }

    fn advance(&mut self) {
        self.current = self.current.next();
    }
}

impl TimeSource for SimClock {
    fn current_timeslot(&self) -> Timeslot {
        self.current
    }

    fn now_millis(&self) -> i64 {
        self.current.start().timestamp_millis()
    }
}

/// Writes each outbound message as one JSON line on stdout.
struct JsonLineSink;

impl Sink for JsonLineSink {
    fn publish_report(&mut self, report: &WeatherReport) {
        match serde_json::to_string(report) {
            Ok(line) => println!("{line}"),
            Err(e) => error!(error = %e, "failed to serialize weather report"),
        }
    }

    fn publish_forecast(&mut self, bundle: &WeatherForecastBundle) {
        match serde_json::to_string(bundle) {
            Ok(line) => println!("{line}"),
            Err(e) => error!(error = %e, "failed to serialize weather forecast"),
        }
    }
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => load_config(&path)?,
        None => {
            info!("no config file found, using defaults");
            Config::default()
        }
    };

    let mut clock = SimClock::new(config.sim.start);
    let mut service = AcquisitionService::new(&config)?;
    let mut publisher = Publisher::new(JsonLineSink, config.forecast_horizon);

    let source = if config.weather_data.is_empty() {
        "web"
    } else {
        config.weather_data.as_str()
    };
    info!(
        location = %config.location,
        interval = config.request_interval_hours.min(24),
        horizon = config.forecast_horizon,
        source = %source,
        "weather service started"
    );

    let mut ticker = tokio::time::interval(Duration::from_millis(config.sim.tick_millis));
    loop {
        ticker.tick().await;

        if let Some(result) = service.poll(&clock).await {
            debug!(
                reports = result.reports.len(),
                bundles = result.bundles.len(),
                "storing acquisition result"
            );
            publisher.store(&result);
        }

        let current = clock.current_timeslot();
        publisher.publish_report(current);
        publisher.publish_forecast(current);

        clock.advance();
    }
}
