use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Weather station or city the server should report for.
    #[serde(default = "default_location")]
    pub location: String,

    /// REST endpoint queried when no file-based source is configured (and
    /// as the fallback when one fails).
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Path or URL of a file-based source. A ".xml" suffix selects archive
    /// window extraction, ".state" selects incremental log consumption;
    /// empty means fetch from the web server.
    #[serde(default)]
    pub weather_data: String,

    /// Reports requested per fetch cycle. Clamped to at most 24 at use.
    #[serde(default = "default_request_interval")]
    pub request_interval_hours: u32,

    /// Forward-looking predictions per report.
    #[serde(default = "default_forecast_horizon")]
    pub forecast_horizon: u32,

    /// Upper bound on any single network fetch.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    #[serde(default)]
    pub sim: SimConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Wall-clock start of the simulated run; slot zero begins here.
    #[serde(default = "default_sim_start")]
    pub start: DateTime<Utc>,

    /// Real milliseconds between simulated one-hour ticks.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: default_location(),
            server_url: default_server_url(),
            weather_data: String::new(),
            request_interval_hours: default_request_interval(),
            forecast_horizon: default_forecast_horizon(),
            fetch_timeout_secs: default_fetch_timeout(),
            sim: SimConfig::default(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start: default_sim_start(),
            tick_millis: default_tick_millis(),
        }
    }
}

fn default_location() -> String {
    "rotterdam".to_string()
}

fn default_server_url() -> String {
    "http://wolf-08.fbk.eur.nl:8080/WeatherServer/faces/index.xhtml".to_string()
}

fn default_request_interval() -> u32 {
    24
}

fn default_forecast_horizon() -> u32 {
    24
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_sim_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2009, 7, 1, 0, 0, 0).unwrap()
}

fn default_tick_millis() -> u64 {
    1000
}
