use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

const SAMPLE_CONFIG: &str = r#"# wxfeed configuration

# Weather station or city the server should report for.
location: rotterdam

# REST endpoint queried when no file-based source is configured (and as the
# fallback when one fails).
server_url: http://wolf-08.fbk.eur.nl:8080/WeatherServer/faces/index.xhtml

# Optional file-based source. A ".xml" suffix selects archive window
# extraction, ".state" selects incremental log consumption. Leave empty to
# fetch from the server above.
weather_data: ""

# Reports per fetch cycle (at most 24) and predictions per report.
request_interval_hours: 24
forecast_horizon: 24

# Upper bound on any single network fetch.
fetch_timeout_secs: 10

sim:
  # Slot zero begins here; each tick advances one hour of simulated time.
  start: 2009-07-01T00:00:00Z
  # Real milliseconds between ticks.
  tick_millis: 1000
"#;

/// Write a sample config to ./wxfeed.yml, or to stdout with `--stdout`.
pub fn init(stdout: bool) -> Result<(), std::io::Error> {
    if stdout {
        std::io::stdout().write_all(SAMPLE_CONFIG.as_bytes())?;
        return Ok(());
    }

    let path = Path::new("wxfeed.yml");
    if path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "wxfeed.yml already exists, not overwriting",
        ));
    }
    fs::write(path, SAMPLE_CONFIG)?;
    info!("wrote sample config to wxfeed.yml");
    Ok(())
}
