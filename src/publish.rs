use crate::model::{AcquisitionResult, WeatherForecastBundle, WeatherReport};
use crate::timeslot::Timeslot;
use tracing::warn;

/// Outbound message boundary. Implementations deliver exactly one report and
/// one forecast bundle per tick; delivery is fire-and-forget.
pub trait Sink {
    fn publish_report(&mut self, report: &WeatherReport);
    fn publish_forecast(&mut self, bundle: &WeatherForecastBundle);
}

/// Holds the most recently acquired values and emits exactly one report and
/// one forecast message per tick. Until the first successful acquisition the
/// emitted values are zero-valued placeholders at the current slot, so
/// downstream consumers always see a well-formed message.
pub struct Publisher<S: Sink> {
    sink: S,
    horizon: u32,
    latest_report: Option<WeatherReport>,
    latest_bundle: Option<WeatherForecastBundle>,
}

impl<S: Sink> Publisher<S> {
    pub fn new(sink: S, horizon: u32) -> Self {
        Self {
            sink,
            horizon,
            latest_report: None,
            latest_bundle: None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Record a successful acquisition. The batch's last report and bundle
    /// become the published values until the next batch arrives.
    pub fn store(&mut self, result: &AcquisitionResult) {
        if let Some(report) = result.reports.last() {
            self.latest_report = Some(*report);
        }
        if let Some(bundle) = result.bundles.last() {
            self.latest_bundle = Some(bundle.clone());
        }
    }

    pub fn publish_report(&mut self, current: Timeslot) {
        match &self.latest_report {
            Some(report) => self.sink.publish_report(report),
            None => {
                warn!("no weather report stored yet, publishing default");
                self.sink.publish_report(&WeatherReport::zero(current));
            }
        }
    }

    pub fn publish_forecast(&mut self, current: Timeslot) {
        match &self.latest_bundle {
            Some(bundle) => self.sink.publish_forecast(bundle),
            None => {
                warn!("no weather forecast stored yet, publishing default");
                self.sink
                    .publish_forecast(&WeatherForecastBundle::placeholder(current, self.horizon));
            }
        }
    }
}
