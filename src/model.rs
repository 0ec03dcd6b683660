use crate::timeslot::Timeslot;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("expected {expected} reports, got {actual}")]
    ReportCount { expected: usize, actual: usize },

    #[error("expected {expected} forecast predictions, got {actual}")]
    PredictionCount { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("{count} predictions cannot be split into groups of {horizon}")]
    NotAMultiple { count: usize, horizon: u32 },

    #[error("expected {expected} origin slots, got {actual}")]
    OriginCount { expected: usize, actual: usize },

    #[error("group {group} offsets are not exactly 1..={horizon}")]
    BadOffsets { group: usize, horizon: u32 },
}

/// A single weather observation, stamped with the slot it describes.
/// Immutable once decoded; superseded wholesale by the next cycle's batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherReport {
    pub timeslot: Timeslot,
    pub temperature: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub cloud_cover: f64,
}

impl WeatherReport {
    /// Deterministic placeholder emitted before anything has been acquired.
    pub fn zero(timeslot: Timeslot) -> Self {
        Self {
            timeslot,
            temperature: 0.0,
            wind_speed: 0.0,
            wind_direction: 0.0,
            cloud_cover: 0.0,
        }
    }
}

/// One forward-looking prediction within a forecast bundle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherForecastPrediction {
    /// Hours ahead of the bundle origin, 1..=H. Always taken from the wire
    /// record, never derived from position.
    pub offset: u32,
    pub temperature: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub cloud_cover: f64,
}

impl WeatherForecastPrediction {
    pub fn zero(offset: u32) -> Self {
        Self {
            offset,
            temperature: 0.0,
            wind_speed: 0.0,
            wind_direction: 0.0,
            cloud_cover: 0.0,
        }
    }
}

/// The forecast predictions associated with one report's origin slot,
/// ordered by offset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherForecastBundle {
    pub origin: Timeslot,
    pub predictions: Vec<WeatherForecastPrediction>,
}

impl WeatherForecastBundle {
    /// Placeholder bundle with `horizon` zero-valued predictions, offsets
    /// 1..=horizon.
    pub fn placeholder(origin: Timeslot, horizon: u32) -> Self {
        Self {
            origin,
            predictions: (1..=horizon).map(WeatherForecastPrediction::zero).collect(),
        }
    }
}

/// One fetch cycle's raw yield before bundling. Either both counts match the
/// configured interval and horizon or the whole batch is discarded; partial
/// application is never permitted.
#[derive(Debug, Clone, Default)]
pub struct AcquisitionBatch {
    pub reports: Vec<WeatherReport>,
    pub predictions: Vec<WeatherForecastPrediction>,
}

impl AcquisitionBatch {
    pub fn validate(&self, interval: u32, horizon: u32) -> Result<(), BatchError> {
        let want_reports = interval as usize;
        if self.reports.len() != want_reports {
            return Err(BatchError::ReportCount {
                expected: want_reports,
                actual: self.reports.len(),
            });
        }
        let want_predictions = (interval * horizon) as usize;
        if self.predictions.len() != want_predictions {
            return Err(BatchError::PredictionCount {
                expected: want_predictions,
                actual: self.predictions.len(),
            });
        }
        Ok(())
    }
}

/// Normalized output of a successful acquisition cycle.
#[derive(Debug, Clone)]
pub struct AcquisitionResult {
    pub reports: Vec<WeatherReport>,
    pub bundles: Vec<WeatherForecastBundle>,
}

/// Partition a flat prediction sequence into per-origin bundles of exactly
/// `horizon`, preserving arrival order across groups. Within a group the
/// predictions are sorted by offset, and the offsets must be exactly
/// 1..=horizon.
pub fn bundle_forecasts(
    predictions: Vec<WeatherForecastPrediction>,
    origins: &[Timeslot],
    horizon: u32,
) -> Result<Vec<WeatherForecastBundle>, BundleError> {
    let h = horizon as usize;
    if h == 0 || predictions.len() % h != 0 {
        return Err(BundleError::NotAMultiple {
            count: predictions.len(),
            horizon,
        });
    }
    let groups = predictions.len() / h;
    if groups != origins.len() {
        return Err(BundleError::OriginCount {
            expected: groups,
            actual: origins.len(),
        });
    }

    let mut bundles = Vec::with_capacity(groups);
    for (k, (chunk, origin)) in predictions.chunks_exact(h).zip(origins).enumerate() {
        let mut group = chunk.to_vec();
        group.sort_by_key(|p| p.offset);
        let well_formed = group.iter().enumerate().all(|(i, p)| p.offset == i as u32 + 1);
        if !well_formed {
            return Err(BundleError::BadOffsets { group: k, horizon });
        }
        bundles.push(WeatherForecastBundle {
            origin: *origin,
            predictions: group,
        });
    }
    Ok(bundles)
}
