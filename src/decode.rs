use crate::model::{AcquisitionBatch, BatchError, WeatherForecastPrediction, WeatherReport};
use crate::timeslot::{Timeslot, TimeslotSequencer};
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attr(#[from] AttrError),

    #[error("missing attribute '{attr}' on <{element}>")]
    MissingAttr {
        element: &'static str,
        attr: &'static str,
    },

    #[error("invalid value '{value}' for attribute '{attr}' on <{element}>")]
    InvalidValue {
        element: &'static str,
        attr: &'static str,
        value: String,
    },

    #[error("incomplete batch: {0}")]
    Batch(#[from] BatchError),
}

/// Decode a `<data>` document of attribute-bearing `weatherReport` and
/// `weatherForecast` elements into a validated batch.
///
/// Reports are stamped from the sequencer in document order, advancing it
/// once per report. Forecast offsets come verbatim from the wire `id`
/// attribute. Any count mismatch rejects the batch as a whole.
pub fn decode(
    xml: &str,
    sequencer: &mut TimeslotSequencer,
    interval: u32,
    horizon: u32,
) -> Result<AcquisitionBatch, DecodeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut batch = AcquisitionBatch::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"weatherReport" => {
                    let attrs = attr_map(&e)?;
                    let report = report_from_attrs(&attrs, sequencer.snapshot())?;
                    sequencer.advance();
                    batch.reports.push(report);
                }
                b"weatherForecast" => {
                    let attrs = attr_map(&e)?;
                    batch.predictions.push(prediction_from_attrs(&attrs)?);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    batch.validate(interval, horizon)?;
    Ok(batch)
}

fn attr_map(e: &BytesStart) -> Result<HashMap<String, String>, DecodeError> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(quick_xml::Error::from)?
            .to_string();
        map.insert(key, value);
    }
    Ok(map)
}

fn report_from_attrs(
    attrs: &HashMap<String, String>,
    timeslot: Timeslot,
) -> Result<WeatherReport, DecodeError> {
    const ELEMENT: &str = "weatherReport";
    Ok(WeatherReport {
        timeslot,
        temperature: f64_attr(attrs, ELEMENT, "temp")?,
        wind_speed: f64_attr(attrs, ELEMENT, "windspeed")?,
        wind_direction: f64_attr(attrs, ELEMENT, "winddir")?,
        cloud_cover: f64_attr(attrs, ELEMENT, "cloudcover")?,
    })
}

fn prediction_from_attrs(
    attrs: &HashMap<String, String>,
) -> Result<WeatherForecastPrediction, DecodeError> {
    const ELEMENT: &str = "weatherForecast";
    Ok(WeatherForecastPrediction {
        offset: u32_attr(attrs, ELEMENT, "id")?,
        temperature: f64_attr(attrs, ELEMENT, "temp")?,
        wind_speed: f64_attr(attrs, ELEMENT, "windspeed")?,
        wind_direction: f64_attr(attrs, ELEMENT, "winddir")?,
        cloud_cover: f64_attr(attrs, ELEMENT, "cloudcover")?,
    })
}

fn f64_attr(
    attrs: &HashMap<String, String>,
    element: &'static str,
    attr: &'static str,
) -> Result<f64, DecodeError> {
    let raw = attrs
        .get(attr)
        .ok_or(DecodeError::MissingAttr { element, attr })?;
    raw.parse().map_err(|_| DecodeError::InvalidValue {
        element,
        attr,
        value: raw.clone(),
    })
}

fn u32_attr(
    attrs: &HashMap<String, String>,
    element: &'static str,
    attr: &'static str,
) -> Result<u32, DecodeError> {
    let raw = attrs
        .get(attr)
        .ok_or(DecodeError::MissingAttr { element, attr })?;
    raw.parse().map_err(|_| DecodeError::InvalidValue {
        element,
        attr,
        value: raw.clone(),
    })
}
