use crate::timeslot::Timeslot;
use quick_xml::escape::escape;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attr(#[from] AttrError),

    #[error("archive has {found} reports at or after {anchor}, need {need}")]
    ReportWindow {
        anchor: String,
        found: usize,
        need: usize,
    },

    #[error("archive has {found} forecasts for the window, need {need}")]
    ForecastWindow { found: usize, need: usize },
}

/// A report or forecast element kept verbatim as its attribute list, plus the
/// attribute the window scan keys on (`date` for reports, `origin` for
/// forecasts).
struct RawElement {
    key: String,
    attrs: Vec<(String, String)>,
}

/// Extract `interval` reports anchored at `anchor` plus their
/// `interval * horizon` forecasts from an archive spanning a whole run,
/// re-emitted as a standalone `<data>` document.
///
/// Reports are the first `interval` elements in document order whose `date`
/// is lexicographically at or after the anchor date string. Forecasts are
/// collected anchor-major: all forecasts whose `origin` equals the first
/// anchor slot, then the next slot, stepping one slot per group.
pub fn extract_window(
    path: &Path,
    anchor: Timeslot,
    interval: u32,
    horizon: u32,
) -> Result<String, ExtractError> {
    let xml = std::fs::read_to_string(path)?;
    let (reports, forecasts) = scan_archive(&xml)?;

    let anchor_key = anchor.origin_key();
    let window_reports: Vec<&RawElement> = reports
        .iter()
        .filter(|r| r.key.as_str() >= anchor_key.as_str())
        .take(interval as usize)
        .collect();
    if window_reports.len() != interval as usize {
        return Err(ExtractError::ReportWindow {
            anchor: anchor_key,
            found: window_reports.len(),
            need: interval as usize,
        });
    }

    let mut window_forecasts: Vec<&RawElement> = Vec::new();
    let mut cursor = anchor;
    for _ in 0..interval {
        let target = cursor.origin_key();
        window_forecasts.extend(forecasts.iter().filter(|f| f.key == target));
        cursor = cursor.next();
    }
    let need = (interval * horizon) as usize;
    if window_forecasts.len() != need {
        return Err(ExtractError::ForecastWindow {
            found: window_forecasts.len(),
            need,
        });
    }

    debug!(
        reports = window_reports.len(),
        forecasts = window_forecasts.len(),
        anchor = %anchor_key,
        "extracted archive window"
    );
    Ok(render_window(&window_reports, &window_forecasts))
}

fn scan_archive(xml: &str) -> Result<(Vec<RawElement>, Vec<RawElement>), ExtractError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut reports = Vec::new();
    let mut forecasts = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"weatherReport" => {
                    if let Some(el) = raw_element(&e, "date")? {
                        reports.push(el);
                    }
                }
                b"weatherForecast" => {
                    if let Some(el) = raw_element(&e, "origin")? {
                        forecasts.push(el);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((reports, forecasts))
}

/// Capture an element's attributes. Elements missing the key attribute can
/// never match a window anchor and are dropped here.
fn raw_element(e: &BytesStart, key_attr: &str) -> Result<Option<RawElement>, ExtractError> {
    let mut attrs = Vec::new();
    let mut key = None;
    for attr in e.attributes() {
        let attr = attr?;
        let name = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(quick_xml::Error::from)?
            .to_string();
        if name == key_attr {
            key = Some(value.clone());
        }
        attrs.push((name, value));
    }
    Ok(key.map(|key| RawElement { key, attrs }))
}

fn render_window(reports: &[&RawElement], forecasts: &[&RawElement]) -> String {
    let mut out = String::from("<data>\n  <weatherReports>\n");
    for report in reports {
        render_element(&mut out, "weatherReport", report);
    }
    out.push_str("  </weatherReports>\n  <weatherForecasts>\n");
    for forecast in forecasts {
        render_element(&mut out, "weatherForecast", forecast);
    }
    out.push_str("  </weatherForecasts>\n</data>\n");
    out
}

fn render_element(out: &mut String, name: &str, el: &RawElement) {
    out.push_str("    <");
    out.push_str(name);
    for (key, value) in &el.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    out.push_str("/>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;
    use crate::timeslot::TimeslotSequencer;
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn slot(serial: u64) -> Timeslot {
        let start = Utc.with_ymd_and_hms(2009, 7, 1, 0, 0, 0).unwrap()
            + chrono::Duration::hours(serial as i64);
        Timeslot::new(serial, start)
    }

    /// Builds an archive with `hours` consecutive reports starting at slot 0
    /// and `horizon` forecasts per report hour.
    fn build_archive(hours: u64, horizon: u32) -> String {
        let mut xml = String::from("<data>\n<weatherReports>\n");
        for h in 0..hours {
            let date = slot(h).origin_key();
            xml.push_str(&format!(
                "<weatherReport temp=\"{}\" windspeed=\"2.0\" winddir=\"90.0\" cloudcover=\"0.1\" location=\"rotterdam\" date=\"{}\"/>\n",
                10.0 + h as f64,
                date
            ));
        }
        xml.push_str("</weatherReports>\n<weatherForecasts>\n");
        for h in 0..hours {
            let origin = slot(h).origin_key();
            for id in 1..=horizon {
                let date = slot(h + id as u64).origin_key();
                xml.push_str(&format!(
                    "<weatherForecast id=\"{}\" temp=\"{}\" windspeed=\"2.0\" winddir=\"90.0\" cloudcover=\"0.1\" location=\"rotterdam\" origin=\"{}\" date=\"{}\"/>\n",
                    id,
                    20.0 + id as f64,
                    origin,
                    date
                ));
            }
        }
        xml.push_str("</weatherForecasts>\n</data>\n");
        xml
    }

    fn write_archive(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_window_anchored_mid_archive() {
        let file = write_archive(&build_archive(8, 2));
        let window = extract_window(file.path(), slot(3), 2, 2).unwrap();

        // The window re-decodes into a complete batch whose first report is
        // the one dated at the anchor.
        let mut seq = TimeslotSequencer::seeded(slot(3));
        let batch = decode::decode(&window, &mut seq, 2, 2).unwrap();
        assert_eq!(batch.reports.len(), 2);
        assert_eq!(batch.reports[0].temperature, 13.0);
        assert_eq!(batch.reports[1].temperature, 14.0);
        assert_eq!(batch.predictions.len(), 4);
    }

    #[test]
    fn test_window_skips_reports_before_anchor() {
        let file = write_archive(&build_archive(4, 1));
        let window = extract_window(file.path(), slot(2), 2, 1).unwrap();
        assert!(!window.contains("date=\"2009-07-01 01:00\""));
        assert!(window.contains("date=\"2009-07-01 02:00\""));
    }

    #[test]
    fn test_window_fails_with_too_few_reports() {
        let file = write_archive(&build_archive(3, 1));
        // Anchor at slot 2 leaves a single report in range but two are needed.
        let result = extract_window(file.path(), slot(2), 2, 1);
        assert!(matches!(
            result,
            Err(ExtractError::ReportWindow { found: 1, need: 2, .. })
        ));
    }

    #[test]
    fn test_window_fails_with_missing_forecasts() {
        // Reports cover 4 hours but forecasts only exist for the first 2.
        let mut xml = String::from("<data>\n<weatherReports>\n");
        for h in 0..4u64 {
            xml.push_str(&format!(
                "<weatherReport temp=\"1.0\" windspeed=\"1.0\" winddir=\"1.0\" cloudcover=\"0.0\" date=\"{}\"/>\n",
                slot(h).origin_key()
            ));
        }
        xml.push_str("</weatherReports>\n<weatherForecasts>\n");
        for h in 0..2u64 {
            xml.push_str(&format!(
                "<weatherForecast id=\"1\" temp=\"1.0\" windspeed=\"1.0\" winddir=\"1.0\" cloudcover=\"0.0\" origin=\"{}\"/>\n",
                slot(h).origin_key()
            ));
        }
        xml.push_str("</weatherForecasts>\n</data>\n");

        let file = write_archive(&xml);
        let result = extract_window(file.path(), slot(0), 4, 1);
        assert!(matches!(
            result,
            Err(ExtractError::ForecastWindow { found: 2, need: 4 })
        ));
    }

    #[test]
    fn test_missing_archive_is_io_error() {
        let result = extract_window(Path::new("/nonexistent/weather.xml"), slot(0), 1, 1);
        assert!(matches!(result, Err(ExtractError::Io(_))));
    }
}
