use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

pub const MILLIS_PER_HOUR: i64 = 3_600_000;

/// One discrete simulation time slot. Slots are one hour long and carry a
/// monotonically increasing serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timeslot {
    serial: u64,
    start: DateTime<Utc>,
}

impl Timeslot {
    pub fn new(serial: u64, start: DateTime<Utc>) -> Self {
        Self { serial, start }
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// The successor slot, one hour later.
    pub fn next(&self) -> Timeslot {
        Timeslot {
            serial: self.serial + 1,
            start: self.start + Duration::hours(1),
        }
    }

    /// Compact date key used in web queries: `YYYYMMDDHH`.
    pub fn date_key(&self) -> String {
        self.start.format("%Y%m%d%H").to_string()
    }

    /// Long date string used by archive `date`/`origin` attributes:
    /// `YYYY-MM-DD HH:00`.
    pub fn origin_key(&self) -> String {
        self.start.format("%Y-%m-%d %H:00").to_string()
    }
}

/// Host clock capability. The polling loop (simulated or real) implements
/// this; the acquisition pipeline never reads a clock directly.
pub trait TimeSource {
    fn current_timeslot(&self) -> Timeslot;
    fn now_millis(&self) -> i64;
}

/// Stateful cursor assigning absolute slot identity to records that carry
/// none on the wire.
///
/// Seeded from the host clock at the start of each fetch cycle and advanced
/// exactly once per consumed report. Forecast predictions never move it.
#[derive(Debug, Clone)]
pub struct TimeslotSequencer {
    current: Timeslot,
}

impl TimeslotSequencer {
    pub fn seeded(start: Timeslot) -> Self {
        Self { current: start }
    }

    /// The slot the next consumed report will be stamped with.
    pub fn snapshot(&self) -> Timeslot {
        self.current
    }

    /// Step to the next slot, returning the new cursor position.
    pub fn advance(&mut self) -> Timeslot {
        self.current = self.current.next();
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn slot(serial: u64, y: i32, mo: u32, d: u32, h: u32) -> Timeslot {
        Timeslot::new(serial, Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap())
    }

    #[test]
    fn test_date_keys() {
        let ts = slot(0, 2009, 7, 1, 5);
        assert_eq!(ts.date_key(), "2009070105");
        assert_eq!(ts.origin_key(), "2009-07-01 05:00");
    }

    #[test]
    fn test_next_steps_one_hour() {
        let ts = slot(3, 2009, 7, 1, 23);
        let next = ts.next();
        assert_eq!(next.serial(), 4);
        assert_eq!(next.origin_key(), "2009-07-02 00:00");
    }

    #[test]
    fn test_sequencer_advances_once_per_call() {
        let mut seq = TimeslotSequencer::seeded(slot(10, 2009, 7, 1, 0));
        assert_eq!(seq.snapshot().serial(), 10);
        seq.advance();
        seq.advance();
        assert_eq!(seq.snapshot().serial(), 12);
    }
}
