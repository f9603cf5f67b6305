//! Hourly site weather.

use crate::error::{BosError, BosResult};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::io::Read;
use std::path::Path;
use tracing::debug;

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(h) = s.parse::<i64>() {
        return TimeDelta::try_hours(h).and_then(|d| epoch().checked_add_signed(d));
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// One row per hour: a timestamp and the wind speed (m/s).
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherProfile {
    times: Vec<NaiveDateTime>,
    windspeed: Vec<f64>,
}

impl WeatherProfile {
    pub fn new(times: Vec<NaiveDateTime>, windspeed: Vec<f64>) -> BosResult<Self> {
        if times.len() != windspeed.len() {
            return Err(BosError::WeatherData {
                what: format!("{} timestamps for {} wind speeds", times.len(), windspeed.len()),
            });
        }
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(BosError::WeatherData {
                what: "timestamps must be strictly increasing".into(),
            });
        }
        Ok(Self { times, windspeed })
    }

    /// Hourly profile starting at 2000-01-01 00:00.
    pub fn hourly(windspeed: Vec<f64>) -> Self {
        let t0 = epoch();
        let times = (0..windspeed.len())
            .map(|i| t0 + TimeDelta::hours(i as i64))
            .collect();
        Self { times, windspeed }
    }

    /// Read a CSV with a `windspeed` column and an optional `datetime`
    /// column. Integer datetimes are hour offsets from 2000-01-01; without
    /// the column rows are consecutive hours from that date.
    pub fn from_reader<R: Read>(reader: R) -> BosResult<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();
        let col = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let ws_col = col("windspeed").ok_or_else(|| BosError::WeatherData {
            what: "missing 'windspeed' column".into(),
        })?;
        let dt_col = col("datetime");

        let mut times = Vec::new();
        let mut windspeed = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let ws = record
                .get(ws_col)
                .and_then(|v| v.parse::<f64>().ok())
                .ok_or_else(|| BosError::WeatherData {
                    what: format!("row {row}: invalid wind speed"),
                })?;
            let time = match dt_col {
                Some(c) => record
                    .get(c)
                    .and_then(parse_datetime)
                    .ok_or_else(|| BosError::WeatherData {
                        what: format!("row {row}: unrecognized datetime"),
                    })?,
                None => epoch() + TimeDelta::hours(row as i64),
            };
            times.push(time);
            windspeed.push(ws);
        }
        debug!(rows = windspeed.len(), "read weather profile");
        Self::new(times, windspeed)
    }

    pub fn from_csv_path(path: &Path) -> BosResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.windspeed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windspeed.is_empty()
    }

    pub fn windspeed(&self) -> &[f64] {
        &self.windspeed
    }

    pub fn time(&self, index: usize) -> Option<NaiveDateTime> {
        self.times.get(index).copied()
    }

    /// Index of the row nearest `at`. Dates outside the covered range are an
    /// error.
    pub fn index_of(&self, at: NaiveDateTime) -> BosResult<usize> {
        let (Some(&first), Some(&last)) = (self.times.first(), self.times.last()) else {
            return Err(BosError::WeatherData {
                what: "weather profile is empty".into(),
            });
        };
        if at < first || at > last {
            return Err(BosError::WeatherProfile {
                date: at.to_string(),
                start: first.to_string(),
                end: last.to_string(),
            });
        }
        let k = self.times.partition_point(|&t| t < at);
        if k == 0 || self.times[k] == at {
            return Ok(k);
        }
        let before = at - self.times[k - 1];
        let after = self.times[k] - at;
        Ok(if after < before { k } else { k - 1 })
    }

    /// Rows from `ceil(start)` on.
    pub fn slice_from(&self, start: f64) -> WeatherProfile {
        let i = (start.max(0.0).ceil() as usize).min(self.len());
        WeatherProfile {
            times: self.times[i..].to_vec(),
            windspeed: self.windspeed[i..].to_vec(),
        }
    }
}
