//! Device telemetry payloads and the parser that normalizes them.
//!
//! A transmission carries one `metadata` block plus any number of measurement
//! fields. Each measurement value is either a bare number (a one-shot tally)
//! or a series laid out as `[[start_offset, end_offset, sample_rate], v1, v2, ...]`.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Identity of a physical device pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    #[serde(rename = "cradleID")]
    pub cradle_id: i64,
    #[serde(rename = "mouthguardID")]
    pub mouthguard_id: i64,
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.cradle_id, self.mouthguard_id)
    }
}

/// Metadata block sent with every transmission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceMetadata {
    #[serde(flatten)]
    pub identity: DeviceIdentity,
    #[serde(rename = "batteryLevel")]
    pub battery_level: i32,
    #[serde(rename = "batteryHealth")]
    pub battery_health: i32,
    /// Device clock at upload, in Unix seconds. Series offsets are relative to it.
    #[serde(rename = "timeStamp")]
    pub time_stamp: i64,
}

/// One upload from a device.
///
/// Measurement fields are kept as raw JSON until [`Reading::from_json`]
/// classifies them, so shape errors surface as validation failures.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transmission {
    pub metadata: DeviceMetadata,
    #[serde(flatten)]
    pub measurements: BTreeMap<String, Value>,
}

/// A batch of evenly sampled readings for one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBatch {
    pub start_offset_secs: f64,
    pub end_offset_secs: f64,
    pub sample_rate_hz: f64,
    pub values: Vec<f64>,
}

/// A measurement value after its shape has been decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// A single number. Stored, never screened against settings.
    Scalar(f64),
    /// A time-ranged sample series.
    Series(SampleBatch),
}

impl Reading {
    /// Classify and validate a raw measurement value.
    pub fn from_json(measurement: &str, raw: &Value) -> Result<Self, CoreError> {
        match raw {
            Value::Number(n) => n
                .as_f64()
                .map(Reading::Scalar)
                .ok_or_else(|| invalid(measurement, "value is not a finite number")),
            Value::Array(items) => parse_series(measurement, items).map(Reading::Series),
            _ => Err(invalid(
                measurement,
                "value must be a number or a sample series",
            )),
        }
    }
}

fn parse_series(measurement: &str, items: &[Value]) -> Result<SampleBatch, CoreError> {
    let (header, samples) = items
        .split_first()
        .ok_or_else(|| invalid(measurement, "missing series header"))?;

    let header = header
        .as_array()
        .filter(|h| h.len() == 3)
        .ok_or_else(|| invalid(measurement, "series header must be [start, end, sample_rate]"))?;
    let header: Vec<f64> = header
        .iter()
        .map(|v| v.as_f64())
        .collect::<Option<_>>()
        .ok_or_else(|| invalid(measurement, "series header must be numeric"))?;
    let (start, end, rate) = (header[0], header[1], header[2]);

    if start < 0.0 || end < 0.0 || end < start {
        return Err(invalid(measurement, "invalid start/end time"));
    }
    if rate < 0.0 {
        return Err(invalid(measurement, "invalid sample rate"));
    }
    if samples.is_empty() {
        return Err(invalid(measurement, "missing data"));
    }

    let values = samples
        .iter()
        .map(|v| v.as_f64())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| invalid(measurement, "samples must be numeric"))?;

    Ok(SampleBatch {
        start_offset_secs: start,
        end_offset_secs: end,
        sample_rate_hz: rate,
        values,
    })
}

fn invalid(measurement: &str, reason: &str) -> CoreError {
    CoreError::Validation(format!("Invalid {measurement} data: {reason}"))
}

/// Persisted form of one measurement from one transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewObservation {
    #[serde(rename = "patientID")]
    pub patient_id: DbId,
    pub measurement: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub sample_rate: f64,
    /// Scalar text for tallies, a JSON array for series.
    pub data_points: String,
}

/// Convert a classified reading into its persisted observation.
pub fn parse(
    patient_id: DbId,
    measurement: &str,
    reading: &Reading,
    device_timestamp: i64,
) -> Result<NewObservation, CoreError> {
    let anchor = DateTime::from_timestamp(device_timestamp, 0)
        .ok_or_else(|| invalid(measurement, "invalid time stamp"))?;

    let (start, end, sample_rate, data_points) = match reading {
        Reading::Scalar(value) => (anchor, anchor, 0.0, value.to_string()),
        Reading::Series(batch) => {
            let start = offset(anchor, batch.start_offset_secs)
                .ok_or_else(|| invalid(measurement, "start time out of range"))?;
            let end = offset(anchor, batch.end_offset_secs)
                .ok_or_else(|| invalid(measurement, "end time out of range"))?;
            let data_points = serde_json::to_string(&batch.values)
                .map_err(|e| CoreError::Internal(format!("serialize samples: {e}")))?;
            (start, end, batch.sample_rate_hz, data_points)
        }
    };

    Ok(NewObservation {
        patient_id,
        measurement: measurement.to_string(),
        start,
        end,
        sample_rate,
        data_points,
    })
}

/// Shift `anchor` by a non-negative number of seconds, kept to the millisecond.
fn offset(anchor: Timestamp, secs: f64) -> Option<Timestamp> {
    let millis = (secs * 1000.0).round();
    if !millis.is_finite() || millis > i64::MAX as f64 {
        return None;
    }
    anchor.checked_add_signed(Duration::try_milliseconds(millis as i64)?)
}
