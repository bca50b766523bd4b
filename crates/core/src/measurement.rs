//! Measurement policy table and per-patient screening configuration.
//!
//! Every measurement a device may report is listed in [`POLICIES`]. The table
//! decides how the severity evaluator treats a sample stream: which direction
//! counts as "worse" and whether the first violation or the worst sample wins.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const MEASUREMENT_USAGE: &str = "usage";
pub const MEASUREMENT_AHI: &str = "ahi";
pub const MEASUREMENT_SPO2: &str = "spo2";
pub const MEASUREMENT_TEMP: &str = "temp";
pub const MEASUREMENT_TILT: &str = "tilt";

/// Which direction of travel makes a sample worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Higher is worse; `severe` sits above `moderate`.
    Rising,
    /// Lower is worse; `severe` sits below `moderate`.
    Falling,
}

/// How a batch of samples is reduced to a single level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Stop at the first sample past the primary boundary (level 1 only).
    FirstViolation,
    /// Scan the whole batch and report the worst level found.
    WorstOfBatch,
}

/// Screening policy for one measurement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementPolicy {
    pub name: &'static str,
    pub display_name: &'static str,
    pub polarity: Polarity,
    pub strategy: Strategy,
}

pub const POLICIES: &[MeasurementPolicy] = &[
    MeasurementPolicy {
        name: MEASUREMENT_USAGE,
        display_name: "Usage",
        polarity: Polarity::Falling,
        strategy: Strategy::FirstViolation,
    },
    MeasurementPolicy {
        name: MEASUREMENT_AHI,
        display_name: "AHI",
        polarity: Polarity::Rising,
        strategy: Strategy::WorstOfBatch,
    },
    MeasurementPolicy {
        name: MEASUREMENT_SPO2,
        display_name: "SpO2",
        polarity: Polarity::Falling,
        strategy: Strategy::WorstOfBatch,
    },
    MeasurementPolicy {
        name: MEASUREMENT_TEMP,
        display_name: "Temperature",
        polarity: Polarity::Rising,
        strategy: Strategy::WorstOfBatch,
    },
    MeasurementPolicy {
        name: MEASUREMENT_TILT,
        display_name: "Head Tilt",
        polarity: Polarity::Rising,
        strategy: Strategy::WorstOfBatch,
    },
];

/// Look up the policy for a measurement name.
///
/// Unknown names are rejected rather than screened with a guessed policy.
pub fn policy_for(name: &str) -> Result<&'static MeasurementPolicy, CoreError> {
    POLICIES
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| CoreError::Validation(format!("Unknown measurement type: {name}")))
}

/// Per-patient screening boundaries for one measurement.
///
/// For `usage`, `primary_value` is the minimum number of hours. For bounded
/// measurements `primary_value` is the moderate boundary and `secondary_value`
/// the severe boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    #[serde(rename = "settingID")]
    pub setting_id: DbId,
    #[serde(rename = "patientID")]
    pub patient_id: DbId,
    pub setting_name: String,
    pub primary_value: f64,
    pub secondary_value: Option<f64>,
    pub tertiary_value: Option<f64>,
    pub unit: String,
    pub change_reason: String,
}

/// A setting template used when provisioning a new patient.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultSetting {
    pub setting_name: &'static str,
    pub primary_value: f64,
    pub secondary_value: Option<f64>,
    pub change_reason: &'static str,
    pub unit: &'static str,
}

/// Settings every new patient starts with.
pub fn default_settings() -> Vec<DefaultSetting> {
    let setting = |name: &'static str,
                   primary: f64,
                   secondary: Option<f64>,
                   unit: &'static str| DefaultSetting {
        setting_name: name,
        primary_value: primary,
        secondary_value: secondary,
        change_reason: "",
        unit,
    };
    vec![
        setting(MEASUREMENT_USAGE, 8.0, None, " hour(s)"),
        setting(MEASUREMENT_AHI, 15.0, Some(30.0), " event(s)/hour"),
        setting(MEASUREMENT_SPO2, 90.0, Some(80.0), "%"),
        setting(MEASUREMENT_TEMP, 37.0, Some(39.0), "°C"),
        setting(MEASUREMENT_TILT, 360.0, Some(360.0), "°"),
    ]
}

/// Check that a setting's boundaries make sense for its measurement policy.
///
/// Bounded measurements need a severe boundary on the "worse" side of the
/// moderate one: above it for rising measurements, below it for falling ones.
pub fn validate_setting(
    name: &str,
    primary: f64,
    secondary: Option<f64>,
) -> Result<(), CoreError> {
    let policy = policy_for(name)?;
    if !primary.is_finite() || secondary.is_some_and(|s| !s.is_finite()) {
        return Err(CoreError::Validation(format!(
            "{name} boundaries must be finite numbers"
        )));
    }
    if policy.strategy == Strategy::FirstViolation {
        return Ok(());
    }

    let Some(severe) = secondary else {
        return Err(CoreError::Validation(format!(
            "{name} requires a severe (secondary) boundary"
        )));
    };
    let ordered = match policy.polarity {
        Polarity::Rising => primary <= severe,
        Polarity::Falling => severe <= primary,
    };
    if !ordered {
        return Err(CoreError::Validation(format!(
            "{name} severe boundary {severe} is on the wrong side of moderate boundary {primary}"
        )));
    }
    Ok(())
}

/// Clinician-facing threshold row, one per (patient, measurement).
///
/// `None` on either side means that side is unbounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Threshold {
    #[serde(rename = "thresholdID")]
    pub threshold_id: DbId,
    #[serde(rename = "patientID")]
    pub patient_id: DbId,
    pub measurement: String,
    pub lower_value: Option<f64>,
    pub upper_value: Option<f64>,
    pub comments: String,
    pub unit: String,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn every_default_setting_has_a_policy() {
        for setting in default_settings() {
            assert!(policy_for(setting.setting_name).is_ok());
            validate_setting(
                setting.setting_name,
                setting.primary_value,
                setting.secondary_value,
            )
            .unwrap();
        }
    }

    #[test]
    fn spo2_is_falling_and_usage_stops_at_first_violation() {
        assert_eq!(policy_for("spo2").unwrap().polarity, Polarity::Falling);
        assert_eq!(policy_for("ahi").unwrap().polarity, Polarity::Rising);
        assert_eq!(
            policy_for("usage").unwrap().strategy,
            Strategy::FirstViolation
        );
    }

    #[test]
    fn unknown_measurement_is_rejected() {
        assert_matches!(policy_for("heart_rate"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn bounded_setting_requires_secondary() {
        assert_matches!(
            validate_setting("temp", 37.0, None),
            Err(CoreError::Validation(_))
        );
        assert!(validate_setting("usage", 6.0, None).is_ok());
    }

    #[test]
    fn bounded_setting_order_follows_polarity() {
        assert!(validate_setting("temp", 37.0, Some(39.0)).is_ok());
        assert!(validate_setting("temp", 39.0, Some(37.0)).is_err());
        assert!(validate_setting("spo2", 90.0, Some(80.0)).is_ok());
        assert!(validate_setting("spo2", 80.0, Some(90.0)).is_err());
    }

    #[test]
    fn non_finite_boundaries_are_rejected() {
        assert!(validate_setting("ahi", f64::NAN, Some(30.0)).is_err());
        assert!(validate_setting("ahi", 15.0, Some(f64::INFINITY)).is_err());
    }
}
