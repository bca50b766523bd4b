//! Severity evaluation for a single measurement batch.
//!
//! Pure logic, no store access. The ingestion orchestrator fetches the
//! patient's setting, calls [`evaluate`], and files whatever alert the
//! returned [`Screening`] asks for.

use crate::alert::{AlertDraft, AlertLevel};
use crate::error::CoreError;
use crate::measurement::{MeasurementPolicy, Polarity, Setting, Strategy};

/// Outcome of screening one sample batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Screening {
    pub level: AlertLevel,
    /// Alert to open; present exactly when `level` is above normal.
    pub alert: Option<AlertDraft>,
    /// Most severe offending sample, for bounded measurements that breached.
    pub extreme: Option<f64>,
}

impl Screening {
    fn normal() -> Self {
        Self {
            level: AlertLevel::Normal,
            alert: None,
            extreme: None,
        }
    }
}

/// Screen `samples` against a patient's `setting` using the measurement policy.
pub fn evaluate(
    policy: &MeasurementPolicy,
    samples: &[f64],
    setting: &Setting,
) -> Result<Screening, CoreError> {
    match policy.strategy {
        Strategy::FirstViolation => Ok(first_violation(policy, samples, setting)),
        Strategy::WorstOfBatch => worst_of_batch(policy, samples, setting),
    }
}

/// Level 1 on the first sample past the primary boundary; later samples are
/// not examined.
fn first_violation(policy: &MeasurementPolicy, samples: &[f64], setting: &Setting) -> Screening {
    let limit = setting.primary_value;
    let violates = |s: f64| match policy.polarity {
        Polarity::Falling => s < limit,
        Polarity::Rising => s > limit,
    };

    let Some(&first) = samples.iter().find(|&&s| violates(s)) else {
        return Screening::normal();
    };

    let relation = match policy.polarity {
        Polarity::Falling => "less than",
        Polarity::Rising => "more than",
    };
    Screening {
        level: AlertLevel::Moderate,
        alert: Some(AlertDraft {
            name: policy.name.to_string(),
            description: format!("{} {relation} {limit} hours", policy.display_name),
            level: AlertLevel::Moderate,
        }),
        extreme: Some(first),
    }
}

/// Classify a single sample against moderate/severe boundaries.
fn classify(polarity: Polarity, sample: f64, moderate: f64, severe: f64) -> AlertLevel {
    match polarity {
        Polarity::Rising if sample > severe => AlertLevel::Severe,
        Polarity::Rising if moderate <= sample => AlertLevel::Moderate,
        Polarity::Falling if sample < severe => AlertLevel::Severe,
        Polarity::Falling if sample <= moderate => AlertLevel::Moderate,
        _ => AlertLevel::Normal,
    }
}

fn worst_of_batch(
    policy: &MeasurementPolicy,
    samples: &[f64],
    setting: &Setting,
) -> Result<Screening, CoreError> {
    let moderate = setting.primary_value;
    let severe = setting.secondary_value.ok_or_else(|| {
        CoreError::Validation(format!(
            "Setting {} has no severe boundary",
            setting.setting_name
        ))
    })?;

    let mut level = AlertLevel::Normal;
    let mut extreme: Option<f64> = None;
    for &sample in samples {
        let sample_level = classify(policy.polarity, sample, moderate, severe);
        if !sample_level.is_alerting() {
            continue;
        }
        level = level.max(sample_level);
        extreme = Some(match (extreme, policy.polarity) {
            (None, _) => sample,
            (Some(worst), Polarity::Rising) => worst.max(sample),
            (Some(worst), Polarity::Falling) => worst.min(sample),
        });
    }

    if !level.is_alerting() {
        return Ok(Screening::normal());
    }

    let name = policy.display_name;
    let unit = &setting.unit;
    let description = match (level, policy.polarity) {
        (AlertLevel::Severe, Polarity::Rising) => format!("{name} exceeded {severe}{unit}"),
        (AlertLevel::Severe, Polarity::Falling) => format!("{name} was below {severe}{unit}"),
        (_, Polarity::Rising) => format!("{name} was between {moderate} and {severe}{unit}"),
        (_, Polarity::Falling) => format!("{name} was between {severe} and {moderate}{unit}"),
    };

    Ok(Screening {
        level,
        alert: Some(AlertDraft {
            name: policy.name.to_string(),
            description,
            level,
        }),
        extreme,
    })
}
