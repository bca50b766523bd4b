//! Alert severity scale and alert record types.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Severity of a patient alert, and of the patient's aggregate indicator.
///
/// Ordered so that `max` picks the worse of two levels. Serialized as the
/// integer stored in the database (`0`, `1`, `2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum AlertLevel {
    /// No open alerts.
    #[default]
    Normal,
    /// A moderate threshold was crossed ("yellow").
    Moderate,
    /// A severe threshold was crossed ("red").
    Severe,
}

impl AlertLevel {
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Normal => 0,
            Self::Moderate => 1,
            Self::Severe => 2,
        }
    }

    /// Whether an alert may be opened at this level.
    pub fn is_alerting(self) -> bool {
        self != Self::Normal
    }
}

impl From<AlertLevel> for i16 {
    fn from(level: AlertLevel) -> Self {
        level.as_i16()
    }
}

impl TryFrom<i16> for AlertLevel {
    type Error = CoreError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Moderate),
            2 => Ok(Self::Severe),
            other => Err(CoreError::Validation(format!(
                "alert level must be 0, 1 or 2, got {other}"
            ))),
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i16())
    }
}

/// A persisted alert.
///
/// `clinician_id` is `None` for system-generated alerts until a clinician
/// resolves them; after resolution it names the resolver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(rename = "alertID")]
    pub alert_id: DbId,
    #[serde(rename = "patientID")]
    pub patient_id: DbId,
    #[serde(rename = "clinicianID")]
    pub clinician_id: Option<DbId>,
    pub alert_name: String,
    pub description: String,
    pub alert_level: AlertLevel,
    pub is_resolved: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for a new, open alert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub patient_id: DbId,
    pub clinician_id: Option<DbId>,
    pub alert_name: String,
    pub description: String,
    pub alert_level: AlertLevel,
}

/// An alert requested by the severity evaluator, not yet bound to a patient.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    /// Measurement name the alert is filed under (e.g. `"spo2"`).
    pub name: String,
    /// Human-readable description naming the crossed boundary.
    pub description: String,
    pub level: AlertLevel,
}
