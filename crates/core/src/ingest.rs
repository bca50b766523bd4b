//! Ingestion orchestrator: turns one device transmission into persisted
//! observations, alerts, and an updated aggregate level.
//!
//! Every measurement is validated and parsed before anything is screened or
//! written, so a malformed field rejects the whole transmission without
//! leaving partial observations or alerts behind.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::alert::{Alert, AlertLevel, NewAlert};
use crate::error::CoreError;
use crate::ledger::AlertLedger;
use crate::locks::PatientLocks;
use crate::measurement::policy_for;
use crate::severity::{self, Screening};
use crate::store::{DeviceTelemetryUpdate, MonitoringStore};
use crate::telemetry::{self, DeviceIdentity, NewObservation, Reading, Transmission};
use crate::types::DbId;

/// Summary of a processed transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    #[serde(rename = "patientID")]
    pub patient_id: DbId,
    /// Number of observations persisted.
    pub observations: u64,
    /// Aggregate level after screening.
    pub alert_level: AlertLevel,
    pub alerts_opened: Vec<Alert>,
}

/// A measurement that passed validation, ready for screening and storage.
struct Prepared {
    observation: NewObservation,
    /// `None` for scalar tallies, which are stored but never screened.
    screening: Option<Screening>,
}

pub struct IngestionService<S> {
    store: Arc<S>,
    ledger: AlertLedger<S>,
}

impl<S: MonitoringStore> IngestionService<S> {
    pub fn new(store: Arc<S>, locks: Arc<PatientLocks>) -> Self {
        let ledger = AlertLedger::new(Arc::clone(&store), locks);
        Self { store, ledger }
    }

    /// Ledger sharing this service's store and patient locks.
    pub fn ledger(&self) -> &AlertLedger<S> {
        &self.ledger
    }

    /// Process one upload from the device authenticated as `credential`.
    pub async fn receive_transmission(
        &self,
        credential: DeviceIdentity,
        transmission: Transmission,
    ) -> Result<IngestReport, CoreError> {
        let Transmission {
            metadata,
            measurements,
        } = transmission;
        let identity = metadata.identity;

        let device = self
            .store
            .find_device(identity)
            .await?
            .ok_or_else(|| CoreError::not_found("Device", identity))?;
        if credential != identity {
            tracing::warn!(
                credential = %credential,
                claimed = %identity,
                "Transmission metadata does not match the authenticated device"
            );
            return Err(CoreError::Forbidden(
                "Device identity does not match credentials".into(),
            ));
        }
        let patient_id = device
            .patient_id
            .ok_or_else(|| CoreError::not_found("Patient for device", identity))?;

        for (field, value) in [
            ("batteryLevel", metadata.battery_level),
            ("batteryHealth", metadata.battery_health),
        ] {
            if !(0..=100).contains(&value) {
                return Err(CoreError::Validation(format!(
                    "{field} must be between 0 and 100, got {value}"
                )));
            }
        }

        self.store
            .update_device_metadata(
                identity,
                DeviceTelemetryUpdate {
                    battery_level: metadata.battery_level,
                    battery_health: metadata.battery_health,
                    last_transmission: Utc::now(),
                },
            )
            .await?;

        let mut prepared = Vec::with_capacity(measurements.len());
        for (name, raw) in &measurements {
            prepared.push(self.prepare(patient_id, name, raw, metadata.time_stamp).await?);
        }

        let mut observations = Vec::with_capacity(prepared.len());
        let mut screenings = Vec::new();
        for item in prepared {
            observations.push(item.observation);
            screenings.extend(item.screening);
        }

        // Observations before alerts; a level is raised only once its alert exists.
        let guard = self.ledger.lock_patient(patient_id).await;
        let stored = if observations.is_empty() {
            0
        } else {
            self.store.insert_observations(&observations).await?
        };

        let mut alerts_opened = Vec::new();
        for screening in screenings {
            let Some(draft) = screening.alert else {
                continue;
            };
            let alert = self
                .ledger
                .open_alert(
                    &guard,
                    NewAlert {
                        patient_id,
                        clinician_id: None,
                        alert_name: draft.name,
                        description: draft.description,
                        alert_level: draft.level,
                    },
                )
                .await?;
            let current = self.ledger.current_level(&guard).await?;
            self.ledger
                .write_level(&guard, current.max(screening.level))
                .await?;
            alerts_opened.push(alert);
        }

        let alert_level = self.ledger.current_level(&guard).await?;
        drop(guard);

        tracing::info!(
            device = %identity,
            patient_id,
            observations = stored,
            alerts = alerts_opened.len(),
            level = %alert_level,
            "Transmission processed"
        );

        Ok(IngestReport {
            patient_id,
            observations: stored,
            alert_level,
            alerts_opened,
        })
    }

    async fn prepare(
        &self,
        patient_id: DbId,
        name: &str,
        raw: &serde_json::Value,
        device_timestamp: i64,
    ) -> Result<Prepared, CoreError> {
        let policy = policy_for(name)?;
        let setting = self
            .store
            .find_setting(patient_id, name)
            .await?
            .ok_or_else(|| {
                CoreError::Validation(format!("No {name} setting for patient {patient_id}"))
            })?;
        let reading = Reading::from_json(name, raw)?;
        let observation = telemetry::parse(patient_id, name, &reading, device_timestamp)?;
        let screening = match &reading {
            Reading::Series(batch) => Some(severity::evaluate(policy, &batch.values, &setting)?),
            Reading::Scalar(_) => None,
        };
        Ok(Prepared {
            observation,
            screening,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use assert_matches::assert_matches;
    use serde_json::{json, Value};

    const PATIENT: DbId = 7;
    const DEVICE: DeviceIdentity = DeviceIdentity {
        cradle_id: 11,
        mouthguard_id: 22,
    };

    fn service() -> (Arc<MemoryStore>, IngestionService<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.add_patient(PATIENT);
        store.add_device(DEVICE, 1234, Some(PATIENT));
        let service = IngestionService::new(Arc::clone(&store), Arc::new(PatientLocks::new()));
        (store, service)
    }

    fn transmission(identity: DeviceIdentity, fields: Value) -> Transmission {
        let mut body = json!({
            "metadata": {
                "cradleID": identity.cradle_id,
                "mouthguardID": identity.mouthguard_id,
                "batteryLevel": 64,
                "batteryHealth": 90,
                "timeStamp": 1_700_000_000
            }
        });
        if let (Some(target), Value::Object(extra)) = (body.as_object_mut(), fields) {
            target.extend(extra);
        }
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn stores_every_measurement_and_screens_series() {
        let (store, service) = service();
        let tx = transmission(
            DEVICE,
            json!({
                "ahi": [[0, 3600, 0.1], 4, 20, 12],
                "usage": 7
            }),
        );

        let report = service.receive_transmission(DEVICE, tx).await.unwrap();

        assert_eq!(report.patient_id, PATIENT);
        assert_eq!(report.observations, 2);
        assert_eq!(report.alert_level, AlertLevel::Moderate);
        assert_eq!(report.alerts_opened.len(), 1);
        assert_eq!(report.alerts_opened[0].alert_name, "ahi");
        assert_eq!(report.alerts_opened[0].clinician_id, None);
        assert_eq!(store.observations().len(), 2);
    }

    #[tokio::test]
    async fn updates_device_battery_and_last_transmission() {
        let (store, service) = service();
        service
            .receive_transmission(DEVICE, transmission(DEVICE, json!({})))
            .await
            .unwrap();

        let device = store.device(DEVICE).unwrap();
        assert_eq!(device.battery_level, 64);
        assert_eq!(device.battery_health, 90);
        assert!(device.last_transmission.is_some());
        assert!(store.observations().is_empty());
    }

    #[tokio::test]
    async fn scalar_readings_are_not_screened() {
        let (store, service) = service();
        let report = service
            .receive_transmission(DEVICE, transmission(DEVICE, json!({ "spo2": 50 })))
            .await
            .unwrap();
        assert_eq!(report.alert_level, AlertLevel::Normal);
        assert!(report.alerts_opened.is_empty());
        assert_eq!(store.observations().len(), 1);
    }

    #[tokio::test]
    async fn identity_mismatch_is_forbidden() {
        let (store, service) = service();
        let other = DeviceIdentity {
            cradle_id: 11,
            mouthguard_id: 99,
        };
        let tx = transmission(DEVICE, json!({ "temp": [[0, 10, 1], 41] }));

        assert_matches!(
            service.receive_transmission(other, tx).await,
            Err(CoreError::Forbidden(_))
        );
        assert!(store.observations().is_empty());
        assert_eq!(store.open_alert_count(PATIENT), 0);
    }

    #[tokio::test]
    async fn unknown_or_unassigned_device_is_not_found() {
        let (store, service) = service();
        let stranger = DeviceIdentity {
            cradle_id: 1,
            mouthguard_id: 2,
        };
        assert_matches!(
            service
                .receive_transmission(stranger, transmission(stranger, json!({})))
                .await,
            Err(CoreError::NotFound { entity: "Device", .. })
        );

        store.add_device(stranger, 0, None);
        assert_matches!(
            service
                .receive_transmission(stranger, transmission(stranger, json!({})))
                .await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn battery_outside_percentage_range_is_rejected() {
        let (_, service) = service();
        let mut tx = transmission(DEVICE, json!({}));
        tx.metadata.battery_level = 150;
        assert_matches!(
            service.receive_transmission(DEVICE, tx).await,
            Err(CoreError::Validation(msg)) if msg.contains("batteryLevel")
        );
    }

    #[tokio::test]
    async fn one_bad_measurement_rejects_the_whole_transmission() {
        let (store, service) = service();
        let tx = transmission(
            DEVICE,
            json!({
                "temp": [[0, 10, 1], 41],
                "spo2": [[0, 10, 1]]
            }),
        );

        assert_matches!(
            service.receive_transmission(DEVICE, tx).await,
            Err(CoreError::Validation(_))
        );
        assert!(store.observations().is_empty());
        assert_eq!(store.open_alert_count(PATIENT), 0);
        assert_eq!(
            service.ledger().get_alert_level(PATIENT).await.unwrap(),
            AlertLevel::Normal
        );
    }

    #[tokio::test]
    async fn failed_observation_insert_opens_no_alerts() {
        let (store, service) = service();
        store.fail_observations(true);
        let tx = transmission(DEVICE, json!({ "temp": [[0, 10, 1], 41] }));

        assert_matches!(
            service.receive_transmission(DEVICE, tx).await,
            Err(CoreError::Internal(_))
        );
        assert!(store.observations().is_empty());
        assert_eq!(store.open_alert_count(PATIENT), 0);
        assert_eq!(
            service.ledger().get_alert_level(PATIENT).await.unwrap(),
            AlertLevel::Normal
        );

        // The device retries once the store recovers: exactly one alert.
        store.fail_observations(false);
        let tx = transmission(DEVICE, json!({ "temp": [[0, 10, 1], 41] }));
        let report = service.receive_transmission(DEVICE, tx).await.unwrap();
        assert_eq!(report.alert_level, AlertLevel::Severe);
        assert_eq!(store.open_alert_count(PATIENT), 1);
    }

    #[tokio::test]
    async fn unknown_measurement_is_rejected() {
        let (store, service) = service();
        let tx = transmission(DEVICE, json!({ "heart_rate": [[0, 10, 1], 80] }));
        assert_matches!(
            service.receive_transmission(DEVICE, tx).await,
            Err(CoreError::Validation(msg)) if msg.contains("heart_rate")
        );
        assert!(store.observations().is_empty());
    }

    #[tokio::test]
    async fn missing_setting_is_rejected() {
        let (store, service) = service();
        store.put_setting(PATIENT, "ahi", None);
        let tx = transmission(DEVICE, json!({ "ahi": [[0, 10, 1], 40] }));
        assert_matches!(
            service.receive_transmission(DEVICE, tx).await,
            Err(CoreError::Validation(msg)) if msg.contains("No ahi setting")
        );
    }

    #[tokio::test]
    async fn aggregate_is_raised_never_lowered() {
        let (_, service) = service();
        service
            .ledger()
            .set_alert_level(PATIENT, AlertLevel::Severe)
            .await
            .unwrap();

        let report = service
            .receive_transmission(DEVICE, transmission(DEVICE, json!({ "temp": [[0, 10, 1], 38] })))
            .await
            .unwrap();
        assert_eq!(report.alerts_opened[0].alert_level, AlertLevel::Moderate);
        assert_eq!(report.alert_level, AlertLevel::Severe);
    }

    #[tokio::test]
    async fn severe_spo2_batch_opens_red_alert() {
        let (_, service) = service();
        let report = service
            .receive_transmission(
                DEVICE,
                transmission(DEVICE, json!({ "spo2": [[0, 30, 0.1], 96, 88, 76] })),
            )
            .await
            .unwrap();
        assert_eq!(report.alert_level, AlertLevel::Severe);
        assert_eq!(report.alerts_opened[0].description, "SpO2 was below 80%");
    }

    #[tokio::test]
    async fn concurrent_transmissions_keep_the_worst_level() {
        let (store, service) = service();
        let service = Arc::new(service);

        let uploads = [
            json!({ "temp": [[0, 10, 1], 40] }),
            json!({ "ahi": [[0, 10, 1], 20] }),
            json!({ "spo2": [[0, 10, 1], 85] }),
        ];
        let handles: Vec<_> = uploads
            .into_iter()
            .map(|fields| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .receive_transmission(DEVICE, transmission(DEVICE, fields))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.open_alert_count(PATIENT), 3);
        assert_eq!(
            service.ledger().get_alert_level(PATIENT).await.unwrap(),
            AlertLevel::Severe
        );
    }
}
