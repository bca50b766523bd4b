//! Alert ledger: opening, resolving, and aggregating patient alerts.
//!
//! The patient's aggregate level must always equal the worst level among the
//! patient's open alerts. Creation raises it; resolution recomputes it from
//! the alerts that remain open, which stays correct when alerts are resolved
//! out of order or several severities are open at once.

use std::sync::Arc;

use crate::alert::{Alert, AlertLevel, NewAlert};
use crate::error::CoreError;
use crate::locks::{PatientGuard, PatientLocks};
use crate::store::MonitoringStore;
use crate::types::DbId;

pub struct AlertLedger<S> {
    store: Arc<S>,
    locks: Arc<PatientLocks>,
}

impl<S> Clone for AlertLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<S: MonitoringStore> AlertLedger<S> {
    pub fn new(store: Arc<S>, locks: Arc<PatientLocks>) -> Self {
        Self { store, locks }
    }

    /// Open an alert for a patient.
    ///
    /// `triggered_by` is the auth identity of a clinician raising the alert by
    /// hand. If it does not resolve to a clinician, or the lookup itself fails,
    /// the alert is filed as system-generated instead of being rejected.
    pub async fn create_alert(
        &self,
        patient_id: DbId,
        name: &str,
        description: &str,
        level: AlertLevel,
        triggered_by: Option<&str>,
    ) -> Result<Alert, CoreError> {
        if !level.is_alerting() {
            return Err(CoreError::Validation(
                "alert level must be 1 (moderate) or 2 (severe)".into(),
            ));
        }
        if name.trim().is_empty() || description.trim().is_empty() {
            return Err(CoreError::Validation(
                "alert name and description are required".into(),
            ));
        }

        let clinician_id = match triggered_by {
            Some(auth_id) => self.clinician_or_system(auth_id).await,
            None => None,
        };

        let guard = self.locks.lock(patient_id).await;
        let current = self.current_level(&guard).await?;
        let alert = self
            .open_alert(
                &guard,
                NewAlert {
                    patient_id,
                    clinician_id,
                    alert_name: name.to_string(),
                    description: description.to_string(),
                    alert_level: level,
                },
            )
            .await?;
        self.write_level(&guard, current.max(level)).await?;
        Ok(alert)
    }

    /// Resolve an open alert on behalf of a clinician.
    ///
    /// Resolving an alert that is already resolved is a no-op and returns the
    /// stored record unchanged.
    pub async fn resolve_alert(&self, alert_id: DbId, resolver: &str) -> Result<Alert, CoreError> {
        let alert = self
            .store
            .find_alert(alert_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Alert", alert_id))?;

        if !self.store.same_care_group(resolver, alert.patient_id).await? {
            return Err(CoreError::Forbidden(
                "You are not in the same care group".into(),
            ));
        }
        let clinician_id = self.store.resolve_clinician(resolver).await?.ok_or_else(|| {
            CoreError::Forbidden("You are not authorised to resolve this alert".into())
        })?;

        let guard = self.locks.lock(alert.patient_id).await;

        // Re-read under the lock: a concurrent resolution may have won the race.
        let alert = self
            .store
            .find_alert(alert_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Alert", alert_id))?;
        if alert.is_resolved {
            tracing::debug!(alert_id, "Alert already resolved, nothing to do");
            return Ok(alert);
        }

        let resolved = self.store.resolve_alert_record(alert_id, clinician_id).await?;
        let level = self.recompute_level(&guard).await?;
        tracing::info!(
            alert_id,
            patient_id = alert.patient_id,
            clinician_id,
            aggregate = %level,
            "Alert resolved"
        );
        Ok(resolved)
    }

    /// Overwrite a patient's aggregate level unconditionally.
    pub async fn set_alert_level(&self, patient_id: DbId, level: AlertLevel) -> Result<(), CoreError> {
        let guard = self.locks.lock(patient_id).await;
        self.current_level(&guard).await?;
        self.write_level(&guard, level).await
    }

    pub async fn get_alert_level(&self, patient_id: DbId) -> Result<AlertLevel, CoreError> {
        self.store
            .find_patient_alert_level(patient_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Patient", patient_id))
    }

    /// All alerts for an existing patient, newest first.
    pub async fn list_alerts(&self, patient_id: DbId) -> Result<Vec<Alert>, CoreError> {
        self.get_alert_level(patient_id).await?;
        self.store.list_alerts(patient_id).await
    }

    // -----------------------------------------------------------------------
    // Operations that require the caller to hold the patient's guard
    // -----------------------------------------------------------------------

    pub(crate) async fn lock_patient(&self, patient_id: DbId) -> PatientGuard {
        self.locks.lock(patient_id).await
    }

    /// Fresh read of the stored aggregate level.
    pub(crate) async fn current_level(&self, guard: &PatientGuard) -> Result<AlertLevel, CoreError> {
        self.get_alert_level(guard.patient_id).await
    }

    pub(crate) async fn open_alert(
        &self,
        guard: &PatientGuard,
        alert: NewAlert,
    ) -> Result<Alert, CoreError> {
        debug_assert_eq!(guard.patient_id, alert.patient_id);
        let alert = self.store.create_alert_record(alert).await?;
        tracing::info!(
            alert_id = alert.alert_id,
            patient_id = alert.patient_id,
            name = %alert.alert_name,
            level = %alert.alert_level,
            system = alert.clinician_id.is_none(),
            "Alert opened"
        );
        Ok(alert)
    }

    pub(crate) async fn write_level(
        &self,
        guard: &PatientGuard,
        level: AlertLevel,
    ) -> Result<(), CoreError> {
        tracing::debug!(patient_id = guard.patient_id, level = %level, "Setting alert level");
        self.store
            .update_patient_alert_level(guard.patient_id, level)
            .await
    }

    /// Derive the aggregate from the patient's remaining open alerts and store it.
    async fn recompute_level(&self, guard: &PatientGuard) -> Result<AlertLevel, CoreError> {
        let patient_id = guard.patient_id;
        let red = self
            .store
            .count_open_alerts(patient_id, AlertLevel::Severe)
            .await?;
        let yellow = self
            .store
            .count_open_alerts(patient_id, AlertLevel::Moderate)
            .await?;

        let level = if red > 0 {
            AlertLevel::Severe
        } else if yellow > 0 {
            AlertLevel::Moderate
        } else {
            AlertLevel::Normal
        };
        self.write_level(guard, level).await?;
        Ok(level)
    }

    async fn clinician_or_system(&self, auth_id: &str) -> Option<DbId> {
        match self.store.resolve_clinician(auth_id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "Clinician lookup failed, filing alert as system-generated");
                None
            }
        }
    }
}
