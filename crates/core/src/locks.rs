//! Per-patient serialization for aggregate alert level updates.
//!
//! Every read-modify-write of a patient's aggregate level (ingestion,
//! manual alert creation, resolution, overrides) runs while holding that
//! patient's guard, so concurrent transmissions for the same patient cannot
//! lose each other's raises. The registry only covers a single process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::types::DbId;

/// Registry of per-patient async locks.
#[derive(Debug, Default)]
pub struct PatientLocks {
    locks: Mutex<HashMap<DbId, Arc<AsyncMutex<()>>>>,
}

/// Held while a patient's alert state is being changed.
#[derive(Debug)]
pub struct PatientGuard {
    pub patient_id: DbId,
    _guard: OwnedMutexGuard<()>,
}

impl PatientLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `patient_id`'s alert state.
    pub async fn lock(&self, patient_id: DbId) -> PatientGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Drop entries nobody is waiting on so the map tracks only active patients.
            locks.retain(|id, l| *id == patient_id || Arc::strong_count(l) > 1);
            Arc::clone(locks.entry(patient_id).or_default())
        };
        PatientGuard {
            patient_id,
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of patients currently tracked.
    pub fn tracked(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_patient_is_serialized() {
        let locks = Arc::new(PatientLocks::new());
        let guard = locks.lock(1).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.lock(1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender acquires after release")
            .unwrap();
    }

    #[tokio::test]
    async fn different_patients_do_not_block() {
        let locks = PatientLocks::new();
        let _a = locks.lock(1).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(2)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = PatientLocks::new();
        for id in 0..10 {
            drop(locks.lock(id).await);
        }
        assert!(locks.tracked() <= 1);
    }
}
