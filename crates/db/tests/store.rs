//! Database-backed checks for the repositories and `PgStore`.

use std::sync::Arc;

use somnus_core::alert::{AlertLevel, NewAlert};
use somnus_core::device::{PIN_MAX, PIN_MIN};
use somnus_core::ingest::IngestionService;
use somnus_core::locks::PatientLocks;
use somnus_core::store::{AlertStore, PatientStore, SettingStore};
use somnus_core::telemetry::{DeviceIdentity, Transmission};
use somnus_db::models::setting::UpdateSetting;
use somnus_db::repositories::{
    AlertRepo, DeviceRepo, ObservationRepo, SettingRepo, ThresholdRepo,
};
use somnus_db::PgStore;
use sqlx::PgPool;

const DEVICE: DeviceIdentity = DeviceIdentity {
    cradle_id: 501,
    mouthguard_id: 502,
};

/// Seed one care group with a clinician and a patient wearing `DEVICE`.
/// Returns the patient id.
async fn seed(pool: &PgPool) -> i64 {
    let (group_id,): (i64,) =
        sqlx::query_as("INSERT INTO care_groups (name) VALUES ('Ward A') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();
    let (user_id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (auth_id, role) VALUES ('auth|doc', 'clinician') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO clinicians (user_id, name) VALUES ($1, 'Dr Test')")
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO user_care_group_relations (user_id, care_group_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(group_id)
        .execute(pool)
        .await
        .unwrap();
    let (patient_id,): (i64,) = sqlx::query_as(
        "INSERT INTO patients (care_group_id, name) VALUES ($1, 'Pat') RETURNING id",
    )
    .bind(group_id)
    .fetch_one(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO devices (cradle_id, mouthguard_id, device_pin, patient_id) \
         VALUES ($1, $2, 1234, $3)",
    )
    .bind(DEVICE.cradle_id)
    .bind(DEVICE.mouthguard_id)
    .bind(patient_id)
    .execute(pool)
    .await
    .unwrap();
    patient_id
}

#[sqlx::test(migrations = "./migrations")]
async fn test_new_patient_gets_default_settings_and_thresholds(pool: PgPool) {
    somnus_db::health_check(&pool).await.unwrap();
    let patient_id = seed(&pool).await;

    let settings = SettingRepo::list_for_patient(&pool, patient_id).await.unwrap();
    assert_eq!(settings.len(), 5);
    let spo2 = settings.iter().find(|s| s.setting_name == "spo2").unwrap();
    assert_eq!(spo2.primary_value, 90.0);
    assert_eq!(spo2.secondary_value, Some(80.0));

    let thresholds = ThresholdRepo::list_for_patient(&pool, patient_id).await.unwrap();
    assert_eq!(thresholds.len(), 5);
    assert!(thresholds.iter().all(|t| !t.active));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_setting_batch_update_is_all_or_nothing(pool: PgPool) {
    let patient_id = seed(&pool).await;
    let store = PgStore::new(pool.clone());

    let updates = [
        UpdateSetting {
            setting_name: "temp".into(),
            primary_value: 37.5,
            secondary_value: Some(38.5),
            tertiary_value: None,
            change_reason: "post-op".into(),
        },
        UpdateSetting {
            setting_name: "missing".into(),
            primary_value: 1.0,
            secondary_value: None,
            tertiary_value: None,
            change_reason: String::new(),
        },
    ];
    let result = SettingRepo::update_batch(&pool, patient_id, &updates).await.unwrap();
    assert!(result.is_none());

    let temp = store.find_setting(patient_id, "temp").await.unwrap().unwrap();
    assert_eq!(temp.primary_value, 37.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_ingest_then_resolve_round_trip(pool: PgPool) {
    let patient_id = seed(&pool).await;
    let store = Arc::new(PgStore::new(pool.clone()));
    let service = IngestionService::new(Arc::clone(&store), Arc::new(PatientLocks::new()));

    let tx: Transmission = serde_json::from_value(serde_json::json!({
        "metadata": {
            "cradleID": DEVICE.cradle_id,
            "mouthguardID": DEVICE.mouthguard_id,
            "batteryLevel": 55,
            "batteryHealth": 99,
            "timeStamp": 1_700_000_000
        },
        "temp": [[0, 60, 1], 36.5, 39.5],
        "ahi": [[0, 60, 1], 20],
        "usage": 6
    }))
    .unwrap();

    let report = service.receive_transmission(DEVICE, tx).await.unwrap();
    assert_eq!(report.observations, 3);
    assert_eq!(report.alert_level, AlertLevel::Severe);

    let (stored,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM observations WHERE patient_id = $1")
            .bind(patient_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored, 3);

    let red = report
        .alerts_opened
        .iter()
        .find(|a| a.alert_level == AlertLevel::Severe)
        .unwrap();
    let resolved = service
        .ledger()
        .resolve_alert(red.alert_id, "auth|doc")
        .await
        .unwrap();
    assert!(resolved.is_resolved);
    assert_eq!(
        store.find_patient_alert_level(patient_id).await.unwrap(),
        Some(AlertLevel::Moderate)
    );
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[sqlx::test(migrations = "./migrations")]
async fn test_one_device_per_patient(pool: PgPool) {
    let patient_id = seed(&pool).await;
    let spare = DeviceIdentity {
        cradle_id: 601,
        mouthguard_id: 602,
    };

    let err = DeviceRepo::provision(&pool, spare, patient_id, 4321)
        .await
        .unwrap_err();
    assert!(is_unique_violation(&err));

    assert!(DeviceRepo::deprovision(&pool, patient_id).await.unwrap());
    assert!(!DeviceRepo::deprovision(&pool, patient_id).await.unwrap());
    assert!(DeviceRepo::find(&pool, DEVICE).await.unwrap().is_none());

    let pin = somnus_core::device::generate_device_pin();
    let row = DeviceRepo::provision(&pool, spare, patient_id, pin).await.unwrap();
    assert!((PIN_MIN..=PIN_MAX).contains(&row.device_pin));
    assert_eq!(row.battery_level, 100);
    let found = DeviceRepo::find_for_patient(&pool, patient_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!((found.cradle_id, found.mouthguard_id), (601, 602));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_stored_observations_are_listed_in_time_order(pool: PgPool) {
    let patient_id = seed(&pool).await;
    let service = IngestionService::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(PatientLocks::new()),
    );

    for (stamp, usage) in [(1_700_003_600, 5), (1_700_000_000, 7)] {
        let tx: Transmission = serde_json::from_value(serde_json::json!({
            "metadata": {
                "cradleID": DEVICE.cradle_id,
                "mouthguardID": DEVICE.mouthguard_id,
                "batteryLevel": 80,
                "batteryHealth": 99,
                "timeStamp": stamp
            },
            "usage": usage
        }))
        .unwrap();
        service.receive_transmission(DEVICE, tx).await.unwrap();
    }

    let rows = ObservationRepo::list_for_patient(&pool, patient_id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].data_points, "7");
    assert_eq!(rows[1].data_points, "5");
    assert!(rows[0].start_time < rows[1].start_time);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_clinician_sees_only_care_group_alerts(pool: PgPool) {
    let patient_id = seed(&pool).await;
    let (other_group,): (i64,) =
        sqlx::query_as("INSERT INTO care_groups (name) VALUES ('Ward B') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
    let (other_patient,): (i64,) = sqlx::query_as(
        "INSERT INTO patients (care_group_id, name) VALUES ($1, 'Sam') RETURNING id",
    )
    .bind(other_group)
    .fetch_one(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO users (auth_id, role) VALUES ('auth|root', 'admin')")
        .execute(&pool)
        .await
        .unwrap();

    let store = PgStore::new(pool.clone());
    for patient in [patient_id, other_patient] {
        store
            .create_alert_record(NewAlert {
                patient_id: patient,
                clinician_id: None,
                alert_name: "temp".into(),
                description: "Temperature exceeded 39°C".into(),
                alert_level: AlertLevel::Severe,
            })
            .await
            .unwrap();
    }

    let visible = AlertRepo::list_visible_to(&pool, "auth|doc").await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].patient_id, patient_id);

    let all = AlertRepo::list_visible_to(&pool, "auth|root").await.unwrap();
    assert_eq!(all.len(), 2);

    assert!(AlertRepo::list_visible_to(&pool, "auth|nobody")
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_resolving_a_row_leaves_the_aggregate_to_the_ledger(pool: PgPool) {
    let patient_id = seed(&pool).await;
    let store = PgStore::new(pool.clone());
    store
        .update_patient_alert_level(patient_id, AlertLevel::Severe)
        .await
        .unwrap();
    let alert = store
        .create_alert_record(NewAlert {
            patient_id,
            clinician_id: None,
            alert_name: "spo2".into(),
            description: "SpO2 was below 80%".into(),
            alert_level: AlertLevel::Severe,
        })
        .await
        .unwrap();
    let (clinician_id,): (i64,) = sqlx::query_as("SELECT id FROM clinicians LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();

    let row = AlertRepo::resolve(&pool, alert.alert_id, clinician_id)
        .await
        .unwrap()
        .unwrap();
    assert!(row.is_resolved);
    assert_eq!(row.alert_level, 0);
    assert_eq!(
        store.find_patient_alert_level(patient_id).await.unwrap(),
        Some(AlertLevel::Severe)
    );
}
