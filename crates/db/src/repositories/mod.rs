//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod alert_repo;
pub mod care_group_repo;
pub mod device_repo;
pub mod observation_repo;
pub mod patient_repo;
pub mod setting_repo;
pub mod threshold_repo;

pub use alert_repo::AlertRepo;
pub use care_group_repo::CareGroupRepo;
pub use device_repo::DeviceRepo;
pub use observation_repo::ObservationRepo;
pub use patient_repo::PatientRepo;
pub use setting_repo::SettingRepo;
pub use threshold_repo::ThresholdRepo;
