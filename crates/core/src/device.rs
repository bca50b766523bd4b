//! Device credentials issued at provisioning time.

use rand::Rng;

/// Smallest PIN handed out; PINs are always four digits.
pub const PIN_MIN: i32 = 1000;
pub const PIN_MAX: i32 = 9999;

/// Draw a fresh four-digit PIN for a newly provisioned device pair.
///
/// The PIN is shown once to the provisioning clinician, who passes it to
/// the patient for the cradle's first login.
pub fn generate_device_pin() -> i32 {
    rand::rng().random_range(PIN_MIN..=PIN_MAX)
}
