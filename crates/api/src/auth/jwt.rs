//! JWT generation and validation for staff and devices.
//!
//! Staff tokens carry a [`Claims`] payload whose subject is the external auth
//! identity. Device tokens carry [`DeviceClaims`] naming the cradle and
//! mouthguard pair that logged in. Both are HS256-signed with the same secret;
//! the payload shapes are disjoint so neither decodes as the other.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use somnus_core::telemetry::DeviceIdentity;
use uuid::Uuid;

/// JWT claims embedded in every staff access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's external auth identity.
    pub sub: String,
    /// The user's role name (`"admin"`, `"clinician"` or `"patient"`).
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for revocation / audit.
    pub jti: String,
}

/// Claims carried by a device session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeviceClaims {
    pub cradle_id: i64,
    pub mouthguard_id: i64,
    pub exp: i64,
    pub iat: i64,
}

impl DeviceClaims {
    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity {
            cradle_id: self.cradle_id,
            mouthguard_id: self.mouthguard_id,
        }
    }
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Staff access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Device session lifetime in hours (default: 12).
    pub device_token_expiry_hours: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default device session expiry in hours.
const DEFAULT_DEVICE_EXPIRY_HOURS: i64 = 12;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                     | Required | Default |
    /// |-----------------------------|----------|---------|
    /// | `JWT_SECRET`                | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`    | no       | `15`    |
    /// | `DEVICE_TOKEN_EXPIRY_HOURS` | no       | `12`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let device_token_expiry_hours: i64 = std::env::var("DEVICE_TOKEN_EXPIRY_HOURS")
            .unwrap_or_else(|_| DEFAULT_DEVICE_EXPIRY_HOURS.to_string())
            .parse()
            .expect("DEVICE_TOKEN_EXPIRY_HOURS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
            device_token_expiry_hours,
        }
    }
}

/// Generate an HS256 access token for a staff member.
pub fn generate_access_token(
    auth_id: &str,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: auth_id.to_string(),
        role: role.to_string(),
        exp: now + config.access_token_expiry_mins * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode a staff access token.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

/// Generate a session token for a device that passed PIN login.
pub fn generate_device_token(
    identity: DeviceIdentity,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = DeviceClaims {
        cradle_id: identity.cradle_id,
        mouthguard_id: identity.mouthguard_id,
        exp: now + config.device_token_expiry_hours * 3600,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

pub fn validate_device_token(
    token: &str,
    config: &JwtConfig,
) -> Result<DeviceClaims, jsonwebtoken::errors::Error> {
    let token_data = decode::<DeviceClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
