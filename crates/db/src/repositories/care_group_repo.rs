//! Identity lookups against `users`, `clinicians` and care-group membership.

use somnus_core::roles::ROLE_ADMIN;
use somnus_core::types::DbId;
use sqlx::PgPool;

pub struct CareGroupRepo;

impl CareGroupRepo {
    /// Clinician id for an external auth identity, if it belongs to a clinician.
    pub async fn find_clinician_id(
        pool: &PgPool,
        auth_id: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as(
            "SELECT c.id FROM clinicians c \
             JOIN users u ON u.id = c.user_id \
             WHERE u.auth_id = $1",
        )
        .bind(auth_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|r| r.0))
    }

    /// Whether `auth_id` shares a care group with the patient. Admins always do.
    pub async fn shares_care_group(
        pool: &PgPool,
        auth_id: &str,
        patient_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (\
                SELECT 1 FROM users u \
                WHERE u.auth_id = $1 AND (\
                    u.role = $3 OR EXISTS (\
                        SELECT 1 FROM user_care_group_relations r \
                        JOIN patients p ON p.care_group_id = r.care_group_id \
                        WHERE r.user_id = u.id AND p.id = $2\
                    )\
                )\
            )",
        )
        .bind(auth_id)
        .bind(patient_id)
        .bind(ROLE_ADMIN)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
