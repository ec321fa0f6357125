//! Read operations for the `accounts` table.

use chrono::{DateTime, Utc};
use grocer_core::{AccountRole, LocatedEntity};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::located::coordinate;

/// A row from the `accounts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountRow {
    /// Stored coordinates as `(latitude, longitude)`, each possibly missing.
    #[must_use]
    pub fn stored_position(&self) -> (Option<f64>, Option<f64>) {
        (coordinate(self.latitude), coordinate(self.longitude))
    }

    #[must_use]
    pub fn into_located(self) -> LocatedEntity<AccountRow> {
        let (latitude, longitude) = self.stored_position();
        LocatedEntity::new(self.id, latitude, longitude, self)
    }
}

/// Fetch one account by id.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_account(pool: &PgPool, id: Uuid) -> Result<Option<AccountRow>, sqlx::Error> {
    sqlx::query_as::<_, AccountRow>(
        "SELECT id, display_name, email, role, is_active, latitude, longitude, \
                created_at, updated_at \
         FROM accounts \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// List active accounts holding any of `roles` that have both coordinates on
/// record.
///
/// Results are ordered by `display_name ASC, id ASC`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_located_accounts_by_roles(
    pool: &PgPool,
    roles: &[AccountRole],
) -> Result<Vec<AccountRow>, sqlx::Error> {
    if roles.is_empty() {
        return Ok(Vec::new());
    }

    let roles: Vec<&str> = roles.iter().map(AccountRole::as_str).collect();
    sqlx::query_as::<_, AccountRow>(
        "SELECT id, display_name, email, role, is_active, latitude, longitude, \
                created_at, updated_at \
         FROM accounts \
         WHERE role = ANY($1::text[]) \
           AND is_active = TRUE \
           AND latitude IS NOT NULL \
           AND longitude IS NOT NULL \
         ORDER BY display_name ASC, id ASC",
    )
    .bind(roles)
    .fetch_all(pool)
    .await
}
