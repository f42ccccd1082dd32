//! Profile service for reading and editing the signed-in user's profile

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{validate_full_name, validate_indian_phone, Profile};

/// Profile service
#[derive(Clone)]
pub struct ProfileService {
    db: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    user_id: Uuid,
    full_name: String,
    phone: Option<String>,
    location: Option<String>,
    user_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let user_type = row
            .user_type
            .parse()
            .map_err(|_| AppError::Internal(format!("Unknown user type: {}", row.user_type)))?;

        Ok(Profile {
            id: row.id,
            user_id: row.user_id,
            full_name: row.full_name,
            phone: row.phone,
            location: row.location,
            user_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Input for updating a profile; omitted fields are left unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateProfileInput {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

impl ProfileService {
    /// Create a new ProfileService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get the profile belonging to a user
    pub async fn get_by_user(&self, user_id: Uuid) -> AppResult<Profile> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, user_id, full_name, phone, location, user_type, created_at, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;

        row.try_into()
    }

    /// Update the user's profile
    pub async fn update(&self, user_id: Uuid, input: UpdateProfileInput) -> AppResult<Profile> {
        if let Some(ref name) = input.full_name {
            validate_full_name(name).map_err(|msg| AppError::validation("full_name", msg))?;
        }
        if let Some(phone) = input.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            validate_indian_phone(phone).map_err(|msg| AppError::validation("phone", msg))?;
        }

        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            UPDATE profiles
            SET full_name = COALESCE($1, full_name),
                phone = COALESCE($2, phone),
                location = COALESCE($3, location),
                updated_at = NOW()
            WHERE user_id = $4
            RETURNING id, user_id, full_name, phone, location, user_type, created_at, updated_at
            "#,
        )
        .bind(input.full_name.as_deref().map(str::trim))
        .bind(&input.phone)
        .bind(&input.location)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile".to_string()))?;

        tracing::debug!(%user_id, "Profile updated");

        row.try_into()
    }
}
