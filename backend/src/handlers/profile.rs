//! Profile handlers

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::profile::UpdateProfileInput;
use crate::services::ProfileService;
use crate::AppState;
use shared::Profile;

/// Get the signed-in user's profile
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Profile>> {
    let service = ProfileService::new(state.db.clone());
    let profile = service.get_by_user(user.user_id).await?;
    Ok(Json(profile))
}

/// Update the signed-in user's profile
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<Json<Profile>> {
    let service = ProfileService::new(state.db.clone());
    let profile = service.update(user.user_id, input).await?;
    Ok(Json(profile))
}
