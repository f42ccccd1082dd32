//! Crop price prediction handlers

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::MaybeUser;
use crate::services::prediction::{PredictionParams, PricePrediction};
use crate::services::PredictionService;
use crate::AppState;
use shared::{CropReference, ForecastSummary, SummaryOptions};

#[derive(Debug, Deserialize)]
pub struct CropListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub yield_per_acre: Option<f64>,
    pub quality: Option<i32>,
    /// 0-based month; defaults to the current month
    pub month: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub yield_per_acre: Option<f64>,
    pub quality: Option<i32>,
    #[serde(default)]
    pub compare: bool,
}

impl ForecastQuery {
    fn params(&self) -> PredictionParams {
        PredictionParams {
            yield_per_acre: self.yield_per_acre,
            quality: self.quality,
        }
    }
}

fn prediction_service(state: &AppState) -> PredictionService {
    PredictionService::new(state.catalog.clone(), state.config.forecast.clone())
}

fn is_farmer(user: &MaybeUser) -> bool {
    user.0.as_ref().is_some_and(|u| u.is_farmer())
}

/// List crops available for prediction
pub async fn list_crops(
    State(state): State<AppState>,
    user: MaybeUser,
    Query(query): Query<CropListQuery>,
) -> AppResult<Json<Vec<CropReference>>> {
    let crops = prediction_service(&state).list_crops(query.category.as_deref(), is_farmer(&user))?;
    Ok(Json(crops))
}

/// Get one crop's reference data and history
pub async fn get_crop(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(crop_id): Path<String>,
) -> AppResult<Json<CropReference>> {
    let crop = prediction_service(&state).get_crop(&crop_id, is_farmer(&user))?;
    Ok(Json(crop))
}

/// Predict a single month's price
pub async fn predict_price(
    State(state): State<AppState>,
    Path(crop_id): Path<String>,
    Query(query): Query<PriceQuery>,
) -> AppResult<Json<PricePrediction>> {
    let params = PredictionParams {
        yield_per_acre: query.yield_per_acre,
        quality: query.quality,
    };
    let prediction = prediction_service(&state).predict(&crop_id, params, query.month)?;
    Ok(Json(prediction))
}

/// Six-month forecast; farmers also receive historical yields
pub async fn forecast(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(crop_id): Path<String>,
    Query(query): Query<ForecastQuery>,
) -> AppResult<Json<ForecastSummary>> {
    let options = SummaryOptions {
        compare_baseline: query.compare,
        include_yields: is_farmer(&user),
    };
    let summary = prediction_service(&state).forecast(&crop_id, query.params(), options)?;
    Ok(Json(summary))
}

/// History and forecast as a CSV download
pub async fn export_forecast(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(crop_id): Path<String>,
    Query(query): Query<ForecastQuery>,
) -> AppResult<impl IntoResponse> {
    let csv = prediction_service(&state).export_csv(&crop_id, query.params(), is_farmer(&user))?;
    let disposition = format!("attachment; filename=\"crop_{}_forecast.csv\"", crop_id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
