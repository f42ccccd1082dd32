//! Crop price prediction service
//!
//! Serves the crop catalog and runs the forecaster. Nothing here touches the
//! database; the catalog is shared read-only across requests.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::config::ForecastConfig;
use crate::error::{AppError, AppResult};
use shared::{
    build_forecast_summary, is_typical_yield, predict_price, validate_quality,
    validate_yield_per_acre, yield_slider_bounds, CropCatalog, CropCategory, CropReference,
    ForecastSummary, PricePoint, SummaryOptions,
};

/// Prediction service
#[derive(Clone)]
pub struct PredictionService {
    catalog: Arc<dyn CropCatalog>,
    config: ForecastConfig,
}

/// Parameters shared by the single-price and forecast operations
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionParams {
    /// Defaults to the crop's base yield
    pub yield_per_acre: Option<f64>,
    /// Defaults to the configured quality grade
    pub quality: Option<i32>,
}

/// A single predicted price
#[derive(Debug, Serialize)]
pub struct PricePrediction {
    pub crop_id: String,
    pub crop_name: String,
    pub month: usize,
    pub yield_per_acre: f64,
    pub quality: i32,
    pub current_price: f64,
    pub predicted_price: f64,
}

/// One row of the CSV export
#[derive(Debug, Serialize)]
struct ExportRow {
    date: NaiveDate,
    series: &'static str,
    price: f64,
    #[serde(rename = "yield")]
    yield_per_acre: Option<f64>,
}

impl PredictionService {
    pub fn new(catalog: Arc<dyn CropCatalog>, config: ForecastConfig) -> Self {
        Self { catalog, config }
    }

    /// List crops, optionally within one category
    pub fn list_crops(
        &self,
        category: Option<&str>,
        include_yields: bool,
    ) -> AppResult<Vec<CropReference>> {
        let crops = match category {
            Some(raw) => {
                let category: CropCategory = raw
                    .parse()
                    .map_err(|msg: &str| AppError::validation("category", msg))?;
                self.catalog.by_category(category)
            }
            None => self.catalog.all().iter().collect(),
        };

        Ok(crops
            .into_iter()
            .map(|crop| crop_view(crop, include_yields))
            .collect())
    }

    /// Get a crop's reference data
    pub fn get_crop(&self, crop_id: &str, include_yields: bool) -> AppResult<CropReference> {
        self.crop(crop_id).map(|crop| crop_view(crop, include_yields))
    }

    /// Predict the price for one month, defaulting to the current month
    pub fn predict(
        &self,
        crop_id: &str,
        params: PredictionParams,
        month: Option<usize>,
    ) -> AppResult<PricePrediction> {
        let crop = self.crop(crop_id)?;
        let (yield_per_acre, quality) = self.resolve_params(crop, params)?;
        let month = month.unwrap_or_else(|| Utc::now().month0() as usize);

        let predicted_price = predict_price(crop, yield_per_acre, quality, month)?;

        Ok(PricePrediction {
            crop_id: crop.id.clone(),
            crop_name: crop.name.clone(),
            month,
            yield_per_acre,
            quality,
            current_price: crop.current_price,
            predicted_price: shared::round2(predicted_price),
        })
    }

    /// Six-month forecast starting this month
    pub fn forecast(
        &self,
        crop_id: &str,
        params: PredictionParams,
        options: SummaryOptions,
    ) -> AppResult<ForecastSummary> {
        self.forecast_from(Utc::now().date_naive(), crop_id, params, options)
    }

    pub fn forecast_from(
        &self,
        start: NaiveDate,
        crop_id: &str,
        params: PredictionParams,
        options: SummaryOptions,
    ) -> AppResult<ForecastSummary> {
        let crop = self.crop(crop_id)?;
        let (yield_per_acre, quality) = self.resolve_params(crop, params)?;

        let summary = build_forecast_summary(start, crop, yield_per_acre, quality, options)?;

        tracing::debug!(
            crop = %crop.name,
            yield_per_acre,
            quality,
            baseline = options.compare_baseline,
            "Forecast computed"
        );

        Ok(summary)
    }

    /// History followed by forecast as CSV
    pub fn export_csv(
        &self,
        crop_id: &str,
        params: PredictionParams,
        include_yields: bool,
    ) -> AppResult<String> {
        let options = SummaryOptions {
            compare_baseline: false,
            include_yields,
        };
        let summary = self.forecast(crop_id, params, options)?;
        forecast_to_csv(&summary)
    }

    fn crop(&self, crop_id: &str) -> AppResult<&CropReference> {
        self.catalog
            .get(crop_id)
            .ok_or_else(|| AppError::NotFound("Crop".to_string()))
    }

    fn resolve_params(
        &self,
        crop: &CropReference,
        params: PredictionParams,
    ) -> AppResult<(f64, i32)> {
        let yield_per_acre = params.yield_per_acre.unwrap_or(crop.base_yield);
        let quality = params.quality.unwrap_or(self.config.default_quality);

        validate_yield_per_acre(yield_per_acre)
            .map_err(|msg| AppError::validation("yield_per_acre", msg))?;
        validate_quality(quality).map_err(|msg| AppError::validation("quality", msg))?;

        if self.config.enforce_yield_bounds && !is_typical_yield(yield_per_acre, crop.base_yield) {
            let (low, high) = yield_slider_bounds(crop);
            return Err(AppError::validation(
                "yield_per_acre",
                format!("Yield must be between {:.0} and {:.0} kg/acre", low, high),
            ));
        }

        Ok((yield_per_acre, quality))
    }
}

/// Serialize a forecast summary's history and forecast series as CSV
pub fn forecast_to_csv(summary: &ForecastSummary) -> AppResult<String> {
    let rows = summary
        .history
        .iter()
        .map(|p| export_row("history", p))
        .chain(summary.forecast.iter().map(|p| export_row("forecast", p)));

    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

fn export_row(series: &'static str, point: &PricePoint) -> ExportRow {
    ExportRow {
        date: point.date,
        series,
        price: point.price,
        yield_per_acre: point.r#yield,
    }
}

/// Historical yields are only shown to farmers
fn crop_view(crop: &CropReference, include_yields: bool) -> CropReference {
    let mut crop = crop.clone();
    if !include_yields {
        for point in &mut crop.price_history {
            point.r#yield = None;
        }
    }
    crop
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::StaticCatalog;

    fn service(enforce_yield_bounds: bool) -> PredictionService {
        PredictionService::new(
            Arc::new(StaticCatalog::seed()),
            ForecastConfig {
                default_quality: 3,
                enforce_yield_bounds,
            },
        )
    }

    fn july() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }

    #[test]
    fn test_list_crops_by_category() {
        let svc = service(false);
        assert_eq!(svc.list_crops(None, false).unwrap().len(), 12);

        let fruits = svc.list_crops(Some("fruits"), false).unwrap();
        assert_eq!(fruits.len(), 6);
        assert!(fruits.iter().all(|c| c.category == CropCategory::Fruit));

        assert!(svc.list_crops(Some("grains"), false).is_err());
    }

    #[test]
    fn test_yields_hidden_unless_requested() {
        let svc = service(false);
        let public = svc.get_crop("1", false).unwrap();
        assert!(public.price_history.iter().all(|p| p.r#yield.is_none()));

        let farmer = svc.get_crop("1", true).unwrap();
        assert!(farmer.price_history.iter().all(|p| p.r#yield.is_some()));
    }

    #[test]
    fn test_unknown_crop() {
        let svc = service(false);
        assert!(matches!(svc.get_crop("99", false), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_defaults_give_seasonal_price() {
        let svc = service(false);
        let prediction = svc.predict("1", PredictionParams::default(), Some(6)).unwrap();

        // Tomatoes peak in July: seasonality 10 gives factor 1.2
        let expected = shared::round2(prediction.current_price * 1.2);
        assert_eq!(prediction.predicted_price, expected);
        assert_eq!(prediction.quality, 3);
    }

    #[test]
    fn test_yield_bounds_enforced_when_configured() {
        let params = PredictionParams {
            yield_per_acre: Some(1000.0),
            quality: Some(3),
        };
        assert!(service(false).predict("1", params, Some(0)).is_ok());
        assert!(matches!(
            service(true).predict("1", params, Some(0)),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_quality_out_of_range_rejected() {
        let params = PredictionParams {
            yield_per_acre: None,
            quality: Some(6),
        };
        assert!(service(false).predict("1", params, Some(0)).is_err());
    }

    #[test]
    fn test_forecast_with_baseline() {
        let svc = service(false);
        let options = SummaryOptions {
            compare_baseline: true,
            include_yields: false,
        };
        let summary = svc
            .forecast_from(july(), "1", PredictionParams::default(), options)
            .unwrap();

        assert_eq!(summary.forecast.len(), 6);
        assert_eq!(summary.baseline.as_ref(), Some(&summary.forecast));
    }

    #[test]
    fn test_csv_export() {
        let svc = service(false);
        let summary = svc
            .forecast_from(july(), "1", PredictionParams::default(), SummaryOptions::default())
            .unwrap();
        let csv = forecast_to_csv(&summary).unwrap();

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("date,series,price,yield"));
        assert_eq!(csv.lines().count(), 1 + 12 + 6);
        assert!(csv.contains("2024-07-01,forecast,"));
        assert!(csv.lines().filter(|l| l.contains(",history,")).all(|l| l.ends_with(',')));
    }
}
