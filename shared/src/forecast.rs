//! Crop price forecasting
//!
//! A deterministic formula over a crop's reference data. The predicted price
//! is the current reference price scaled by three independent effects:
//!
//! - yield: relative deviation from the base yield times `yield_impact`
//! - quality: deviation from the average grade (3) times `quality_impact`
//! - season: the month's seasonality weight mapped onto 0.8..=1.2
//!
//! The result is never allowed below half of the current price. That floor
//! is an arbitrary guard, not a derived economic bound.

use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::currency::{round2, round_to};
use crate::models::{CropReference, PricePoint, MONTHS_PER_YEAR};

/// Number of monthly points produced by a forecast
pub const FORECAST_HORIZON_MONTHS: u32 = 6;

/// Predicted prices never fall below this fraction of the current price
pub const PRICE_FLOOR_RATIO: f64 = 0.5;

pub const MIN_QUALITY: i32 = 1;
pub const MAX_QUALITY: i32 = 5;
/// Quality grade at which the quality effect is neutral
pub const AVERAGE_QUALITY: i32 = 3;

/// Seasonal factor at seasonality 0
const SEASONAL_FACTOR_MIN: f64 = 0.8;
/// Spread of the seasonal factor between seasonality 0 and 10
const SEASONAL_FACTOR_SPAN: f64 = 0.4;

/// Rejected forecast inputs
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ForecastError {
    #[error("Base yield must be a positive number, got {0}")]
    InvalidBaseYield(f64),

    #[error("Yield per acre must be a positive number, got {0}")]
    InvalidYield(f64),

    #[error("Quality must be between 1 and 5, got {0}")]
    QualityOutOfRange(i32),

    #[error("Month index must be between 0 and 11, got {0}")]
    MonthOutOfRange(usize),

    #[error("Forecast date is out of range")]
    DateOutOfRange,
}

/// Seasonal price multiplier for a 0-based month, in 0.8..=1.2
pub fn seasonal_factor(crop: &CropReference, month: usize) -> Result<f64, ForecastError> {
    let weight = crop
        .seasonality_for(month)
        .ok_or(ForecastError::MonthOutOfRange(month))?;
    Ok(SEASONAL_FACTOR_MIN + (weight / 10.0) * SEASONAL_FACTOR_SPAN)
}

/// Predict the unit price for a month given the grower's yield and quality
///
/// Inputs are checked before the formula runs: base yield and yield must be
/// positive, quality must be 1-5 and month 0-11.
pub fn predict_price(
    crop: &CropReference,
    yield_per_acre: f64,
    quality: i32,
    month: usize,
) -> Result<f64, ForecastError> {
    check_inputs(crop, yield_per_acre, quality, month)?;
    Ok(predicted_price_unchecked(crop, yield_per_acre, quality, month))
}

/// The pricing formula without input checks
///
/// Callers must guarantee `base_yield > 0` and `month < 12`; an out-of-range
/// month panics on the seasonality lookup.
pub fn predicted_price_unchecked(
    crop: &CropReference,
    yield_per_acre: f64,
    quality: i32,
    month: usize,
) -> f64 {
    let base_price = crop.current_price;

    let yield_diff = (yield_per_acre - crop.base_yield) / crop.base_yield;
    let yield_effect = 1.0 + yield_diff * crop.yield_impact;

    let quality_effect =
        1.0 + (f64::from(quality - AVERAGE_QUALITY) / 2.0) * crop.quality_impact;

    let seasonal =
        SEASONAL_FACTOR_MIN + (crop.seasonality[month] / 10.0) * SEASONAL_FACTOR_SPAN;

    let predicted = base_price * yield_effect * quality_effect * seasonal;

    predicted.max(base_price * PRICE_FLOOR_RATIO)
}

/// Six monthly forecast points starting at the current calendar month
pub fn price_forecast(
    crop: &CropReference,
    yield_per_acre: f64,
    quality: i32,
) -> Result<Vec<PricePoint>, ForecastError> {
    price_forecast_from(Utc::now().date_naive(), crop, yield_per_acre, quality)
}

/// Six monthly forecast points starting at the month containing `start`
///
/// Seasonality wraps from December to January while the dates keep moving
/// forward into the next year. Prices are rounded to two decimals and every
/// point echoes the input yield, which is held constant over the horizon.
pub fn price_forecast_from(
    start: NaiveDate,
    crop: &CropReference,
    yield_per_acre: f64,
    quality: i32,
) -> Result<Vec<PricePoint>, ForecastError> {
    check_inputs(crop, yield_per_acre, quality, 0)?;

    let first = first_of_month(start)?;
    let current_month = start.month0() as usize;

    (0..FORECAST_HORIZON_MONTHS)
        .map(|i| {
            let date = first
                .checked_add_months(Months::new(i))
                .ok_or(ForecastError::DateOutOfRange)?;
            let month = (current_month + i as usize) % MONTHS_PER_YEAR;
            let price = predicted_price_unchecked(crop, yield_per_acre, quality, month);
            Ok(PricePoint::new(date, round2(price), Some(yield_per_acre)))
        })
        .collect()
}

/// Forecast at the crop's base yield and average quality
pub fn baseline_forecast_from(
    start: NaiveDate,
    crop: &CropReference,
) -> Result<Vec<PricePoint>, ForecastError> {
    price_forecast_from(start, crop, crop.base_yield, AVERAGE_QUALITY)
}

/// Percent change from the last historical price to the first forecast price
///
/// Rounded to one decimal. None when either series is empty or the last
/// historical price is zero.
pub fn price_impact_percent(crop: &CropReference, forecast: &[PricePoint]) -> Option<f64> {
    let last_historical = crop.last_historical_price()?;
    let first_forecast = forecast.first()?.price;
    if last_historical == 0.0 {
        return None;
    }
    Some(round_to(
        (first_forecast - last_historical) / last_historical * 100.0,
        1,
    ))
}

/// Range offered to growers for the yield input: 50% to 150% of base yield
pub fn yield_slider_bounds(crop: &CropReference) -> (f64, f64) {
    (crop.base_yield * 0.5, crop.base_yield * 1.5)
}

/// Everything the pricing view needs for one crop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub crop_id: String,
    pub crop_name: String,
    pub yield_per_acre: f64,
    pub quality: i32,
    pub history: Vec<PricePoint>,
    pub forecast: Vec<PricePoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Vec<PricePoint>>,
    pub price_impact_percent: Option<f64>,
    pub yield_bounds: (f64, f64),
}

/// Options for [`build_forecast_summary`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryOptions {
    /// Also compute the base-yield, average-quality series
    pub compare_baseline: bool,
    /// Keep historical yields; only farmers are shown them
    pub include_yields: bool,
}

/// Assemble history, forecast and optional baseline for a crop
pub fn build_forecast_summary(
    start: NaiveDate,
    crop: &CropReference,
    yield_per_acre: f64,
    quality: i32,
    options: SummaryOptions,
) -> Result<ForecastSummary, ForecastError> {
    let forecast = price_forecast_from(start, crop, yield_per_acre, quality)?;
    let baseline = if options.compare_baseline {
        Some(baseline_forecast_from(start, crop)?)
    } else {
        None
    };

    let history = crop
        .price_history
        .iter()
        .map(|p| PricePoint {
            r#yield: if options.include_yields { p.r#yield } else { None },
            ..p.clone()
        })
        .collect();

    Ok(ForecastSummary {
        crop_id: crop.id.clone(),
        crop_name: crop.name.clone(),
        yield_per_acre,
        quality,
        history,
        price_impact_percent: price_impact_percent(crop, &forecast),
        forecast,
        baseline,
        yield_bounds: yield_slider_bounds(crop),
    })
}

fn check_inputs(
    crop: &CropReference,
    yield_per_acre: f64,
    quality: i32,
    month: usize,
) -> Result<(), ForecastError> {
    if !(crop.base_yield.is_finite() && crop.base_yield > 0.0) {
        return Err(ForecastError::InvalidBaseYield(crop.base_yield));
    }
    if !(yield_per_acre.is_finite() && yield_per_acre > 0.0) {
        return Err(ForecastError::InvalidYield(yield_per_acre));
    }
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        return Err(ForecastError::QualityOutOfRange(quality));
    }
    if month >= MONTHS_PER_YEAR {
        return Err(ForecastError::MonthOutOfRange(month));
    }
    Ok(())
}

fn first_of_month(date: NaiveDate) -> Result<NaiveDate, ForecastError> {
    date.with_day(1).ok_or(ForecastError::DateOutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CropCategory;

    fn tomatoes() -> CropReference {
        CropReference {
            id: "1".to_string(),
            name: "Tomatoes".to_string(),
            category: CropCategory::Vegetable,
            current_price: 248.17,
            base_yield: 40000.0,
            seasonality: [3.0, 3.0, 4.0, 5.0, 7.0, 9.0, 10.0, 9.0, 7.0, 5.0, 4.0, 3.0],
            yield_impact: -0.8,
            quality_impact: 0.3,
            price_history: vec![PricePoint::new(
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                250.0,
                Some(41000.0),
            )],
        }
    }

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 15).unwrap()
    }

    #[test]
    fn test_july_peak_example() {
        let price = predict_price(&tomatoes(), 40000.0, 3, 6).unwrap();
        assert_eq!(round2(price), 297.80);
    }

    #[test]
    fn test_seasonal_factor_range() {
        let mut crop = tomatoes();
        crop.seasonality[0] = 0.0;
        crop.seasonality[1] = 10.0;
        assert!((seasonal_factor(&crop, 0).unwrap() - 0.8).abs() < 1e-12);
        assert!((seasonal_factor(&crop, 1).unwrap() - 1.2).abs() < 1e-12);
        assert_eq!(
            seasonal_factor(&crop, 12),
            Err(ForecastError::MonthOutOfRange(12))
        );
    }

    #[test]
    fn test_floor_applies_to_negative_prediction() {
        // Triple the base yield with an elasticity of -0.8 gives a negative
        // yield effect; the floor takes over.
        let crop = tomatoes();
        let unclamped_effect = 1.0 + 2.0 * crop.yield_impact;
        assert!(unclamped_effect < 0.0);

        let price = predict_price(&crop, 120000.0, 1, 0).unwrap();
        assert_eq!(price, crop.current_price * PRICE_FLOOR_RATIO);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let crop = tomatoes();
        assert_eq!(
            predict_price(&crop, 0.0, 3, 0),
            Err(ForecastError::InvalidYield(0.0))
        );
        assert_eq!(
            predict_price(&crop, 40000.0, 6, 0),
            Err(ForecastError::QualityOutOfRange(6))
        );
        assert_eq!(
            predict_price(&crop, 40000.0, 3, 12),
            Err(ForecastError::MonthOutOfRange(12))
        );

        let mut bad = tomatoes();
        bad.base_yield = 0.0;
        assert_eq!(
            predict_price(&bad, 40000.0, 3, 0),
            Err(ForecastError::InvalidBaseYield(0.0))
        );
    }

    #[test]
    fn test_forecast_wraps_into_next_year() {
        let crop = tomatoes();
        let points = price_forecast_from(date(2024, 10), &crop, 40000.0, 3).unwrap();

        assert_eq!(points.len(), 6);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 10, 1).unwrap());
        assert_eq!(points[2].date, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(points[3].date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(points[5].date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        // January seasonality (3) drives the fourth point
        assert_eq!(points[3].price, round2(248.17 * (0.8 + 0.3 * 0.4)));
    }

    #[test]
    fn test_forecast_echoes_yield() {
        let points = price_forecast_from(date(2024, 3), &tomatoes(), 35000.0, 4).unwrap();
        assert!(points.iter().all(|p| p.r#yield == Some(35000.0)));
    }

    #[test]
    fn test_price_impact_percent() {
        let crop = tomatoes();
        let forecast = vec![PricePoint::new(date(2024, 6), 275.0, None)];
        assert_eq!(price_impact_percent(&crop, &forecast), Some(10.0));
        assert_eq!(price_impact_percent(&crop, &[]), None);
    }

    #[test]
    fn test_summary_hides_yields_from_consumers() {
        let crop = tomatoes();
        let summary = build_forecast_summary(
            date(2024, 6),
            &crop,
            40000.0,
            3,
            SummaryOptions {
                compare_baseline: true,
                include_yields: false,
            },
        )
        .unwrap();

        assert!(summary.history.iter().all(|p| p.r#yield.is_none()));
        assert_eq!(summary.baseline.as_ref().map(Vec::len), Some(6));
        assert_eq!(summary.yield_bounds, (20000.0, 60000.0));
    }
}
