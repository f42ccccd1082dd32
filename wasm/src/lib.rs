//! WebAssembly module for the Farm Marketplace
//!
//! Runs the crop price forecaster in the browser so the pricing page can
//! respond to the yield and quality sliders without a server round trip.

use std::sync::OnceLock;

use chrono::NaiveDate;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use shared::{
    build_forecast_summary, format_inr, predict_price, round2, CropCatalog, CropCategory,
    StaticCatalog, SummaryOptions,
};

static CATALOG: OnceLock<StaticCatalog> = OnceLock::new();

fn catalog() -> &'static StaticCatalog {
    CATALOG.get_or_init(StaticCatalog::seed)
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&JsValue::from_str(&format!(
        "Price forecaster ready with {} crops",
        catalog().len()
    )));
}

/// Predict the price of a crop for a 0-based month
#[wasm_bindgen]
pub fn predict_crop_price(
    crop_id: &str,
    yield_per_acre: f64,
    quality: i32,
    month: usize,
) -> Result<f64, JsValue> {
    let crop = catalog()
        .get(crop_id)
        .ok_or_else(|| js_error(format!("Unknown crop: {}", crop_id)))?;
    let price = predict_price(crop, yield_per_acre, quality, month).map_err(js_error)?;
    Ok(round2(price))
}

/// Six-month forecast from the browser's current month, as JSON
#[wasm_bindgen]
pub fn crop_price_forecast(
    crop_id: &str,
    yield_per_acre: f64,
    quality: i32,
    compare_baseline: bool,
) -> Result<String, JsValue> {
    forecast_json(today()?, crop_id, yield_per_acre, quality, compare_baseline)
}

/// Crop reference data as JSON, optionally filtered by category
#[wasm_bindgen]
pub fn list_crops(category: Option<String>) -> Result<String, JsValue> {
    let catalog = catalog();
    let crops = match category.as_deref() {
        Some(raw) => {
            let category: CropCategory = raw.parse().map_err(js_error)?;
            catalog.by_category(category)
        }
        None => catalog.all().iter().collect(),
    };

    let summaries: Vec<CropListing> = crops
        .into_iter()
        .map(|c| CropListing {
            id: &c.id,
            name: &c.name,
            category: c.category,
            current_price: c.current_price,
            base_yield: c.base_yield,
        })
        .collect();

    serde_json::to_string(&summaries).map_err(js_error)
}

/// Format rupees with lakh/crore grouping, e.g. ₹12,34,567.89
#[wasm_bindgen]
pub fn format_indian_rupees(amount: f64, decimals: usize, show_symbol: bool) -> String {
    format_inr(amount, decimals, show_symbol)
}

/// Convert USD to INR at the fixed demonstration rate
#[wasm_bindgen]
pub fn usd_to_inr(usd_amount: f64) -> f64 {
    shared::usd_to_inr(usd_amount)
}

/// Crop fields shown in the crop picker
#[derive(Serialize)]
struct CropListing<'a> {
    id: &'a str,
    name: &'a str,
    category: CropCategory,
    current_price: f64,
    base_yield: f64,
}

fn forecast_json(
    start: NaiveDate,
    crop_id: &str,
    yield_per_acre: f64,
    quality: i32,
    compare_baseline: bool,
) -> Result<String, JsValue> {
    let crop = catalog()
        .get(crop_id)
        .ok_or_else(|| js_error(format!("Unknown crop: {}", crop_id)))?;

    let options = SummaryOptions {
        compare_baseline,
        include_yields: false,
    };
    let summary =
        build_forecast_summary(start, crop, yield_per_acre, quality, options).map_err(js_error)?;

    serde_json::to_string(&summary).map_err(js_error)
}

#[cfg(target_arch = "wasm32")]
fn today() -> Result<NaiveDate, JsValue> {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(now.get_full_year() as i32, now.get_month() + 1, now.get_date())
        .ok_or_else(|| js_error("Browser clock returned an invalid date"))
}

#[cfg(not(target_arch = "wasm32"))]
fn today() -> Result<NaiveDate, JsValue> {
    Ok(chrono::Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_tomatoes_in_july() {
        // Base yield, average quality, peak season
        let price = predict_crop_price("1", 40000.0, 3, 6).unwrap();
        assert_eq!(price, 297.8);
    }

    #[test]
    fn test_forecast_json() {
        let start = NaiveDate::from_ymd_opt(2024, 11, 3).unwrap();
        let json = forecast_json(start, "1", 40000.0, 3, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let forecast = value["forecast"].as_array().unwrap();
        assert_eq!(forecast.len(), 6);
        assert_eq!(forecast[0]["date"], "2024-11-01");
        assert_eq!(forecast[2]["date"], "2025-01-01");
        assert_eq!(value["baseline"].as_array().map(Vec::len), Some(6));
    }

    #[test]
    fn test_list_crops() {
        let all: Vec<serde_json::Value> = serde_json::from_str(&list_crops(None).unwrap()).unwrap();
        assert_eq!(all.len(), 12);

        let fruits: Vec<serde_json::Value> =
            serde_json::from_str(&list_crops(Some("fruit".to_string())).unwrap()).unwrap();
        assert!(fruits.iter().all(|c| c["category"] == "fruit"));
    }

    #[test]
    fn test_currency_helpers() {
        assert_eq!(usd_to_inr(2.99), 248.17);
        assert_eq!(format_indian_rupees(1234567.891, 2, true), "₹12,34,567.89");
    }
}
