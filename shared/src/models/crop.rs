//! Crop reference models used by the price forecaster

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of calendar months covered by a seasonality profile
pub const MONTHS_PER_YEAR: usize = 12;

/// Produce category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CropCategory {
    Fruit,
    Vegetable,
}

impl CropCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropCategory::Fruit => "fruit",
            CropCategory::Vegetable => "vegetable",
        }
    }
}

impl std::fmt::Display for CropCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CropCategory {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fruit" | "fruits" => Ok(CropCategory::Fruit),
            "vegetable" | "vegetables" => Ok(CropCategory::Vegetable),
            _ => Err("Unknown crop category"),
        }
    }
}

/// A single monthly price observation or forecast
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    /// First day of the month this point describes
    pub date: NaiveDate,
    /// Unit price in INR
    pub price: f64,
    /// Yield in kg per acre
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#yield: Option<f64>,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64, r#yield: Option<f64>) -> Self {
        Self {
            date,
            price,
            r#yield,
        }
    }
}

/// Static reference data for one crop
///
/// Values are seed data: built once when the catalog is constructed and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropReference {
    pub id: String,
    pub name: String,
    pub category: CropCategory,
    /// Current reference unit price in INR
    pub current_price: f64,
    /// Reference yield in kg per acre
    pub base_yield: f64,
    /// Demand weighting per calendar month (Jan..Dec), 0 (lowest) to 10 (peak)
    pub seasonality: [f64; MONTHS_PER_YEAR],
    /// Price elasticity to relative yield deviation, usually negative
    pub yield_impact: f64,
    /// Price elasticity to quality deviation from the midpoint, usually positive
    pub quality_impact: f64,
    /// Trailing twelve months of prices, oldest first
    pub price_history: Vec<PricePoint>,
}

impl CropReference {
    /// Seasonality weight for a 0-based month index
    pub fn seasonality_for(&self, month: usize) -> Option<f64> {
        self.seasonality.get(month).copied()
    }

    /// Most recent historical price, if any history is present
    pub fn last_historical_price(&self) -> Option<f64> {
        self.price_history.last().map(|p| p.price)
    }

    /// Check that the reference data satisfies the forecaster's preconditions
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.current_price.is_finite() && self.current_price > 0.0) {
            return Err("Current price must be a positive number");
        }
        if !(self.base_yield.is_finite() && self.base_yield > 0.0) {
            return Err("Base yield must be a positive number");
        }
        if !self.yield_impact.is_finite() || !self.quality_impact.is_finite() {
            return Err("Yield and quality impact must be finite");
        }
        if self
            .seasonality
            .iter()
            .any(|s| !s.is_finite() || *s < 0.0 || *s > 10.0)
        {
            return Err("Seasonality values must be between 0 and 10");
        }
        if self.price_history.windows(2).any(|w| w[0].date >= w[1].date) {
            return Err("Price history must be in chronological order");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crop() -> CropReference {
        CropReference {
            id: "1".to_string(),
            name: "Tomatoes".to_string(),
            category: CropCategory::Vegetable,
            current_price: 248.17,
            base_yield: 40000.0,
            seasonality: [3.0, 3.0, 4.0, 5.0, 7.0, 9.0, 10.0, 9.0, 7.0, 5.0, 4.0, 3.0],
            yield_impact: -0.8,
            quality_impact: 0.3,
            price_history: vec![],
        }
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("fruit".parse::<CropCategory>(), Ok(CropCategory::Fruit));
        assert_eq!("Vegetables".parse::<CropCategory>(), Ok(CropCategory::Vegetable));
        assert!("grain".parse::<CropCategory>().is_err());
    }

    #[test]
    fn test_valid_crop() {
        assert!(crop().validate().is_ok());
    }

    #[test]
    fn test_invalid_crop_values() {
        let mut c = crop();
        c.base_yield = 0.0;
        assert!(c.validate().is_err());

        let mut c = crop();
        c.seasonality[3] = 11.0;
        assert!(c.validate().is_err());

        let mut c = crop();
        c.quality_impact = f64::NAN;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_unordered_history_rejected() {
        let mut c = crop();
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        c.price_history = vec![PricePoint::new(feb, 10.0, None), PricePoint::new(jan, 11.0, None)];
        assert!(c.validate().is_err());
    }
}
