//! Crop reference catalog
//!
//! The forecaster reads crops through [`CropCatalog`] so tests and other
//! deployments can supply their own fixtures. [`StaticCatalog::seed`] holds
//! the twelve demonstration crops with a synthetic year of price history.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use chrono::{Datelike, Months, NaiveDate, Utc};
use rand::Rng;
use thiserror::Error;

use crate::currency::{round2, usd_to_inr};
use crate::models::{CropCategory, CropReference, PricePoint, MONTHS_PER_YEAR};

/// Base yield used for crops missing from the lookup table (kg/acre)
pub const DEFAULT_BASE_YIELD: f64 = 25000.0;

/// Volatility is capped below 1 so generated prices stay positive
const MAX_VOLATILITY: f64 = 0.95;

/// Historical yields vary by up to this fraction around the base yield
const YIELD_VARIATION: f64 = 0.15;

/// Smallest generated monthly price, one US cent
const MIN_PRICE_USD: f64 = 0.01;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Invalid crop {id}: {reason}")]
    InvalidCrop { id: String, reason: &'static str },

    #[error("Duplicate crop id: {0}")]
    DuplicateId(String),
}

/// Read-only source of crop reference data
pub trait CropCatalog: Send + Sync {
    /// All crops in catalog order
    fn all(&self) -> &[CropReference];

    /// Look up a crop by id
    fn get(&self, id: &str) -> Option<&CropReference> {
        self.all().iter().find(|c| c.id == id)
    }

    fn by_category(&self, category: CropCategory) -> Vec<&CropReference> {
        self.all()
            .iter()
            .filter(|c| c.category == category)
            .collect()
    }

    /// Distinct categories present, sorted
    fn categories(&self) -> Vec<CropCategory> {
        let mut categories: Vec<CropCategory> = self.all().iter().map(|c| c.category).collect();
        categories.sort();
        categories.dedup();
        categories
    }
}

/// In-memory catalog built once at start-up
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    crops: Vec<CropReference>,
    index: BTreeMap<String, usize>,
}

impl StaticCatalog {
    /// Build a catalog from caller-supplied crops, validating each one
    pub fn from_crops(crops: Vec<CropReference>) -> Result<Self, CatalogError> {
        let mut index = BTreeMap::new();
        for (pos, crop) in crops.iter().enumerate() {
            crop.validate().map_err(|reason| CatalogError::InvalidCrop {
                id: crop.id.clone(),
                reason,
            })?;
            if index.insert(crop.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateId(crop.id.clone()));
            }
        }
        Ok(Self { crops, index })
    }

    /// The demonstration catalog with freshly generated price histories
    pub fn seed() -> Self {
        let crops: Vec<CropReference> = SEED_CROPS.iter().map(SeedCrop::build).collect();
        let index = crops
            .iter()
            .enumerate()
            .map(|(pos, c)| (c.id.clone(), pos))
            .collect();
        Self { crops, index }
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

impl CropCatalog for StaticCatalog {
    fn all(&self) -> &[CropReference] {
        &self.crops
    }

    fn get(&self, id: &str) -> Option<&CropReference> {
        self.index.get(id).and_then(|&pos| self.crops.get(pos))
    }
}

/// Reference yield for a known crop name, or [`DEFAULT_BASE_YIELD`]
pub fn base_yield_for_crop(name: &str) -> f64 {
    SEED_CROPS
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.base_yield)
        .unwrap_or(DEFAULT_BASE_YIELD)
}

/// Synthetic trailing-year price history, oldest month first
///
/// Each month's USD price is the base price times a uniform random factor in
/// `1 ± volatility` and a sinusoidal seasonal factor, then converted to INR.
/// Monthly USD prices are floored at one cent, so every point stays positive.
/// Yields vary ±15% around the crop's base yield. Output is random; only its
/// shape is stable.
pub fn generate_price_history(crop_name: &str, base_price_usd: f64, volatility: f64) -> Vec<PricePoint> {
    generate_price_history_with(
        &mut rand::thread_rng(),
        Utc::now().date_naive(),
        crop_name,
        base_price_usd,
        volatility,
    )
}

/// [`generate_price_history`] with an explicit RNG and reference date
pub fn generate_price_history_with<R: Rng>(
    rng: &mut R,
    today: NaiveDate,
    crop_name: &str,
    base_price_usd: f64,
    volatility: f64,
) -> Vec<PricePoint> {
    let volatility = volatility.abs().min(MAX_VOLATILITY);
    let base_yield = base_yield_for_crop(crop_name);
    let Some(this_month) = today.with_day(1) else {
        return Vec::new();
    };

    (0..MONTHS_PER_YEAR as u32)
        .rev()
        .filter_map(|back| this_month.checked_sub_months(Months::new(back)))
        .map(|date| {
            let random_factor = 1.0 + rng.gen_range(-volatility..=volatility);
            let seasonal_factor = 1.0 + 0.2 * ((date.month0() + 1) as f64 * PI / 6.0).sin();
            let yield_variation = 1.0 + rng.gen_range(-YIELD_VARIATION..=YIELD_VARIATION);

            let usd = round2(base_price_usd * random_factor * seasonal_factor).max(MIN_PRICE_USD);
            PricePoint::new(
                date,
                usd_to_inr(usd),
                Some((base_yield * yield_variation).round()),
            )
        })
        .collect()
}

struct SeedCrop {
    id: &'static str,
    name: &'static str,
    category: CropCategory,
    price_usd: f64,
    base_yield: f64,
    volatility: f64,
    seasonality: [f64; MONTHS_PER_YEAR],
    yield_impact: f64,
    quality_impact: f64,
}

impl SeedCrop {
    fn build(&self) -> CropReference {
        CropReference {
            id: self.id.to_string(),
            name: self.name.to_string(),
            category: self.category,
            current_price: usd_to_inr(self.price_usd),
            base_yield: self.base_yield,
            seasonality: self.seasonality,
            yield_impact: self.yield_impact,
            quality_impact: self.quality_impact,
            price_history: generate_price_history(self.name, self.price_usd, self.volatility),
        }
    }
}

const SEED_CROPS: [SeedCrop; 12] = [
    SeedCrop {
        id: "1",
        name: "Tomatoes",
        category: CropCategory::Vegetable,
        price_usd: 2.99,
        base_yield: 40000.0,
        volatility: 0.2,
        // summer peak
        seasonality: [3.0, 3.0, 4.0, 5.0, 7.0, 9.0, 10.0, 9.0, 7.0, 5.0, 4.0, 3.0],
        yield_impact: -0.8,
        quality_impact: 0.3,
    },
    SeedCrop {
        id: "2",
        name: "Potatoes",
        category: CropCategory::Vegetable,
        price_usd: 0.99,
        base_yield: 25000.0,
        volatility: 0.1,
        // winter peak
        seasonality: [8.0, 7.0, 6.0, 5.0, 4.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 9.0],
        yield_impact: -0.4,
        quality_impact: 0.2,
    },
    SeedCrop {
        id: "3",
        name: "Lettuce",
        category: CropCategory::Vegetable,
        price_usd: 1.79,
        base_yield: 30000.0,
        volatility: 0.25,
        seasonality: [6.0, 7.0, 8.0, 9.0, 10.0, 9.0, 8.0, 8.0, 7.0, 6.0, 5.0, 5.0],
        yield_impact: -0.7,
        quality_impact: 0.4,
    },
    SeedCrop {
        id: "4",
        name: "Carrots",
        category: CropCategory::Vegetable,
        price_usd: 1.29,
        base_yield: 35000.0,
        volatility: 0.15,
        seasonality: [7.0, 8.0, 8.0, 7.0, 6.0, 5.0, 4.0, 5.0, 6.0, 7.0, 8.0, 8.0],
        yield_impact: -0.5,
        quality_impact: 0.25,
    },
    SeedCrop {
        id: "5",
        name: "Spinach",
        category: CropCategory::Vegetable,
        price_usd: 2.49,
        base_yield: 15000.0,
        volatility: 0.2,
        // spring and autumn peaks
        seasonality: [6.0, 7.0, 8.0, 9.0, 8.0, 6.0, 4.0, 5.0, 7.0, 8.0, 7.0, 6.0],
        yield_impact: -0.6,
        quality_impact: 0.35,
    },
    SeedCrop {
        id: "6",
        name: "Onions",
        category: CropCategory::Vegetable,
        price_usd: 0.89,
        base_yield: 45000.0,
        volatility: 0.1,
        seasonality: [6.0, 6.0, 7.0, 7.0, 8.0, 9.0, 8.0, 7.0, 6.0, 5.0, 5.0, 6.0],
        yield_impact: -0.3,
        quality_impact: 0.15,
    },
    SeedCrop {
        id: "7",
        name: "Apples",
        category: CropCategory::Fruit,
        price_usd: 1.99,
        base_yield: 20000.0,
        volatility: 0.15,
        // autumn harvest
        seasonality: [4.0, 3.0, 3.0, 3.0, 4.0, 5.0, 6.0, 7.0, 9.0, 10.0, 8.0, 6.0],
        yield_impact: -0.6,
        quality_impact: 0.4,
    },
    SeedCrop {
        id: "8",
        name: "Oranges",
        category: CropCategory::Fruit,
        price_usd: 1.49,
        base_yield: 25000.0,
        volatility: 0.2,
        seasonality: [9.0, 10.0, 8.0, 7.0, 5.0, 4.0, 3.0, 3.0, 4.0, 5.0, 7.0, 8.0],
        yield_impact: -0.5,
        quality_impact: 0.3,
    },
    SeedCrop {
        id: "9",
        name: "Strawberries",
        category: CropCategory::Fruit,
        price_usd: 3.99,
        base_yield: 15000.0,
        volatility: 0.3,
        seasonality: [3.0, 3.0, 4.0, 6.0, 9.0, 10.0, 8.0, 6.0, 4.0, 3.0, 3.0, 3.0],
        yield_impact: -0.9,
        quality_impact: 0.5,
    },
    SeedCrop {
        id: "10",
        name: "Grapes",
        category: CropCategory::Fruit,
        price_usd: 2.99,
        base_yield: 12000.0,
        volatility: 0.2,
        seasonality: [3.0, 3.0, 3.0, 4.0, 5.0, 6.0, 7.0, 9.0, 10.0, 8.0, 5.0, 3.0],
        yield_impact: -0.7,
        quality_impact: 0.4,
    },
    SeedCrop {
        id: "11",
        name: "Bananas",
        category: CropCategory::Fruit,
        price_usd: 0.69,
        base_yield: 35000.0,
        volatility: 0.1,
        // year-round
        seasonality: [7.0, 7.0, 7.0, 7.0, 7.0, 8.0, 8.0, 8.0, 8.0, 7.0, 7.0, 7.0],
        yield_impact: -0.4,
        quality_impact: 0.2,
    },
    SeedCrop {
        id: "12",
        name: "Mangoes",
        category: CropCategory::Fruit,
        price_usd: 2.49,
        base_yield: 18000.0,
        volatility: 0.25,
        seasonality: [3.0, 3.0, 4.0, 5.0, 7.0, 9.0, 10.0, 8.0, 6.0, 4.0, 3.0, 3.0],
        yield_impact: -0.6,
        quality_impact: 0.35,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_seed_catalog_is_valid() {
        let catalog = StaticCatalog::seed();
        assert_eq!(catalog.len(), 12);
        for crop in catalog.all() {
            assert!(crop.validate().is_ok(), "{} failed validation", crop.name);
            assert_eq!(crop.price_history.len(), 12);
        }
    }

    #[test]
    fn test_seed_prices_are_converted() {
        let catalog = StaticCatalog::seed();
        let tomatoes = catalog.get("1").unwrap();
        assert_eq!(tomatoes.name, "Tomatoes");
        assert_eq!(tomatoes.current_price, 248.17);
    }

    #[test]
    fn test_category_lookup() {
        let catalog = StaticCatalog::seed();
        assert_eq!(catalog.by_category(CropCategory::Fruit).len(), 6);
        assert_eq!(catalog.by_category(CropCategory::Vegetable).len(), 6);
        assert_eq!(
            catalog.categories(),
            vec![CropCategory::Fruit, CropCategory::Vegetable]
        );
        assert!(catalog.get("99").is_none());
    }

    #[test]
    fn test_base_yield_lookup() {
        assert_eq!(base_yield_for_crop("Grapes"), 12000.0);
        assert_eq!(base_yield_for_crop("Durian"), DEFAULT_BASE_YIELD);
    }

    #[test]
    fn test_history_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let history = generate_price_history_with(&mut rng, today, "Tomatoes", 2.99, 0.2);

        assert_eq!(history.len(), 12);
        assert_eq!(history[0].date, NaiveDate::from_ymd_opt(2023, 4, 1).unwrap());
        assert_eq!(history[11].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(history.windows(2).all(|w| w[0].date < w[1].date));
        assert!(history.iter().all(|p| p.price > 0.0));
        for point in &history {
            let y = point.r#yield.unwrap();
            assert!((34000.0..=46000.0).contains(&y));
        }
    }

    #[test]
    fn test_extreme_volatility_stays_positive() {
        let mut rng = StdRng::seed_from_u64(11);
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let history = generate_price_history_with(&mut rng, today, "Onions", 0.89, 5.0);
        assert!(history.iter().all(|p| p.price > 0.0));
    }

    #[test]
    fn test_tiny_base_price_stays_positive() {
        let mut rng = StdRng::seed_from_u64(3);
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let history = generate_price_history_with(&mut rng, today, "Tomatoes", 0.01, 0.95);

        assert_eq!(history.len(), 12);
        // one cent at the fixed rate
        assert!(history.iter().all(|p| p.price >= 0.83), "{:?}", history);
    }

    #[test]
    fn test_fixture_catalog_rejects_bad_crops() {
        let mut crop = StaticCatalog::seed().all()[0].clone();
        crop.base_yield = -1.0;
        let err = StaticCatalog::from_crops(vec![crop]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCrop { .. }));

        let crop = StaticCatalog::seed().all()[0].clone();
        let err = StaticCatalog::from_crops(vec![crop.clone(), crop]).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateId("1".to_string()));
    }
}
