//! Crop price forecast tests
//!
//! Property-based and unit tests for the pricing formula, the six-month
//! forecast series and the seed catalog.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use shared::{
    generate_price_history, predict_price, price_forecast_from, round2, seasonal_factor,
    CropCatalog, CropCategory, CropReference, StaticCatalog, FORECAST_HORIZON_MONTHS,
    PRICE_FLOOR_RATIO,
};

/// Tomatoes with fixed reference values
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
        price_history: vec![],
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

// ============================================================================
// Property Test Strategies
// ============================================================================

fn quality_strategy() -> impl Strategy<Value = i32> {
    1i32..=5
}

fn month_strategy() -> impl Strategy<Value = usize> {
    0usize..12
}

fn seasonality_strategy() -> impl Strategy<Value = [f64; 12]> {
    prop::array::uniform12(0.0f64..=10.0)
}

/// Crops with arbitrary, possibly extreme, elasticities
fn crop_strategy() -> impl Strategy<Value = CropReference> {
    (
        1.0f64..5000.0,
        100.0f64..100_000.0,
        -5.0f64..5.0,
        -5.0f64..5.0,
        seasonality_strategy(),
    )
        .prop_map(
            |(current_price, base_yield, yield_impact, quality_impact, seasonality)| {
                CropReference {
                    current_price,
                    base_yield,
                    yield_impact,
                    quality_impact,
                    seasonality,
                    ..tomatoes()
                }
            },
        )
}

fn start_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    /// At the base yield and average quality only the season moves the price
    #[test]
    fn baseline_inputs_give_seasonal_price(
        crop in crop_strategy(),
        month in month_strategy(),
    ) {
        let price = predict_price(&crop, crop.base_yield, 3, month).unwrap();
        let expected = crop.current_price * seasonal_factor(&crop, month).unwrap();
        prop_assert!(close(price, expected), "{} != {}", price, expected);
    }

    /// The price never drops below half the current price
    #[test]
    fn price_never_below_floor(
        crop in crop_strategy(),
        yield_per_acre in 1.0f64..1_000_000.0,
        quality in quality_strategy(),
        month in month_strategy(),
    ) {
        let price = predict_price(&crop, yield_per_acre, quality, month).unwrap();
        prop_assert!(price >= crop.current_price * PRICE_FLOOR_RATIO);
    }

    /// Seasonal factor stays within 0.8..=1.2
    #[test]
    fn seasonal_factor_in_range(
        crop in crop_strategy(),
        month in month_strategy(),
    ) {
        let factor = seasonal_factor(&crop, month).unwrap();
        prop_assert!((0.8..=1.2 + 1e-12).contains(&factor));
    }

    /// Six consecutive months, one per calendar month, echoing the yield
    #[test]
    fn forecast_has_six_consecutive_months(
        start in start_date_strategy(),
        yield_per_acre in 1.0f64..200_000.0,
        quality in quality_strategy(),
    ) {
        let forecast = price_forecast_from(start, &tomatoes(), yield_per_acre, quality).unwrap();

        prop_assert_eq!(forecast.len(), FORECAST_HORIZON_MONTHS as usize);
        prop_assert_eq!(forecast[0].date.month(), start.month());
        prop_assert_eq!(forecast[0].date.year(), start.year());

        for pair in forecast.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
            let months_apart = (pair[1].date.year() - pair[0].date.year()) * 12
                + pair[1].date.month() as i32
                - pair[0].date.month() as i32;
            prop_assert_eq!(months_apart, 1);
        }
        for point in &forecast {
            prop_assert_eq!(point.date.day(), 1);
            prop_assert_eq!(point.r#yield, Some(yield_per_acre));
            prop_assert_eq!(point.price, round2(point.price));
        }
    }

    /// With negative yield impact, more yield never raises the price and
    /// strictly lowers it until the floor is reached
    #[test]
    fn higher_yield_lowers_price_until_floor(
        y1 in 1.0f64..150_000.0,
        delta in 1.0f64..50_000.0,
        quality in quality_strategy(),
        month in month_strategy(),
    ) {
        let crop = tomatoes();
        let y2 = y1 + delta;
        let p1 = predict_price(&crop, y1, quality, month).unwrap();
        let p2 = predict_price(&crop, y2, quality, month).unwrap();
        let floor = crop.current_price * PRICE_FLOOR_RATIO;

        prop_assert!(p2 <= p1);
        if p2 > floor {
            prop_assert!(p2 < p1);
        } else {
            prop_assert_eq!(p2, floor);
        }
    }

    /// With positive quality impact, better quality never lowers the price
    #[test]
    fn better_quality_never_lowers_price(
        yield_per_acre in 1.0f64..200_000.0,
        q1 in quality_strategy(),
        q2 in quality_strategy(),
        month in month_strategy(),
    ) {
        let crop = tomatoes();
        let (low, high) = if q1 <= q2 { (q1, q2) } else { (q2, q1) };
        let p_low = predict_price(&crop, yield_per_acre, low, month).unwrap();
        let p_high = predict_price(&crop, yield_per_acre, high, month).unwrap();
        prop_assert!(p_low <= p_high);
    }
}

// ============================================================================
// Unit Tests: Pricing Examples
// ============================================================================

mod pricing_examples {
    use super::*;

    #[test]
    fn tomatoes_in_july_at_base_yield() {
        let price = predict_price(&tomatoes(), 40000.0, 3, 6).unwrap();
        assert_eq!(round2(price), 297.80);
    }

    #[test]
    fn half_yield_premium_in_january() {
        // yield effect 1.4, quality effect 1.0, seasonal factor 0.92
        let price = predict_price(&tomatoes(), 20000.0, 3, 0).unwrap();
        assert!(close(price, 248.17 * 1.4 * 0.92));
    }

    #[test]
    fn glut_hits_the_floor() {
        let price = predict_price(&tomatoes(), 120_000.0, 1, 0).unwrap();
        assert_eq!(price, 248.17 * 0.5);
    }

    #[test]
    fn invalid_inputs_rejected() {
        let crop = tomatoes();
        assert!(predict_price(&crop, 0.0, 3, 0).is_err());
        assert!(predict_price(&crop, -10.0, 3, 0).is_err());
        assert!(predict_price(&crop, 40000.0, 0, 0).is_err());
        assert!(predict_price(&crop, 40000.0, 6, 0).is_err());
        assert!(predict_price(&crop, 40000.0, 3, 12).is_err());
    }

    #[test]
    fn forecast_wraps_into_next_year() {
        let start = NaiveDate::from_ymd_opt(2024, 10, 20).unwrap();
        let forecast = price_forecast_from(start, &tomatoes(), 40000.0, 3).unwrap();

        let dates: Vec<(i32, u32)> = forecast.iter().map(|p| (p.date.year(), p.date.month())).collect();
        assert_eq!(
            dates,
            vec![(2024, 10), (2024, 11), (2024, 12), (2025, 1), (2025, 2), (2025, 3)]
        );
        // December and January share seasonality 3.0
        assert_eq!(forecast[2].price, forecast[3].price);
    }
}

// ============================================================================
// Unit Tests: Seed Catalog
// ============================================================================

mod seed_catalog {
    use super::*;

    #[test]
    fn twelve_crops_in_two_categories() {
        let catalog = StaticCatalog::seed();
        assert_eq!(catalog.len(), 12);
        assert_eq!(
            catalog.categories(),
            vec![CropCategory::Fruit, CropCategory::Vegetable]
        );
        assert_eq!(catalog.by_category(CropCategory::Vegetable).len(), 6);
    }

    #[test]
    fn seed_crops_are_valid() {
        for crop in StaticCatalog::seed().all() {
            assert!(crop.validate().is_ok(), "{} is invalid", crop.name);
            assert_eq!(crop.price_history.len(), 12);
        }
    }

    #[test]
    fn seed_baseline_equals_seasonal_price() {
        for crop in StaticCatalog::seed().all() {
            for month in 0..12 {
                let price = predict_price(crop, crop.base_yield, 3, month).unwrap();
                let expected = crop.current_price * seasonal_factor(crop, month).unwrap();
                assert!(close(price, expected), "{} month {}", crop.name, month);
            }
        }
    }

    #[test]
    fn lookup_by_id() {
        let catalog = StaticCatalog::seed();
        assert_eq!(catalog.get("1").map(|c| c.name.as_str()), Some("Tomatoes"));
        assert!(catalog.get("13").is_none());
    }
}

// ============================================================================
// Unit Tests: Price History Generator
// ============================================================================

mod price_history {
    use super::*;

    #[test]
    fn twelve_ordered_positive_points() {
        let history = generate_price_history("Tomatoes", 2.99, 0.2);

        assert_eq!(history.len(), 12);
        assert!(history.windows(2).all(|w| w[0].date < w[1].date));
        assert!(history.iter().all(|p| p.price > 0.0));
    }

    #[test]
    fn yields_stay_near_base_yield() {
        let history = generate_price_history("Tomatoes", 2.99, 0.2);
        for point in history {
            let y = point.r#yield.unwrap();
            assert!((34_000.0..=46_000.0).contains(&y), "yield {}", y);
        }
    }

    #[test]
    fn extreme_volatility_keeps_prices_positive() {
        let history = generate_price_history("Unknown crop", 1.0, 5.0);
        assert!(history.iter().all(|p| p.price > 0.0));
    }
}
