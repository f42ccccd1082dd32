//! Currency helpers for Indian Rupee amounts
//!
//! Reference prices are authored in USD and shown to users in INR using a
//! fixed demonstration rate. The backend can replace the rate with a live
//! one (see `ExchangeRateClient`), the conversion helpers here stay pure.

/// Fixed USD to INR rate used for seed data and as the live-rate fallback
pub const USD_TO_INR_RATE: f64 = 83.0;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to an arbitrary number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Convert a USD amount to INR at the fixed rate, rounded to paise
pub fn usd_to_inr(usd_amount: f64) -> f64 {
    convert_at_rate(usd_amount, USD_TO_INR_RATE)
}

/// Convert at an explicit rate, rounded to two decimals
pub fn convert_at_rate(amount: f64, rate: f64) -> f64 {
    round2(amount * rate)
}

/// Format an amount as Indian Rupees with lakh/crore digit grouping
///
/// `format_inr(1234567.891, 2, true)` gives `₹12,34,567.89`.
pub fn format_inr(amount: f64, decimals: usize, show_symbol: bool) -> String {
    let formatted = format!("{:.*}", decimals, amount.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let is_negative = amount < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0');

    let mut out = String::with_capacity(formatted.len() + 8);
    if is_negative {
        out.push('-');
    }
    if show_symbol {
        out.push('₹');
    }
    out.push_str(&group_indian(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Convert USD to INR and format in one step
pub fn format_usd_as_inr(usd_amount: f64, decimals: usize, show_symbol: bool) -> String {
    format_inr(usd_to_inr(usd_amount), decimals, show_symbol)
}

/// Group digits as 12,34,567: last three together, then pairs
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (rest, last_three) = digits.split_at(digits.len() - 3);
    let lead = rest.len() % 2;

    let mut groups: Vec<&str> = Vec::new();
    if lead > 0 {
        groups.push(&rest[..lead]);
    }
    let mut idx = lead;
    while idx < rest.len() {
        groups.push(&rest[idx..idx + 2]);
        idx += 2;
    }
    groups.push(last_three);
    groups.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_round2_is_idempotent(value in -1.0e9f64..1.0e9) {
            let once = round2(value);
            prop_assert_eq!(round2(once), once);
        }

        #[test]
        fn prop_grouping_keeps_digits(amount in 0.0f64..1.0e13) {
            let formatted = format_inr(amount, 2, false);
            prop_assert_eq!(formatted.replace(',', ""), format!("{:.2}", amount));
        }

        #[test]
        fn prop_grouping_is_three_then_pairs(amount in 0.0f64..1.0e13) {
            let formatted = format_inr(amount, 0, false);
            let groups: Vec<&str> = formatted.split(',').collect();

            if let Some((last, rest)) = groups.split_last() {
                if rest.is_empty() {
                    prop_assert!((1..=3).contains(&last.len()));
                } else {
                    prop_assert_eq!(last.len(), 3);
                    prop_assert!((1..=2).contains(&rest[0].len()));
                    prop_assert!(rest[1..].iter().all(|g| g.len() == 2));
                }
            }
        }
    }

    #[test]
    fn test_usd_to_inr() {
        assert_eq!(usd_to_inr(2.99), 248.17);
        assert_eq!(usd_to_inr(0.99), 82.17);
        assert_eq!(usd_to_inr(0.0), 0.0);
    }

    #[test]
    fn test_format_small_amounts() {
        assert_eq!(format_inr(248.17, 2, true), "₹248.17");
        assert_eq!(format_inr(5.0, 2, true), "₹5.00");
        assert_eq!(format_inr(999.0, 0, false), "999");
    }

    #[test]
    fn test_format_indian_grouping() {
        assert_eq!(format_inr(1234.5, 2, true), "₹1,234.50");
        assert_eq!(format_inr(100000.0, 0, false), "1,00,000");
        assert_eq!(format_inr(1234567.891, 2, true), "₹12,34,567.89");
        assert_eq!(format_inr(123456789.0, 0, true), "₹12,34,56,789");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_inr(-1500.0, 2, true), "-₹1,500.00");
        assert_eq!(format_inr(-0.001, 2, true), "₹0.00");
    }

    #[test]
    fn test_format_usd_as_inr() {
        assert_eq!(format_usd_as_inr(2.99, 2, true), "₹248.17");
        assert_eq!(format_usd_as_inr(2.99, 2, false), "248.17");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.345, 1), 12.3);
        assert_eq!(round2(297.804), 297.8);
    }
}
