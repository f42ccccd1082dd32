//! Validation utilities for the Farm Marketplace
//!
//! Includes India-specific checks for phone numbers used in profiles and
//! order contact details.

use rust_decimal::Decimal;

use crate::forecast::{MAX_QUALITY, MIN_QUALITY};

// ============================================================================
// Account Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a person's display name
pub fn validate_full_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Full name cannot be empty");
    }
    if trimmed.chars().count() > 100 {
        return Err("Full name must be at most 100 characters");
    }
    Ok(())
}

/// Validate Indian mobile number format
/// Accepts: 9876543210, 98765-43210, +919876543210, 09876543210
pub fn validate_indian_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    let local = match digits.len() {
        10 => digits.as_str(),
        11 if digits.starts_with('0') => &digits[1..],
        12 if digits.starts_with("91") => &digits[2..],
        _ => return Err("Invalid Indian phone number format"),
    };

    // Mobile numbers start with 6, 7, 8 or 9
    match local.chars().next() {
        Some('6'..='9') => Ok(()),
        _ => Err("Indian mobile numbers start with 6, 7, 8 or 9"),
    }
}

// ============================================================================
// Marketplace Validations
// ============================================================================

/// Validate a product listing name
pub fn validate_product_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Product name cannot be empty");
    }
    if trimmed.chars().count() > 200 {
        return Err("Product name must be at most 200 characters");
    }
    Ok(())
}

/// Validate a unit price (must be positive)
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price <= Decimal::ZERO {
        return Err("Price must be greater than zero");
    }
    Ok(())
}

/// Validate stock quantity (cannot be negative)
pub fn validate_stock_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

/// Validate an ordered quantity (must be at least one)
pub fn validate_order_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Ordered quantity must be at least 1");
    }
    Ok(())
}

/// Validate a review rating (1-5 stars)
pub fn validate_rating(rating: i32) -> Result<(), &'static str> {
    if !(1..=5).contains(&rating) {
        return Err("Rating must be between 1 and 5");
    }
    Ok(())
}

/// Validate a shipping address
pub fn validate_shipping_address(address: &str) -> Result<(), &'static str> {
    if address.trim().len() < 5 {
        return Err("Shipping address is too short");
    }
    Ok(())
}

// ============================================================================
// Forecast Input Validations
// ============================================================================

/// Validate a produce quality grade (1-5, 3 is average)
pub fn validate_quality(quality: i32) -> Result<(), &'static str> {
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        return Err("Quality must be between 1 and 5");
    }
    Ok(())
}

/// Validate a yield input (kg per acre)
pub fn validate_yield_per_acre(yield_per_acre: f64) -> Result<(), &'static str> {
    if !yield_per_acre.is_finite() || yield_per_acre <= 0.0 {
        return Err("Yield per acre must be a positive number");
    }
    Ok(())
}

/// Check whether a yield falls inside the usual 50%-150% band of the base yield
pub fn is_typical_yield(yield_per_acre: f64, base_yield: f64) -> bool {
    yield_per_acre >= base_yield * 0.5 && yield_per_acre <= base_yield * 1.5
}
