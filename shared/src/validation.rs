//! Validation utilities for the Stock Control Platform

use rust_decimal::Decimal;

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() {
        return Err("Email is required");
    }

    if !email.contains('@') || !email.contains('.') {
        return Err("Invalid email format");
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err("Invalid email format");
    }

    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain an uppercase letter");
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain a lowercase letter");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a digit");
    }

    Ok(())
}

/// Validate a Brazilian company registry number (CNPJ): 14 digits with
/// two mod-11 check digits.
pub fn validate_tax_id(tax_id: &str) -> Result<(), &'static str> {
    if tax_id.len() != 14 {
        return Err("Tax id must be 14 digits");
    }

    if !tax_id.chars().all(|c| c.is_ascii_digit()) {
        return Err("Tax id must contain only digits");
    }

    let digits: Vec<u32> = tax_id.chars().filter_map(|c| c.to_digit(10)).collect();

    // Repeated-digit sequences pass the checksum but are not valid registrations
    if digits.iter().all(|&d| d == digits[0]) {
        return Err("Invalid tax id");
    }

    if digits[12] != tax_id_check_digit(&digits[..12]) {
        return Err("Invalid tax id check digit");
    }

    if digits[13] != tax_id_check_digit(&digits[..13]) {
        return Err("Invalid tax id check digit");
    }

    Ok(())
}

/// Check digit over the leading digits: weights cycle 2..=9 from the
/// rightmost position, remainder below 2 maps to zero.
fn tax_id_check_digit(digits: &[u32]) -> u32 {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| d * (2 + (i as u32 % 8)))
        .sum();

    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}

/// Validate a Brazilian phone number: area code plus number (10-11 digits),
/// optionally prefixed with the 55 country code. An international prefix
/// (`+`) is only accepted for the 55 country code.
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    let ok = if phone.trim_start().starts_with('+') {
        matches!(digits.len(), 12 | 13) && digits.starts_with("55")
    } else {
        matches!(digits.len(), 10 | 11) || (matches!(digits.len(), 12 | 13) && digits.starts_with("55"))
    };

    if !ok {
        return Err("Invalid phone number format");
    }

    Ok(())
}

/// Validate a product SKU: 2-40 visible ASCII characters, no whitespace
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.len() < 2 || sku.len() > 40 {
        return Err("SKU must be 2-40 characters");
    }

    if !sku.chars().all(|c| c.is_ascii_graphic()) {
        return Err("SKU must not contain spaces or special characters");
    }

    Ok(())
}

/// Validate a measurement unit label ("un", "kg", "box", ...)
pub fn validate_unit(unit: &str) -> Result<(), &'static str> {
    if unit.trim().is_empty() {
        return Err("Unit is required");
    }

    if unit.len() > 12 {
        return Err("Unit must be at most 12 characters");
    }

    Ok(())
}

/// Validate a stored quantity
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Quantity cannot be negative");
    }

    Ok(())
}

/// Validate a product price
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }

    Ok(())
}
