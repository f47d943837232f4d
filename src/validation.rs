//! Field-level checks applied by the mutations before anything is written.
//!
//! Each check returns the user-facing message on failure; callers collect the
//! messages into the payload's `errors` list instead of raising.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidateEmail;

pub const MAX_NAME_LEN: usize = 100;
pub const LOW_STOCK_THRESHOLD: i32 = 10;
pub const RESTOCK_AMOUNT: i32 = 10;

pub const EMAIL_EXISTS: &str = "Email already exists.";
pub const INVALID_EMAIL: &str = "Invalid email format.";
pub const INVALID_PHONE: &str = "Invalid phone format. Use +1234567890 or 123-456-7890.";
pub const NAME_TOO_LONG: &str = "Name must be at most 100 characters.";
pub const PRICE_NOT_POSITIVE: &str = "Price must be positive.";
pub const STOCK_NEGATIVE: &str = "Stock cannot be negative.";
pub const INVALID_CUSTOMER: &str = "Invalid customer ID.";
pub const EMPTY_PRODUCTS: &str = "At least one product must be selected.";
pub const INVALID_PRODUCTS: &str = "One or more product IDs are invalid.";

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d[\d\-]{7,14}$").expect("phone pattern compiles"));

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_email(email: &str) -> bool {
    email.validate_email()
}

/// Treats a blank phone as absent. Anything else is kept verbatim, so
/// surrounding whitespace still fails the pattern.
pub fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone.filter(|p| !p.trim().is_empty())
}

pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.chars().count() > MAX_NAME_LEN {
        return Err(NAME_TOO_LONG);
    }
    Ok(())
}

pub fn validate_phone(phone: Option<&str>) -> Result<(), &'static str> {
    match phone {
        Some(p) if !is_valid_phone(p) => Err(INVALID_PHONE),
        _ => Ok(()),
    }
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(INVALID_EMAIL)
    }
}

/// Prices are stored with two decimal places.
pub fn normalize_price(price: Decimal) -> Decimal {
    price.round_dp(2)
}

pub fn validate_product(price: Decimal, stock: i32) -> Vec<String> {
    let mut errors = Vec::new();
    if price <= Decimal::ZERO {
        errors.push(PRICE_NOT_POSITIVE.to_string());
    }
    if stock < 0 {
        errors.push(STOCK_NEGATIVE.to_string());
    }
    errors
}

/// Sum of the prices of the products attached to an order.
pub fn order_total<'a>(prices: impl IntoIterator<Item = &'a Decimal>) -> Decimal {
    prices.into_iter().copied().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).expect("decimal literal")
    }

    #[test]
    fn phone_pattern_accepts_common_formats() {
        assert!(is_valid_phone("+1234567890"));
        assert!(is_valid_phone("123-456-7890"));
        assert!(is_valid_phone("12345678"));
    }

    #[test]
    fn phone_pattern_rejects_garbage() {
        assert!(!is_valid_phone("abc"));
        assert!(!is_valid_phone("1234567"));
        assert!(!is_valid_phone("+-12345678"));
        assert!(!is_valid_phone("1234567890123456"));
        assert_eq!(validate_phone(Some("abc")), Err(INVALID_PHONE));
        assert_eq!(validate_phone(None), Ok(()));
    }

    #[test]
    fn blank_phone_is_absent() {
        assert_eq!(normalize_phone(Some("   ".into())), None);
        assert_eq!(normalize_phone(None), None);
    }

    #[test]
    fn padded_phone_is_kept_and_rejected() {
        let phone = normalize_phone(Some(" +1234567890 ".into()));
        assert_eq!(phone.as_deref(), Some(" +1234567890 "));
        assert_eq!(validate_phone(phone.as_deref()), Err(INVALID_PHONE));
    }

    #[test]
    fn email_format_is_checked() {
        assert_eq!(validate_email("alice@example.com"), Ok(()));
        assert_eq!(validate_email("alice.example.com"), Err(INVALID_EMAIL));
    }

    #[test]
    fn long_names_are_rejected() {
        assert_eq!(validate_name(&"a".repeat(100)), Ok(()));
        assert_eq!(validate_name(&"a".repeat(101)), Err(NAME_TOO_LONG));
    }

    #[test]
    fn price_must_be_positive() {
        assert_eq!(validate_product(dec("0"), 0), vec![PRICE_NOT_POSITIVE]);
        assert_eq!(validate_product(dec("-5.00"), 0), vec![PRICE_NOT_POSITIVE]);
        assert!(validate_product(dec("0.01"), 0).is_empty());
    }

    #[test]
    fn sub_cent_prices_round_to_zero() {
        let price = normalize_price(dec("0.004"));
        assert_eq!(validate_product(price, 1), vec![PRICE_NOT_POSITIVE]);
    }

    #[test]
    fn both_product_errors_are_reported() {
        assert_eq!(
            validate_product(dec("0"), -1),
            vec![PRICE_NOT_POSITIVE, STOCK_NEGATIVE]
        );
    }

    #[test]
    fn total_is_sum_of_prices() {
        let prices = [dec("10.00"), dec("15.00")];
        assert_eq!(order_total(&prices), dec("25.00"));
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }
}
