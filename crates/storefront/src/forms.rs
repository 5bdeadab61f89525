//! Form validation.
//!
//! Validation failures are surfaced back to the originating form as
//! field-level messages; they never become request errors.

use rust_decimal::Decimal;

use clementine_core::Email;

/// One validation message, tied to the form field it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_owned(),
        }
    }
}

/// Validate the signup form. Email uniqueness is checked later against the
/// store; this covers everything checkable from the input alone.
#[must_use]
pub fn validate_signup(email: &str, password: &str, confirm_password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if Email::parse(email).is_err() {
        errors.push(FieldError::new(
            "email",
            "Please enter a valid email address!",
        ));
    }

    if password.len() < 5 {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 5 characters long!",
        ));
    }

    if password != confirm_password {
        errors.push(FieldError::new(
            "confirm_password",
            "Passwords don't match!",
        ));
    }

    errors
}

/// The validated text fields of the product form.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidProduct {
    pub title: String,
    pub price: Decimal,
    pub description: String,
}

/// Validate the add/edit product form fields.
///
/// # Errors
///
/// Returns the field-level messages to re-render the form with.
pub fn validate_product(
    title: &str,
    price: &str,
    description: &str,
) -> Result<ValidProduct, Vec<FieldError>> {
    let mut errors = Vec::new();

    let title = title.trim();
    if title.chars().count() < 3 {
        errors.push(FieldError::new(
            "title",
            "Title must be at least 3 characters long!",
        ));
    }

    let parsed_price = price.trim().parse::<Decimal>().ok();
    match parsed_price {
        Some(p) if p > Decimal::ZERO => {}
        _ => errors.push(FieldError::new("price", "Please enter a valid price!")),
    }

    let description = description.trim();
    if description.chars().count() < 10 {
        errors.push(FieldError::new(
            "description",
            "Description must be at least 10 characters long!",
        ));
    }

    match parsed_price {
        Some(price) if errors.is_empty() => Ok(ValidProduct {
            title: title.to_owned(),
            price,
            description: description.to_owned(),
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_signup_has_no_errors() {
        assert!(validate_signup("shopper@example.com", "secret", "secret").is_empty());
    }

    #[test]
    fn test_signup_rejects_bad_email() {
        let errors = validate_signup("not-an-email", "secret", "secret");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().unwrap().field, "email");
    }

    #[test]
    fn test_signup_rejects_short_password() {
        let errors = validate_signup("shopper@example.com", "abcd", "abcd");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().unwrap().field, "password");
    }

    #[test]
    fn test_signup_rejects_mismatched_confirmation() {
        let errors = validate_signup("shopper@example.com", "secret", "different");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().unwrap().field, "confirm_password");
    }

    #[test]
    fn test_signup_collects_all_errors() {
        let errors = validate_signup("nope", "ab", "cd");
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["email", "password", "confirm_password"]);
    }

    #[test]
    fn test_valid_product() {
        let valid = validate_product(" Teapot ", "24.99", "A very nice teapot.").unwrap();
        assert_eq!(valid.title, "Teapot");
        assert_eq!(valid.price.to_string(), "24.99");
        assert_eq!(valid.description, "A very nice teapot.");
    }

    #[test]
    fn test_product_rejects_short_title() {
        let errors = validate_product("ab", "10", "long enough description").unwrap_err();
        assert_eq!(errors.first().unwrap().field, "title");
    }

    #[test]
    fn test_product_rejects_bad_price() {
        for price in ["", "free", "-3", "0"] {
            let errors =
                validate_product("Teapot", price, "long enough description").unwrap_err();
            assert_eq!(errors.first().unwrap().field, "price", "price input {price:?}");
        }
    }

    #[test]
    fn test_product_rejects_short_description() {
        let errors = validate_product("Teapot", "10", "too short").unwrap_err();
        assert_eq!(errors.first().unwrap().field, "description");
    }
}
