use crate::errors::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+\d{8,15}|\d{8,15})$").expect("phone regex"));
static PINCODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}$").expect("pincode regex"));

pub struct Validator;

impl Validator {
    /// E.164-ish: +countrycode and 8-15 digits, or bare 8-15 digits.
    pub fn validate_phone(phone: &str) -> Result<()> {
        if !PHONE_RE.is_match(phone.trim()) {
            return Err(AppError::Validation(
                "Invalid phone number format. Use +countrycode and 8-15 digits.".to_string(),
            ));
        }
        Ok(())
    }

    /// Indian postal codes are exactly six digits.
    pub fn validate_pincode(pincode: &str) -> Result<()> {
        if !PINCODE_RE.is_match(pincode.trim()) {
            return Err(AppError::Validation("Invalid pincode".to_string()));
        }
        Ok(())
    }
}
