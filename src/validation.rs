//! # Validation Module
//!
//! Format rules applied to the values users type into the conversation flows.
//! Every rule returns the normalized value on success, or a [`ValidationError`]
//! that carries the localization key shown before the step is asked again.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

/// Date format used for every date the bot asks for
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Upper bound for an admin-entered product price
pub const MAX_PRICE: f64 = 10_000_000.0;

lazy_static! {
    static ref PHONE_REGEX: Regex = Regex::new(
        r"^(\+7|7|8)?[\s\-]?\(?[489][0-9]{2}\)?[\s\-]?[0-9]{3}[\s\-]?[0-9]{2}[\s\-]?[0-9]{2}$"
    )
    .expect("Phone pattern should be valid");
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Email pattern should be valid");
}

/// Reasons a step rejects the user's input
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("input is empty")]
    Empty,
    #[error("input shorter than {min} characters")]
    TooShort { min: usize },
    #[error("input longer than {max} characters")]
    TooLong { max: usize },
    #[error("invalid phone number")]
    InvalidPhone,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("invalid date, expected DD.MM.YYYY")]
    InvalidDate,
    #[error("death date precedes birth date")]
    DeathBeforeBirth,
    #[error("passport series must be 4 digits")]
    InvalidPassportSeries,
    #[error("passport number must be 6 digits")]
    InvalidPassportNumber,
    #[error("invalid price")]
    InvalidPrice,
    #[error("invalid product id")]
    InvalidProductId,
    #[error("unknown product category")]
    UnknownCategory,
    #[error("unknown funeral type")]
    UnknownFuneralType,
    #[error("unknown service")]
    UnknownService,
    #[error("no services selected")]
    NoServicesSelected,
    #[error("unknown budget tier")]
    UnknownBudget,
    #[error("a photo or skip is required")]
    PhotoRequired,
    #[error("this step cannot be skipped")]
    SkipNotAllowed,
    #[error("input does not fit the current step")]
    UnexpectedInput,
}

impl ValidationError {
    /// Localization key of the user-facing message
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationError::Empty => "error-empty",
            ValidationError::TooShort { .. } => "error-too-short",
            ValidationError::TooLong { .. } => "error-too-long",
            ValidationError::InvalidPhone => "error-phone",
            ValidationError::InvalidEmail => "error-email",
            ValidationError::InvalidDate => "error-date",
            ValidationError::DeathBeforeBirth => "error-death-before-birth",
            ValidationError::InvalidPassportSeries => "error-passport-series",
            ValidationError::InvalidPassportNumber => "error-passport-number",
            ValidationError::InvalidPrice => "error-price",
            ValidationError::InvalidProductId => "error-product-id",
            ValidationError::UnknownCategory => "error-category",
            ValidationError::UnknownFuneralType => "error-funeral-type",
            ValidationError::UnknownService => "error-service",
            ValidationError::NoServicesSelected => "error-no-services",
            ValidationError::UnknownBudget => "error-budget",
            ValidationError::PhotoRequired => "error-photo-required",
            ValidationError::SkipNotAllowed => "error-skip-not-allowed",
            ValidationError::UnexpectedInput => "error-unexpected-input",
        }
    }

    /// Arguments interpolated into the localized message
    pub fn message_args(&self) -> Vec<(&'static str, String)> {
        match self {
            ValidationError::TooShort { min } => vec![("min", min.to_string())],
            ValidationError::TooLong { max } => vec![("max", max.to_string())],
            _ => Vec::new(),
        }
    }
}

/// Trims the input and requires at least `min` characters
pub fn validate_min_length(input: &str, min: usize) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    if trimmed.chars().count() < min {
        return Err(ValidationError::TooShort { min });
    }
    Ok(trimmed.to_string())
}

/// Validates a Russian phone number such as `+7 (999) 123-45-67`
pub fn validate_phone(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if PHONE_REGEX.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

pub fn validate_email(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if EMAIL_REGEX.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Parses a `DD.MM.YYYY` calendar date
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| ValidationError::InvalidDate)
}

/// Validates a date and returns it zero-padded (`1.3.1990` becomes `01.03.1990`)
pub fn validate_date(input: &str) -> Result<String, ValidationError> {
    parse_date(input).map(|date| date.format(DATE_FORMAT).to_string())
}

/// Validates a death date, rejecting one that precedes the known birth date
pub fn validate_death_date(input: &str, birth_date: Option<&str>) -> Result<String, ValidationError> {
    let death = parse_date(input)?;
    if let Some(birth) = birth_date.and_then(|b| parse_date(b).ok()) {
        if death < birth {
            return Err(ValidationError::DeathBeforeBirth);
        }
    }
    Ok(death.format(DATE_FORMAT).to_string())
}

fn is_digits(input: &str, len: usize) -> bool {
    input.len() == len && input.bytes().all(|b| b.is_ascii_digit())
}

pub fn validate_passport_series(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if is_digits(trimmed, 4) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidPassportSeries)
    }
}

pub fn validate_passport_number(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if is_digits(trimmed, 6) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::InvalidPassportNumber)
    }
}

/// Parses a price, accepting a comma decimal separator and a trailing currency sign
pub fn validate_price(input: &str) -> Result<f64, ValidationError> {
    let cleaned: String = input
        .trim()
        .trim_end_matches('₽')
        .trim_end_matches("руб.")
        .trim_end_matches("руб")
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    match cleaned.parse::<f64>() {
        Ok(price) if price.is_finite() && price > 0.0 && price <= MAX_PRICE => Ok(price),
        _ => Err(ValidationError::InvalidPrice),
    }
}

pub fn validate_product_id(input: &str) -> Result<i64, ValidationError> {
    let trimmed = input.trim().trim_start_matches('#');
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidProductId),
    }
}

/// Validates a question for the AI assistant
pub fn validate_question(input: &str, max_chars: usize) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    if trimmed.chars().count() > max_chars {
        return Err(ValidationError::TooLong { max: max_chars });
    }
    Ok(trimmed.to_string())
}
