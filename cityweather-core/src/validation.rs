use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Trimmed city name, ready to send to a provider.
    Valid(String),
    Invalid(ValidationError),
}

/// Check raw user input before a lookup is attempted.
pub fn validate(raw_city_input: &str) -> ValidationOutcome {
    let city = raw_city_input.trim();
    if city.is_empty() {
        return ValidationOutcome::Invalid(ValidationError::EmptyCityName);
    }

    ValidationOutcome::Valid(city.to_string())
}
