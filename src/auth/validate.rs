use rust_decimal::Decimal;

/// Validate a username: 2-50 chars, alphanumeric and underscore only.
pub fn validate_username(username: &str) -> Option<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Some("Username is required".to_string());
    }
    if trimmed.len() < 2 {
        return Some("Username must be at least 2 characters".to_string());
    }
    if trimmed.len() > 50 {
        return Some("Username must be at most 50 characters".to_string());
    }
    if !trimmed.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Some("Username may only contain letters, numbers, and underscores".to_string());
    }
    None
}

/// Validate a password: min 8 chars on create.
pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Password is required".to_string());
    }
    if password.len() < 8 {
        return Some("Password must be at least 8 characters".to_string());
    }
    None
}

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Money amounts are stored as NUMERIC(14, 2): positive, at most two decimal
/// places, at most 999,999,999,999.99.
pub fn validate_amount(amount: Decimal, field_name: &str) -> Option<String> {
    if amount <= Decimal::ZERO {
        return Some(format!("{field_name} must be greater than zero"));
    }
    if amount.normalize().scale() > 2 {
        return Some(format!("{field_name} cannot have more than two decimal places"));
    }
    if amount > Decimal::new(99_999_999_999_999, 2) {
        return Some(format!("{field_name} must be at most 999,999,999,999.99"));
    }
    None
}

/// Remarks are mandatory on rejections, returns and overrides. Whitespace
/// alone does not count.
pub fn validate_remarks(remarks: Option<&str>) -> Option<String> {
    validate_required(remarks.unwrap_or(""), "Remarks", 2000)
}
