use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use regex::Regex;

/// Validate email format
pub fn validate_email(email: &str) -> Result<()> {
    let email_regex = Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")?;
    if !email_regex.is_match(email.trim()) {
        bail!("Invalid email format");
    }
    Ok(())
}

/// Validate phone number (10-15 digits, optional leading +, separators allowed)
pub fn validate_phone(phone: &str) -> Result<()> {
    let cleaned: String = phone
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '(' | ')' | '-'))
        .collect();
    let phone_regex = Regex::new(r"^[+]?[0-9]{10,15}$")?;
    if !phone_regex.is_match(&cleaned) {
        bail!("Invalid phone number");
    }
    Ok(())
}

/// Validate username (alphanumeric with underscore, 3-20 chars)
pub fn validate_username(username: &str) -> Result<()> {
    let cleaned = username.trim();
    if cleaned.len() < 3 || cleaned.len() > 20 {
        bail!("Username must be 3-20 characters");
    }
    if !cleaned.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("Username may only contain letters, digits and underscores");
    }
    Ok(())
}

/// Validate a person's name (letters, spaces, hyphens, 2-50 chars)
pub fn validate_name(name: &str) -> Result<()> {
    let cleaned = name.trim();
    if cleaned.len() < 2 || cleaned.len() > 50 {
        bail!("Name must be 2-50 characters");
    }
    if !cleaned
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == ' ' || c == '-')
    {
        bail!("Name may only contain letters, spaces and hyphens");
    }
    Ok(())
}

/// Class capacity must be 1-100
pub fn validate_capacity(capacity: i32) -> Result<()> {
    if !(1..=100).contains(&capacity) {
        bail!("Capacity must be between 1 and 100");
    }
    Ok(())
}

/// End time must fall after start time
pub fn validate_time_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end <= start {
        bail!("End time must be after start time");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn accepts_normal_emails() {
        assert!(validate_email("jane.doe@example.com").is_ok());
        assert!(validate_email("j+tag@sub.example.co").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn phone_allows_separators_and_plus() {
        assert!(validate_phone("+91 98765 43210").is_ok());
        assert!(validate_phone("(555) 123-4567890").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("abcdefghij").is_err());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("john_doe42").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(21)).is_err());
    }

    #[test]
    fn name_rules() {
        assert!(validate_name("Mary-Jane Smith").is_ok());
        assert!(validate_name("X").is_err());
        assert!(validate_name("R2D2").is_err());
    }

    #[test]
    fn capacity_bounds() {
        assert!(validate_capacity(1).is_ok());
        assert!(validate_capacity(100).is_ok());
        assert!(validate_capacity(0).is_err());
        assert!(validate_capacity(101).is_err());
    }

    #[test]
    fn time_range_must_be_forward() {
        let start = Utc::now();
        assert!(validate_time_range(start, start + Duration::hours(1)).is_ok());
        assert!(validate_time_range(start, start).is_err());
        assert!(validate_time_range(start, start - Duration::minutes(5)).is_err());
    }
}
