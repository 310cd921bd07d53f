use crate::utils::error::{ReceiptError, Result};
use lettre::message::Mailbox;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| ReceiptError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReceiptError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ReceiptError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_mailbox(field_name: &str, address: &str) -> Result<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| ReceiptError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: address.to_string(),
            reason: format!("Invalid email address: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("smtp.host", "smtp.gmail.com").is_ok());
        assert!(validate_non_empty_string("smtp.host", "").is_err());
        assert!(validate_non_empty_string("smtp.host", "   ").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("smtp.port", 587u16, 1, u16::MAX).is_ok());
        assert!(validate_range("smtp.port", 0u16, 1, u16::MAX).is_err());
        assert!(validate_range("smtp.timeout_seconds", 601u64, 1, 600).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("clinic@example.com".to_string());
        let absent: Option<String> = None;

        assert!(validate_required_field("smtp.sender_email", &present).is_ok());
        assert!(matches!(
            validate_required_field("smtp.sender_email", &absent),
            Err(ReceiptError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_validate_mailbox() {
        assert!(validate_mailbox("smtp.sender_email", "clinic@example.com").is_ok());
        assert!(validate_mailbox("smtp.sender_email", "not-an-address").is_err());
    }
}
