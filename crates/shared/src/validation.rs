use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use base64::Engine as _;

/// Longest message accepted by the Telegram bot API.
pub const MAX_TELEGRAM_CONTENT_CHARS: usize = 4096;
pub const MAX_LABEL_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every failed field from one validation pass, reported together so the
/// caller sees all problems at once instead of fixing them one by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{err}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Collects field failures so a validation pass can report every problem in
/// a single error.
#[derive(Debug, Default)]
pub struct FieldChecks {
    errors: Vec<FieldError>,
}

impl FieldChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.push(err);
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// An input that may be a raw address or a registered ENS name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressOrEns {
    Address(Address),
    Ens(String),
}

impl fmt::Display for AddressOrEns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressOrEns::Address(address) => write!(f, "{address}"),
            AddressOrEns::Ens(name) => write!(f, "{name}"),
        }
    }
}

pub fn is_ens_name(value: &str) -> bool {
    value
        .strip_suffix(".eth")
        .is_some_and(|prefix| !prefix.is_empty())
}

pub fn checked_address(field: &'static str, value: &str) -> Result<Address, FieldError> {
    Address::from_str(value.trim())
        .map_err(|_| FieldError::new(field, "must be a valid ethereum address"))
}

pub fn checked_address_or_ens(field: &'static str, value: &str) -> Result<AddressOrEns, FieldError> {
    let value = value.trim();
    if is_ens_name(value) {
        Ok(AddressOrEns::Ens(value.to_lowercase()))
    } else {
        checked_address(field, value).map(AddressOrEns::Address).map_err(|_| {
            FieldError::new(field, "must be a valid ethereum address or ENS name")
        })
    }
}

pub fn checked_telegram_content(field: &'static str, value: &str) -> Result<String, FieldError> {
    if value.is_empty() {
        return Err(FieldError::new(field, "must not be empty"));
    }
    if value.chars().count() > MAX_TELEGRAM_CONTENT_CHARS {
        return Err(FieldError::new(
            field,
            format!("must be at most {MAX_TELEGRAM_CONTENT_CHARS} characters"),
        ));
    }
    Ok(value.to_string())
}

pub fn checked_label(field: &'static str, value: &str) -> Result<String, FieldError> {
    if value.chars().count() > MAX_LABEL_CHARS {
        return Err(FieldError::new(
            field,
            format!("must be at most {MAX_LABEL_CHARS} characters"),
        ));
    }
    Ok(value.to_string())
}

pub fn checked_non_empty(field: &'static str, value: &str) -> Result<String, FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, "is required"));
    }
    Ok(value.to_string())
}

pub fn checked_base64(field: &'static str, value: &str) -> Result<String, FieldError> {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|_| FieldError::new(field, "must be base64 encoded"))?;
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_ADDRESS: &str = "0x1234567890123456789012345678901234567890";

    #[test]
    fn test_checked_address_accepts_mixed_case() {
        let lower = checked_address("addr", GOOD_ADDRESS).unwrap();
        let upper = checked_address("addr", &GOOD_ADDRESS.to_uppercase().replace("0X", "0x"))
            .unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_checked_address_rejects_garbage() {
        let err = checked_address("userAddress", "not-an-address").unwrap_err();
        assert_eq!(err.field, "userAddress");
    }

    #[test]
    fn test_ens_name_detection() {
        assert!(is_ens_name("my-dapp.apps.iexec.eth"));
        assert!(!is_ens_name(".eth"));
        assert!(!is_ens_name(GOOD_ADDRESS));
    }

    #[test]
    fn test_checked_address_or_ens() {
        assert!(matches!(
            checked_address_or_ens("app", "My-Dapp.Apps.iExec.ETH").unwrap(),
            AddressOrEns::Ens(name) if name == "my-dapp.apps.iexec.eth"
        ));
        assert!(matches!(
            checked_address_or_ens("app", GOOD_ADDRESS).unwrap(),
            AddressOrEns::Address(_)
        ));
        assert!(checked_address_or_ens("app", "nope").is_err());
    }

    #[test]
    fn test_telegram_content_bounds() {
        assert!(checked_telegram_content("telegramContent", "").is_err());
        let max = "a".repeat(MAX_TELEGRAM_CONTENT_CHARS);
        assert!(checked_telegram_content("telegramContent", &max).is_ok());
        let too_long = "a".repeat(MAX_TELEGRAM_CONTENT_CHARS + 1);
        assert!(checked_telegram_content("telegramContent", &too_long).is_err());
    }

    #[test]
    fn test_label_bounds() {
        assert!(checked_label("label", "monthly update").is_ok());
        assert!(checked_label("label", &"x".repeat(MAX_LABEL_CHARS + 1)).is_err());
    }

    #[test]
    fn test_checked_base64() {
        assert!(checked_base64("key", "aGVsbG8=").is_ok());
        assert!(checked_base64("key", "%%%").is_err());
    }

    #[test]
    fn test_field_checks_aggregate_all_failures() {
        let mut checks = FieldChecks::new();
        let addr = checks.check(checked_address("protectedData", "bad"));
        let content = checks.check(checked_telegram_content("telegramContent", ""));
        assert!(addr.is_none());
        assert!(content.is_none());

        let errors = checks.finish().unwrap_err();
        assert_eq!(errors.0.len(), 2);
        let rendered = errors.to_string();
        assert!(rendered.contains("protectedData"));
        assert!(rendered.contains("telegramContent"));
        assert!(rendered.contains("; "));
    }

    #[test]
    fn test_field_checks_pass_through_values() {
        let mut checks = FieldChecks::new();
        let addr = checks.check(checked_address("addr", GOOD_ADDRESS));
        assert!(addr.is_some());
        assert!(checks.finish().is_ok());
    }
}
