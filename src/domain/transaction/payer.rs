//! Payer records, keyed by phone number.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PayerId, Timestamp, ValidationError};

/// Someone paying through a mobile-money wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub id: PayerId,
    /// Normalized phone number: optional leading `+` then digits only.
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: Timestamp,
}

impl Payer {
    pub fn new(
        phone: &str,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: PayerId::new(),
            phone: Self::normalize_phone(phone)?,
            name,
            email,
            created_at: Timestamp::now(),
        })
    }

    /// Strips spaces, dashes, dots and parentheses.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if nothing is left
    /// - `InvalidFormat` for any other character or fewer than 6 digits
    pub fn normalize_phone(raw: &str) -> Result<String, ValidationError> {
        let compact: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();
        if compact.is_empty() {
            return Err(ValidationError::empty_field("phone"));
        }

        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        if !digits.chars().all(|c| c.is_ascii_digit()) || digits.len() < 6 {
            return Err(ValidationError::invalid_format(
                "phone",
                "expected an optional '+' followed by at least 6 digits",
            ));
        }
        Ok(compact)
    }

    /// Fills in details the payer did not have before. Existing values stay.
    pub fn merge_details(&mut self, name: Option<String>, email: Option<String>) {
        if self.name.is_none() {
            self.name = name;
        }
        if self.email.is_none() {
            self.email = email;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_is_normalized() {
        assert_eq!(
            Payer::normalize_phone(" +221 77-123.45.67 ").unwrap(),
            "+221771234567"
        );
        assert_eq!(Payer::normalize_phone("(77) 123 4567").unwrap(), "771234567");
    }

    #[test]
    fn invalid_phone_is_rejected() {
        assert!(matches!(
            Payer::normalize_phone("   "),
            Err(ValidationError::EmptyField { .. })
        ));
        assert!(matches!(
            Payer::normalize_phone("+22a771234"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Payer::normalize_phone("123"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn merge_details_keeps_existing_values() {
        let mut payer = Payer::new("771234567", Some("Awa".to_string()), None).unwrap();

        payer.merge_details(Some("Other".to_string()), Some("awa@example.com".to_string()));

        assert_eq!(payer.name.as_deref(), Some("Awa"));
        assert_eq!(payer.email.as_deref(), Some("awa@example.com"));
    }
}
