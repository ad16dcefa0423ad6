//! Payment card numbers: digits only, 12 to 19 long, Luhn-valid, and with the
//! length the card's brand requires.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardNumberError {
    #[error("card number is not all digits")]
    NotDigits,
    #[error("card number must have between 12 and 19 digits, got {0}")]
    Length(usize),
    #[error("card number is not luhn valid")]
    Luhn,
    #[error("length for a {brand} card must be {expected}")]
    BrandLength {
        brand: CardBrand,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardBrand {
    AmericanExpress,
    Mastercard,
    Visa,
    Other,
}

impl std::fmt::Display for CardBrand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CardBrand::AmericanExpress => "American Express",
            CardBrand::Mastercard => "Mastercard",
            CardBrand::Visa => "Visa",
            CardBrand::Other => "other",
        })
    }
}

impl CardBrand {
    fn detect(digits: &str) -> Self {
        let prefix2 = digits.get(..2).and_then(|p| p.parse::<u8>().ok());
        match (digits.as_bytes().first(), prefix2) {
            (Some(b'4'), _) => CardBrand::Visa,
            (_, Some(51..=55)) => CardBrand::Mastercard,
            (_, Some(34 | 37)) => CardBrand::AmericanExpress,
            _ => CardBrand::Other,
        }
    }

    fn check_length(self, len: usize) -> Result<(), CardNumberError> {
        let (ok, expected) = match self {
            CardBrand::AmericanExpress => (len == 15, "15"),
            CardBrand::Mastercard => (len == 16, "16"),
            CardBrand::Visa => (matches!(len, 13 | 16 | 19), "13, 16 or 19"),
            CardBrand::Other => (true, ""),
        };
        if ok {
            Ok(())
        } else {
            Err(CardNumberError::BrandLength {
                brand: self,
                expected,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaymentCardNumber(String);

impl PaymentCardNumber {
    pub fn parse(raw: &str) -> Result<Self, CardNumberError> {
        let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CardNumberError::NotDigits);
        }
        if !(12..=19).contains(&digits.len()) {
            return Err(CardNumberError::Length(digits.len()));
        }
        if !luhn_valid(&digits) {
            return Err(CardNumberError::Luhn);
        }
        CardBrand::detect(&digits).check_length(digits.len())?;
        Ok(Self(digits))
    }

    #[must_use]
    pub fn brand(&self) -> CardBrand {
        CardBrand::detect(&self.0)
    }

    /// Issuer identification number (first six digits).
    #[must_use]
    pub fn bin(&self) -> &str {
        &self.0[..6]
    }

    #[must_use]
    pub fn last4(&self) -> &str {
        &self.0[self.0.len() - 4..]
    }

    /// `bin` + `*` padding + `last4`.
    #[must_use]
    pub fn masked(&self) -> String {
        format!(
            "{}{}{}",
            self.bin(),
            "*".repeat(self.0.len() - 10),
            self.last4()
        )
    }
}

impl TryFrom<String> for PaymentCardNumber {
    type Error = CardNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PaymentCardNumber> for String {
    fn from(value: PaymentCardNumber) -> Self {
        value.0
    }
}

/// Luhn mod-10 checksum over an all-digit string.
fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
