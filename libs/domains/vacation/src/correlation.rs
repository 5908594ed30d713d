//! Correlation keys: how a record points back at the job that produced it.
//!
//! A key is the job key written as a canonical decimal string. Parsing is
//! strict so that exactly one string maps to each job: no sign, no
//! whitespace and no leading zeros.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationKeyError {
    #[error("correlation key is empty")]
    Empty,

    #[error("correlation key '{0}' contains a non-digit character")]
    InvalidDigit(String),

    #[error("correlation key '{0}' is not in canonical form")]
    NonCanonical(String),

    #[error("correlation key '{0}' exceeds the job key range")]
    OutOfRange(String),

    #[error("job key {0} is negative")]
    Negative(i64),
}

/// A job key carried in a broker record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationKey(i64);

impl CorrelationKey {
    pub fn new(job_key: i64) -> Result<Self, CorrelationKeyError> {
        if job_key < 0 {
            return Err(CorrelationKeyError::Negative(job_key));
        }
        Ok(Self(job_key))
    }

    pub fn job_key(self) -> i64 {
        self.0
    }

    pub fn encode(self) -> String {
        self.0.to_string()
    }

    pub fn parse(raw: &str) -> Result<Self, CorrelationKeyError> {
        if raw.is_empty() {
            return Err(CorrelationKeyError::Empty);
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CorrelationKeyError::InvalidDigit(raw.to_string()));
        }
        if raw.len() > 1 && raw.starts_with('0') {
            return Err(CorrelationKeyError::NonCanonical(raw.to_string()));
        }

        // Only digits remain, so overflow is the one way this can fail.
        raw.parse::<i64>()
            .map(Self)
            .map_err(|_| CorrelationKeyError::OutOfRange(raw.to_string()))
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CorrelationKey {
    type Err = CorrelationKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<i64> for CorrelationKey {
    type Error = CorrelationKeyError;

    fn try_from(job_key: i64) -> Result<Self, Self::Error> {
        Self::new(job_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_is_plain_decimal() {
        assert_eq!(CorrelationKey::new(42).unwrap().encode(), "42");
        assert_eq!(CorrelationKey::new(0).unwrap().encode(), "0");
        assert_eq!(
            CorrelationKey::new(i64::MAX).unwrap().encode(),
            "9223372036854775807"
        );
    }

    #[test]
    fn test_negative_job_key_rejected() {
        assert_eq!(CorrelationKey::new(-1), Err(CorrelationKeyError::Negative(-1)));
    }

    #[test]
    fn test_parse_rejects_malformed_values() {
        assert_eq!(CorrelationKey::parse(""), Err(CorrelationKeyError::Empty));
        assert!(matches!(
            CorrelationKey::parse("abc"),
            Err(CorrelationKeyError::InvalidDigit(_))
        ));
        assert!(matches!(
            CorrelationKey::parse("-42"),
            Err(CorrelationKeyError::InvalidDigit(_))
        ));
        assert!(matches!(
            CorrelationKey::parse("+42"),
            Err(CorrelationKeyError::InvalidDigit(_))
        ));
        assert!(matches!(
            CorrelationKey::parse(" 42"),
            Err(CorrelationKeyError::InvalidDigit(_))
        ));
        assert!(matches!(
            CorrelationKey::parse("4.2"),
            Err(CorrelationKeyError::InvalidDigit(_))
        ));
        assert!(matches!(
            CorrelationKey::parse("042"),
            Err(CorrelationKeyError::NonCanonical(_))
        ));
        assert!(matches!(
            CorrelationKey::parse("9223372036854775808"),
            Err(CorrelationKeyError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_accepts_zero_and_max() {
        assert_eq!(CorrelationKey::parse("0").unwrap().job_key(), 0);
        assert_eq!(
            "9223372036854775807".parse::<CorrelationKey>().unwrap().job_key(),
            i64::MAX
        );
    }

    proptest! {
        #[test]
        fn prop_round_trips_every_job_key(job_key in 0..=i64::MAX) {
            let encoded = CorrelationKey::new(job_key).unwrap().encode();
            prop_assert_eq!(CorrelationKey::parse(&encoded).unwrap().job_key(), job_key);
        }

        #[test]
        fn prop_padded_keys_are_rejected(job_key in 0..i64::MAX / 10) {
            let padded = format!("0{job_key}");
            prop_assert!(CorrelationKey::parse(&padded).is_err());
        }
    }
}
