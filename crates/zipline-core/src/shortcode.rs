use crate::base62;
use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;

/// A validated base62 short code identifying a shortened URL.
///
/// Codes are 1-8 characters from the base62 alphabet. The canonical code
/// of a record is always [`base62::encode`] of its id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShortCode(SmolStr);

impl ShortCode {
    /// Creates a `ShortCode` after validating the input against the
    /// base62 alphabet and length limit.
    pub fn new(code: impl AsRef<str>) -> Result<Self, ServiceError> {
        let code = code.as_ref();
        if !base62::is_valid(code) {
            return Err(ServiceError::InvalidArgument(format!(
                "invalid short code: '{code}'"
            )));
        }
        Ok(Self(SmolStr::new(code)))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources
    /// (the codec, or a storage row written by it).
    pub fn new_unchecked(code: impl Into<SmolStr>) -> Self {
        Self(code.into())
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/r/{}", base_url.trim_end_matches('/'), self)
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShortCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ShortCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = SmolStr::deserialize(deserializer)?;
        if !base62::is_valid(&s) {
            return Err(serde::de::Error::custom(format!(
                "invalid short code: '{s}'"
            )));
        }
        Ok(Self(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_codes() {
        assert!(ShortCode::new("0").is_ok());
        assert!(ShortCode::new("aZ9").is_ok());
        assert!(ShortCode::new("ZZZZZZZZ").is_ok());
    }

    #[test]
    fn invalid_codes() {
        assert!(ShortCode::new("").is_err());
        assert!(ShortCode::new("a".repeat(9)).is_err());
        assert!(ShortCode::new("ab-c").is_err());
        assert!(ShortCode::new("ab_c").is_err());
    }

    #[test]
    fn display_matches_input() {
        let code = ShortCode::new("x7Q").unwrap();
        assert_eq!(code.to_string(), "x7Q");
        assert_eq!(code.as_str(), "x7Q");
    }

    #[test]
    fn to_url_joins_cleanly() {
        let code = ShortCode::new("abc").unwrap();
        assert_eq!(code.to_url("https://zip.line"), "https://zip.line/r/abc");
        assert_eq!(code.to_url("https://zip.line/"), "https://zip.line/r/abc");
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<ShortCode, _> = serde_json::from_str("\"abc\"");
        assert!(ok.is_ok());
        let bad: Result<ShortCode, _> = serde_json::from_str("\"ab c\"");
        assert!(bad.is_err());
    }
}
