//! Base62 codec for short codes.
//!
//! The alphabet is digits, then lowercase, then uppercase, and codes are
//! at most [`MAX_CODE_LENGTH`] characters. A short code is a pure
//! function of the record id: `encode(0) == "0"`, no sign, no padding.

use crate::error::ServiceError;
use crate::record::UrlId;
use crate::shortcode::ShortCode;

const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BASE: u64 = 62;

/// Longest short code the codec will produce or accept.
pub const MAX_CODE_LENGTH: usize = 8;

/// Largest id that still encodes within [`MAX_CODE_LENGTH`] characters.
pub const MAX_ENCODABLE_ID: UrlId = (BASE as UrlId).pow(MAX_CODE_LENGTH as u32) - 1;

/// Encodes a record id as a base62 short code.
///
/// Rejects negative ids and ids whose encoding would exceed
/// [`MAX_CODE_LENGTH`] characters.
pub fn encode(id: UrlId) -> Result<ShortCode, ServiceError> {
    if id < 0 {
        return Err(ServiceError::InvalidArgument(format!(
            "cannot encode negative id: {id}"
        )));
    }
    if id > MAX_ENCODABLE_ID {
        return Err(ServiceError::InvalidArgument(format!(
            "id {id} does not fit in {MAX_CODE_LENGTH} characters"
        )));
    }
    if id == 0 {
        return Ok(ShortCode::new_unchecked("0"));
    }

    let mut reversed = [0u8; MAX_CODE_LENGTH];
    let mut len = 0;
    let mut rest = id as u64;
    while rest > 0 {
        reversed[len] = ALPHABET[(rest % BASE) as usize];
        len += 1;
        rest /= BASE;
    }
    let code: String = reversed[..len]
        .iter()
        .rev()
        .map(|&b| b as char)
        .collect();
    Ok(ShortCode::new_unchecked(code))
}

/// Decodes a base62 short code back to the record id it encodes.
///
/// Rejects empty input, input longer than [`MAX_CODE_LENGTH`], and any
/// character outside the alphabet.
pub fn decode(code: &str) -> Result<UrlId, ServiceError> {
    if code.is_empty() {
        return Err(ServiceError::InvalidArgument(
            "cannot decode an empty short code".to_string(),
        ));
    }
    if code.len() > MAX_CODE_LENGTH {
        return Err(ServiceError::InvalidArgument(format!(
            "short code exceeds {MAX_CODE_LENGTH} characters: '{code}'"
        )));
    }

    let mut value: u64 = 0;
    for c in code.chars() {
        let digit = digit_value(c).ok_or_else(|| {
            ServiceError::InvalidArgument(format!(
                "invalid character '{c}' in short code '{code}'"
            ))
        })?;
        value = value * BASE + digit as u64;
    }
    Ok(value as UrlId)
}

/// Non-throwing companion to [`decode`].
pub fn is_valid(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LENGTH
        && code.chars().all(|c| digit_value(c).is_some())
}

fn digit_value(c: char) -> Option<u64> {
    match c {
        '0'..='9' => Some(c as u64 - '0' as u64),
        'a'..='z' => Some(c as u64 - 'a' as u64 + 10),
        'A'..='Z' => Some(c as u64 - 'A' as u64 + 36),
        _ => None,
    }
}
