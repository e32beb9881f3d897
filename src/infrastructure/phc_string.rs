//! PHC string codec for Argon2id hashes.
//!
//! Layout: `$argon2id$v=19$m=<kib>,t=<passes>,p=<lanes>$<salt>$<key>` where
//! salt and key are standard base64 without padding.

use std::{fmt, str::FromStr};

use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

use crate::domain::{error::HashError, models::credential::HashParams};

pub const ALGORITHM: &str = "argon2id";
pub const VERSION: &str = "v=19";

const FIELD_COUNT: usize = 6;

// Trailing bits are ignored on decode so a tampered final character still
// decodes and fails as a key mismatch.
const B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone)
        .with_decode_allow_trailing_bits(true),
);

/// Decoded form of an encoded Argon2id credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhcString {
    pub memory_kib: u32,
    pub time_cost: u32,
    pub parallelism: u8,
    pub salt: Vec<u8>,
    pub key: Vec<u8>,
}

impl PhcString {
    /// Derivation parameters embedded in this string. Salt and key lengths
    /// come from the decoded bytes, never from configuration.
    pub fn params(&self) -> HashParams {
        HashParams {
            memory_kib: self.memory_kib,
            time_cost: self.time_cost,
            parallelism: self.parallelism,
            key_len: self.key.len(),
            salt_len: self.salt.len(),
        }
    }
}

impl fmt::Display for PhcString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${ALGORITHM}${VERSION}$m={},t={},p={}${}${}",
            self.memory_kib,
            self.time_cost,
            self.parallelism,
            B64.encode(&self.salt),
            B64.encode(&self.key),
        )
    }
}

impl FromStr for PhcString {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('$').collect();
        if fields.len() != FIELD_COUNT {
            return Err(HashError::MalformedFormat(format!(
                "expected {FIELD_COUNT} '$'-separated fields, found {}",
                fields.len()
            )));
        }
        if !fields[0].is_empty() {
            return Err(HashError::MalformedFormat(
                "hash must start with '$'".to_string(),
            ));
        }
        if fields[1] != ALGORITHM {
            return Err(HashError::UnsupportedAlgorithm(fields[1].to_string()));
        }
        if fields[2] != VERSION {
            return Err(HashError::UnsupportedVersion(fields[2].to_string()));
        }

        let (memory_kib, time_cost, parallelism) = parse_params(fields[3])?;
        let salt = decode_field("salt", fields[4])?;
        let key = decode_field("key", fields[5])?;

        Ok(Self {
            memory_kib,
            time_cost,
            parallelism,
            salt,
            key,
        })
    }
}

fn parse_params(field: &str) -> Result<(u32, u32, u8), HashError> {
    let entries: Vec<&str> = field.split(',').collect();
    if entries.len() != 3 {
        return Err(param_error(format!(
            "expected 3 parameters, found {}",
            entries.len()
        )));
    }

    let (mut memory, mut time, mut lanes) = (None, None, None);
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| param_error(format!("`{entry}` is not key=value")))?;
        match key {
            "m" => set_once(&mut memory, key, parse_positive(key, value)?)?,
            "t" => set_once(&mut time, key, parse_positive(key, value)?)?,
            "p" => set_once(&mut lanes, key, parse_positive(key, value)?)?,
            other => return Err(param_error(format!("unknown parameter `{other}`"))),
        }
    }

    match (memory, time, lanes) {
        (Some(m), Some(t), Some(p)) => Ok((m, t, p)),
        _ => Err(param_error("missing parameter".to_string())),
    }
}

/// Decimal digits only: `str::parse` alone would also take a leading `+`.
fn parse_positive<T>(key: &str, value: &str) -> Result<T, HashError>
where
    T: FromStr + PartialEq + From<u8>,
{
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(param_error(format!("`{key}` is not a decimal integer")));
    }
    let parsed = value
        .parse::<T>()
        .map_err(|_| param_error(format!("`{key}` is out of range")))?;
    if parsed == T::from(0) {
        return Err(param_error(format!("`{key}` must be positive")));
    }
    Ok(parsed)
}

fn set_once<T>(slot: &mut Option<T>, key: &str, value: T) -> Result<(), HashError> {
    if slot.replace(value).is_some() {
        return Err(param_error(format!("duplicate parameter `{key}`")));
    }
    Ok(())
}

fn decode_field(field: &'static str, value: &str) -> Result<Vec<u8>, HashError> {
    B64.decode(value).map_err(|e| HashError::Encoding {
        field,
        reason: e.to_string(),
    })
}

fn param_error(reason: String) -> HashError {
    HashError::ParameterFormat(reason)
}
