//! Binary serialization and deserialization of catalogs.
//!
//! This module provides a stable binary format for caching a parsed
//! [`Catalog`](crate::Catalog) between runs. The format consists of a 32-byte
//! fixed header followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"OPTR"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Catalog, Condition, Effect, OptionValue, ProductOption, Rule, Test};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"OPTR";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`Catalog`](crate::Catalog) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode catalog: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`Catalog`](crate::Catalog) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not an optrule binary: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedCatalog {
    metadata: CatalogMetadata,
    options: Vec<SerializedOption>,
    rules: Vec<SerializedRule>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogMetadata {
    option_count: usize,
    value_count: usize,
    rule_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedOption {
    key: String,
    label: String,
    required: bool,
    visible: bool,
    values: Vec<SerializedValue>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedValue {
    id: String,
    code: String,
    label: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRule {
    id: String,
    option_key: String,
    test: SerializedTest,
    effect: SerializedEffect,
    description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedTest {
    Equals(String),
    NotEquals(String),
    Contains(String),
    InList(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedEffect {
    Show(String),
    Hide(String),
    Require(String),
    SetDefault { target: String, value: String },
    FilterValues { target: String, values: Vec<String> },
}

// ---------------------------------------------------------------------------
// Test / Effect conversion
// ---------------------------------------------------------------------------

fn serialize_test(test: &Test) -> SerializedTest {
    match test {
        Test::Equals(v) => SerializedTest::Equals(v.clone()),
        Test::NotEquals(v) => SerializedTest::NotEquals(v.clone()),
        Test::Contains(v) => SerializedTest::Contains(v.clone()),
        Test::InList(vs) => SerializedTest::InList(vs.clone()),
    }
}

fn deserialize_test(test: SerializedTest) -> Test {
    match test {
        SerializedTest::Equals(v) => Test::Equals(v),
        SerializedTest::NotEquals(v) => Test::NotEquals(v),
        SerializedTest::Contains(v) => Test::Contains(v),
        SerializedTest::InList(vs) => Test::InList(vs),
    }
}

fn serialize_effect(effect: &Effect) -> SerializedEffect {
    match effect {
        Effect::ShowOption { target } => SerializedEffect::Show(target.clone()),
        Effect::HideOption { target } => SerializedEffect::Hide(target.clone()),
        Effect::RequireOption { target } => SerializedEffect::Require(target.clone()),
        Effect::SetDefault { target, value } => SerializedEffect::SetDefault {
            target: target.clone(),
            value: value.clone(),
        },
        Effect::FilterValues { target, values } => SerializedEffect::FilterValues {
            target: target.clone(),
            values: values.clone(),
        },
    }
}

fn deserialize_effect(effect: SerializedEffect) -> Effect {
    match effect {
        SerializedEffect::Show(target) => Effect::ShowOption { target },
        SerializedEffect::Hide(target) => Effect::HideOption { target },
        SerializedEffect::Require(target) => Effect::RequireOption { target },
        SerializedEffect::SetDefault { target, value } => Effect::SetDefault { target, value },
        SerializedEffect::FilterValues { target, values } => {
            Effect::FilterValues { target, values }
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog -> SerializedCatalog
// ---------------------------------------------------------------------------

fn catalog_to_serialized(catalog: &Catalog, source_text: Option<&str>) -> SerializedCatalog {
    let source_digest = source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes());

    let options: Vec<SerializedOption> = catalog
        .options
        .iter()
        .map(|o| SerializedOption {
            key: o.key.clone(),
            label: o.label.clone(),
            required: o.required,
            visible: o.visible,
            values: o
                .values
                .iter()
                .map(|v| SerializedValue {
                    id: v.id.clone(),
                    code: v.code.clone(),
                    label: v.label.clone(),
                })
                .collect(),
        })
        .collect();

    let rules: Vec<SerializedRule> = catalog
        .rules
        .iter()
        .map(|r| SerializedRule {
            id: r.id.clone(),
            option_key: r.condition.option_key.clone(),
            test: serialize_test(&r.condition.test),
            effect: serialize_effect(&r.effect),
            description: r.description.clone(),
        })
        .collect();

    SerializedCatalog {
        metadata: CatalogMetadata {
            option_count: options.len(),
            value_count: options.iter().map(|o| o.values.len()).sum(),
            rule_count: rules.len(),
            source_digest,
        },
        options,
        rules,
    }
}

// ---------------------------------------------------------------------------
// SerializedCatalog -> Catalog
// ---------------------------------------------------------------------------

fn serialized_to_catalog(ser: SerializedCatalog) -> Result<Catalog, DeserializeError> {
    validate(&ser)?;

    let options = ser
        .options
        .into_iter()
        .map(|so| ProductOption {
            key: so.key,
            label: so.label,
            required: so.required,
            visible: so.visible,
            values: so
                .values
                .into_iter()
                .map(|sv| OptionValue::with_id(sv.id, sv.code, sv.label))
                .collect(),
        })
        .collect();

    let rules = ser
        .rules
        .into_iter()
        .map(|sr| Rule {
            id: sr.id,
            condition: Condition {
                option_key: sr.option_key,
                test: deserialize_test(sr.test),
            },
            effect: deserialize_effect(sr.effect),
            description: sr.description,
        })
        .collect();

    Ok(Catalog::new(options, rules))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Structural checks only. Dangling option references are legal in a catalog
/// and become inert rules when it is compiled.
fn validate(ser: &SerializedCatalog) -> Result<(), DeserializeError> {
    // Metadata consistency
    if ser.metadata.option_count != ser.options.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} options but payload has {}",
            ser.metadata.option_count,
            ser.options.len()
        )));
    }
    let value_count: usize = ser.options.iter().map(|o| o.values.len()).sum();
    if ser.metadata.value_count != value_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} values but payload has {}",
            ser.metadata.value_count, value_count
        )));
    }
    if ser.metadata.rule_count != ser.rules.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {}",
            ser.metadata.rule_count,
            ser.rules.len()
        )));
    }

    for option in &ser.options {
        if option.key.is_empty() {
            return Err(DeserializeError::Validation(
                "option with empty key".to_owned(),
            ));
        }
    }

    for rule in &ser.rules {
        validate_rule(rule)?;
    }

    Ok(())
}

fn validate_rule(rule: &SerializedRule) -> Result<(), DeserializeError> {
    if rule.id.is_empty() {
        return Err(DeserializeError::Validation(
            "rule with empty id".to_owned(),
        ));
    }
    if let SerializedTest::InList(codes) = &rule.test {
        if codes.is_empty() {
            return Err(DeserializeError::Validation(format!(
                "rule '{}' has an empty in_list",
                rule.id
            )));
        }
    }
    if let SerializedEffect::FilterValues { values, .. } = &rule.effect {
        if values.is_empty() {
            return Err(DeserializeError::Validation(format!(
                "rule '{}' has an empty filter_values",
                rule.id
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// The fixed 32-byte prefix of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    format_version: u16,
    engine_version: u16,
    payload_len: u32,
    checksum: [u8; 16],
}

impl Header {
    fn for_payload(payload: &[u8]) -> Result<Self, SerializeError> {
        let payload_len = u32::try_from(payload.len()).map_err(|_| {
            SerializeError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "catalog payload exceeds 4 GiB",
            ))
        })?;
        Ok(Self {
            format_version: FORMAT_VERSION,
            engine_version: ENGINE_VERSION,
            payload_len,
            checksum: truncated_hash(payload),
        })
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&self.format_version.to_le_bytes());
        out.extend_from_slice(&self.engine_version.to_le_bytes());
        // Flags are reserved and always zero.
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&self.payload_len.to_le_bytes());
        out.extend_from_slice(&self.checksum);
    }

    fn parse(bytes: &[u8]) -> Result<Self, DeserializeError> {
        let Some(head) = bytes.get(..HEADER_SIZE) else {
            return Err(DeserializeError::LengthMismatch {
                expected: HEADER_SIZE as u32,
                actual: bytes.len(),
            });
        };
        if &head[0..4] != MAGIC {
            return Err(DeserializeError::BadMagic);
        }

        let le_u16 = |at: usize| u16::from_le_bytes([head[at], head[at + 1]]);
        let mut len = [0u8; 4];
        len.copy_from_slice(&head[12..16]);
        let mut checksum = [0u8; 16];
        checksum.copy_from_slice(&head[16..32]);

        Ok(Self {
            format_version: le_u16(4),
            engine_version: le_u16(6),
            payload_len: u32::from_le_bytes(len),
            checksum,
        })
    }

    /// Slice this header's payload out of `bytes` and verify it.
    fn payload<'a>(&self, bytes: &'a [u8]) -> Result<&'a [u8], DeserializeError> {
        if self.format_version != FORMAT_VERSION {
            return Err(DeserializeError::IncompatibleVersion {
                blob: self.format_version,
                supported: FORMAT_VERSION,
            });
        }

        let body = &bytes[HEADER_SIZE..];
        let Some(payload) = body.get(..self.payload_len as usize) else {
            return Err(DeserializeError::LengthMismatch {
                expected: self.payload_len,
                actual: body.len(),
            });
        };
        if truncated_hash(payload) != self.checksum {
            return Err(DeserializeError::ChecksumMismatch);
        }
        Ok(payload)
    }
}

fn truncated_hash(payload: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&blake3::hash(payload).as_bytes()[..16]);
    out
}

/// Check the header and checksum, then decode the payload.
fn read_payload(bytes: &[u8]) -> Result<SerializedCatalog, DeserializeError> {
    let header = Header::parse(bytes)?;
    let payload = header.payload(bytes)?;
    if header.engine_version != ENGINE_VERSION {
        tracing::debug!(
            blob = header.engine_version,
            current = ENGINE_VERSION,
            "snapshot written by a different engine version"
        );
    }

    let (serialized, _read): (SerializedCatalog, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    Ok(serialized)
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    catalog: &Catalog,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let payload = bincode::serde::encode_to_vec(
        catalog_to_serialized(catalog, source_text),
        bincode::config::standard(),
    )?;
    let header = Header::for_payload(&payload)?;

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    header.write_to(&mut out);
    out.extend(payload);
    Ok(out)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Catalog, DeserializeError> {
    let serialized = read_payload(bytes)?;
    let catalog = serialized_to_catalog(serialized)?;
    tracing::debug!(
        options = catalog.options.len(),
        rules = catalog.rules.len(),
        "loaded catalog snapshot"
    );
    Ok(catalog)
}

/// The BLAKE3 digest of the source text a snapshot was built from, if any.
pub(crate) fn source_digest(bytes: &[u8]) -> Result<Option<[u8; 32]>, DeserializeError> {
    Ok(read_payload(bytes)?.metadata.source_digest)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
