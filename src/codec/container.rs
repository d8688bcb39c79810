//! Sealed container formats
//!
//! A sealed container is the on-disk JSON representation of an encrypted
//! backup. Two versions exist: the legacy v1 XOR-stream format (accepted on
//! read only) and the current v2 AES-256-CBC + HMAC-SHA256 format. The
//! variant is chosen strictly from the explicit integer `version` field,
//! never inferred from which optional fields happen to be present.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BackupError, BackupResult};

/// KDF identifier written into v2 containers
pub const KDF_PBKDF2_SHA256: &str = "pbkdf2-sha256";

/// Cipher identifier written into v2 containers
pub const CIPHER_AES_256_CBC: &str = "aes-256-cbc";

/// Legacy v1 container (XOR keystream, unkeyed integrity hash)
///
/// Read-only: `seal` never produces this format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerV1 {
    /// Always 1
    pub version: u8,
    /// Always true; absence of this key marks a plain unencrypted payload
    pub encrypted: bool,
    /// Opaque salt string
    pub salt: String,
    /// XOR-stream ciphertext, base64
    pub ciphertext: String,
    /// base64(SHA-256("ciphertext:salt"))
    pub integrity: String,
}

/// Current v2 container (AES-256-CBC/PKCS7, keyed HMAC-SHA256 integrity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerV2 {
    /// Always 2
    pub version: u8,
    /// Always true
    pub encrypted: bool,
    /// Random 16-byte salt, base64
    pub salt: String,
    /// Random 16-byte IV, base64
    pub iv: String,
    /// AES-256-CBC ciphertext, base64
    pub ciphertext: String,
    /// base64(HMAC-SHA256("ciphertext:iv:salt", macKey))
    pub integrity: String,
    /// KDF identifier, [`KDF_PBKDF2_SHA256`]
    pub kdf: String,
    /// PBKDF2 iteration count used for both keys
    pub iterations: u32,
    /// Cipher identifier, [`CIPHER_AES_256_CBC`]
    pub cipher: String,
}

/// A parsed sealed container of either version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SealedContainer {
    /// Legacy format, read-only
    V1(ContainerV1),
    /// Current format
    V2(ContainerV2),
}

impl SealedContainer {
    /// Parse a container from decoded JSON, dispatching on `version`
    pub fn from_value(value: &Value) -> BackupResult<Self> {
        match value.get("version").and_then(Value::as_u64) {
            Some(1) => serde_json::from_value(value.clone())
                .map(Self::V1)
                .map_err(|e| BackupError::InvalidPayload(format!("malformed v1 container: {e}"))),
            Some(2) => serde_json::from_value(value.clone())
                .map(Self::V2)
                .map_err(|e| BackupError::InvalidPayload(format!("malformed v2 container: {e}"))),
            Some(other) => Err(BackupError::UnsupportedVersion(format!(
                "container version {other} is not supported"
            ))),
            None => Err(BackupError::UnsupportedVersion(
                "container version is missing or not an integer".into(),
            )),
        }
    }

    /// Serialize the container to its JSON text form
    pub fn to_json(&self) -> BackupResult<String> {
        serde_json::to_string(self)
            .map_err(|e| BackupError::Unknown(format!("failed to serialize container: {e}")))
    }

    /// The container's version number
    pub fn version(&self) -> u8 {
        match self {
            Self::V1(_) => 1,
            Self::V2(_) => 2,
        }
    }
}
