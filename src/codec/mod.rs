//! Backup codec: seal and unseal
//!
//! `seal` encrypts a validated payload into a self-describing v2 container;
//! `unseal` reverses either container version (or accepts a plain legacy
//! payload that predates encryption) and always re-validates the recovered
//! plaintext before handing it back.
//!
//! v2 verifies the keyed integrity tag before any decryption is attempted,
//! so tampered or wrongly-keyed ciphertext is never acted upon.

pub mod container;

pub use container::{ContainerV1, ContainerV2, SealedContainer};

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::crypto::{derive_keys, DerivedKeys, PBKDF2_ITERATIONS};
use crate::error::{BackupError, BackupResult};
use crate::models::BackupPayload;
use crate::validate::validate;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Size of the random salt and IV in bytes
const SALT_SIZE: usize = 16;
const IV_SIZE: usize = 16;

/// Encrypt a payload into a v2 sealed container
///
/// Key derivation is CPU-bound (PBKDF2, 120 000 iterations); call this off
/// any latency-sensitive execution context.
pub fn seal(payload: &BackupPayload, passphrase: &str) -> BackupResult<SealedContainer> {
    if passphrase.is_empty() {
        return Err(BackupError::InvalidPayload(
            "passphrase must not be empty".into(),
        ));
    }

    // Re-validate the payload shape so a hand-built payload cannot seal
    // something the validator would reject on import.
    let raw = serde_json::to_value(payload)
        .map_err(|e| BackupError::Unknown(format!("failed to serialize payload: {e}")))?;
    validate(&raw)?;

    let mut salt = [0u8; SALT_SIZE];
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut iv);

    let keys = derive_keys(passphrase, &salt, PBKDF2_ITERATIONS);

    let mut plaintext = serde_json::to_vec(payload)
        .map_err(|e| BackupError::Unknown(format!("failed to serialize payload: {e}")))?;
    let ciphertext =
        Aes256CbcEnc::new(keys.encryption().into(), (&iv).into())
            .encrypt_padded_vec_mut::<Pkcs7>(&plaintext);
    plaintext.zeroize();

    let salt_b64 = STANDARD.encode(salt);
    let iv_b64 = STANDARD.encode(iv);
    let ciphertext_b64 = STANDARD.encode(&ciphertext);
    let integrity = compute_integrity(&ciphertext_b64, &iv_b64, &salt_b64, &keys)?;

    Ok(SealedContainer::V2(ContainerV2 {
        version: 2,
        encrypted: true,
        salt: salt_b64,
        iv: iv_b64,
        ciphertext: ciphertext_b64,
        integrity,
        kdf: container::KDF_PBKDF2_SHA256.to_string(),
        iterations: PBKDF2_ITERATIONS,
        cipher: container::CIPHER_AES_256_CBC.to_string(),
    }))
}

/// Decrypt and authenticate serialized backup text into a validated payload
pub fn unseal(serialized: &str, passphrase: &str) -> BackupResult<BackupPayload> {
    let value: serde_json::Value = serde_json::from_str(serialized)
        .map_err(|e| BackupError::InvalidPayload(format!("backup file is not valid JSON: {e}")))?;

    // Backups that predate encryption have no `encrypted` key at all; they
    // are plain payloads and only need validation.
    if value.get("encrypted").is_none() {
        return validate(&value);
    }

    match SealedContainer::from_value(&value)? {
        SealedContainer::V1(c) => unseal_v1(&c, passphrase),
        SealedContainer::V2(c) => unseal_v2(&c, passphrase),
    }
}

fn unseal_v2(container: &ContainerV2, passphrase: &str) -> BackupResult<BackupPayload> {
    if container.kdf != container::KDF_PBKDF2_SHA256
        || container.cipher != container::CIPHER_AES_256_CBC
    {
        return Err(BackupError::UnsupportedVersion(format!(
            "container algorithms '{}'/'{}' are not supported",
            container.kdf, container.cipher
        )));
    }

    let salt = decode_field(&container.salt, "salt")?;
    let iv_bytes = decode_field(&container.iv, "iv")?;
    let iv: [u8; IV_SIZE] = iv_bytes
        .try_into()
        .map_err(|_| BackupError::InvalidPayload("container iv must be 16 bytes".into()))?;

    let keys = derive_keys(passphrase, &salt, container.iterations);

    // Authenticate before decrypting; unauthenticated ciphertext is never
    // fed to the cipher.
    verify_integrity(container, &keys)?;

    let ciphertext = decode_field(&container.ciphertext, "ciphertext")?;
    let plaintext = Aes256CbcDec::new(keys.encryption().into(), (&iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| BackupError::DecryptFailed("wrong passphrase or corrupted data".into()))?;

    parse_plaintext(&plaintext)
}

fn unseal_v1(container: &ContainerV1, passphrase: &str) -> BackupResult<BackupPayload> {
    let expected = legacy_integrity(&container.ciphertext, &container.salt);
    if expected != container.integrity {
        return Err(BackupError::DecryptFailed(
            "legacy integrity check failed".into(),
        ));
    }

    let ciphertext = decode_field(&container.ciphertext, "ciphertext")?;
    let key = legacy_key(&container.salt, passphrase);
    let plaintext = xor_keystream(&ciphertext, &key);

    parse_plaintext(&plaintext)
}

/// Parse recovered plaintext and run it back through the validator
fn parse_plaintext(plaintext: &[u8]) -> BackupResult<BackupPayload> {
    if plaintext.is_empty() {
        return Err(BackupError::DecryptFailed(
            "decrypted payload is empty".into(),
        ));
    }
    let value: serde_json::Value = serde_json::from_slice(plaintext)
        .map_err(|_| BackupError::DecryptFailed("decrypted payload is not valid JSON".into()))?;
    validate(&value)
}

fn compute_integrity(
    ciphertext_b64: &str,
    iv_b64: &str,
    salt_b64: &str,
    keys: &DerivedKeys,
) -> BackupResult<String> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(keys.mac())
        .map_err(|e| BackupError::Unknown(format!("failed to initialize HMAC: {e}")))?;
    mac.update(format!("{ciphertext_b64}:{iv_b64}:{salt_b64}").as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn verify_integrity(container: &ContainerV2, keys: &DerivedKeys) -> BackupResult<()> {
    let claimed = STANDARD
        .decode(&container.integrity)
        .map_err(|_| BackupError::DecryptFailed("integrity check failed".into()))?;
    let mut mac = <HmacSha256 as Mac>::new_from_slice(keys.mac())
        .map_err(|e| BackupError::Unknown(format!("failed to initialize HMAC: {e}")))?;
    mac.update(
        format!(
            "{}:{}:{}",
            container.ciphertext, container.iv, container.salt
        )
        .as_bytes(),
    );
    mac.verify_slice(&claimed)
        .map_err(|_| BackupError::DecryptFailed("integrity check failed".into()))
}

fn decode_field(encoded: &str, field: &str) -> BackupResult<Vec<u8>> {
    STANDARD
        .decode(encoded)
        .map_err(|_| BackupError::InvalidPayload(format!("container {field} is not valid base64")))
}

/// Legacy v1 key: SHA-256("salt:passphrase")
fn legacy_key(salt: &str, passphrase: &str) -> [u8; 32] {
    Sha256::digest(format!("{salt}:{passphrase}").as_bytes()).into()
}

/// Legacy v1 integrity: base64(SHA-256("ciphertext:salt"))
fn legacy_integrity(ciphertext_b64: &str, salt: &str) -> String {
    STANDARD.encode(Sha256::digest(format!("{ciphertext_b64}:{salt}").as_bytes()))
}

/// Byte-wise XOR against a cycled key; its own inverse
fn xor_keystream(data: &[u8], key: &[u8; 32]) -> Vec<u8> {
    data.iter()
        .enumerate()
        .map(|(i, byte)| byte ^ key[i % key.len()])
        .collect()
}
