//! Key derivation using PBKDF2-HMAC-SHA256
//!
//! Derives two independent 256-bit keys from a passphrase: one for
//! encryption and one for message authentication. The MAC key uses a
//! domain-separated passphrase (`passphrase-mac`) so the same key never
//! serves both secrecy and authenticity.
//!
//! Derivation is CPU-bound at the configured iteration count; call it off
//! any latency-sensitive execution context.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroize;

/// Key size in bytes for AES-256 and HMAC-SHA256
pub const KEY_SIZE: usize = 32;

/// PBKDF2 iteration count used when sealing new containers
pub const PBKDF2_ITERATIONS: u32 = 120_000;

/// Suffix appended to the passphrase when deriving the MAC key
const MAC_DOMAIN_SUFFIX: &str = "-mac";

/// The encryption/MAC key pair derived from a passphrase
pub struct DerivedKeys {
    encryption: [u8; KEY_SIZE],
    mac: [u8; KEY_SIZE],
}

impl DerivedKeys {
    /// The AES-256 encryption key
    pub fn encryption(&self) -> &[u8; KEY_SIZE] {
        &self.encryption
    }

    /// The HMAC-SHA256 key
    pub fn mac(&self) -> &[u8; KEY_SIZE] {
        &self.mac
    }
}

impl Drop for DerivedKeys {
    fn drop(&mut self) {
        self.encryption.zeroize();
        self.mac.zeroize();
    }
}

/// Derive the encryption and MAC keys for a passphrase and salt
pub fn derive_keys(passphrase: &str, salt: &[u8], iterations: u32) -> DerivedKeys {
    let mut encryption = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, iterations, &mut encryption);

    let mut mac_passphrase = format!("{passphrase}{MAC_DOMAIN_SUFFIX}");
    let mut mac = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(mac_passphrase.as_bytes(), salt, iterations, &mut mac);
    mac_passphrase.zeroize();

    DerivedKeys { encryption, mac }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Small iteration count to keep tests fast.
    const TEST_ITERATIONS: u32 = 1_000;

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive_keys("passphrase", b"0123456789abcdef", TEST_ITERATIONS);
        let b = derive_keys("passphrase", b"0123456789abcdef", TEST_ITERATIONS);
        assert_eq!(a.encryption(), b.encryption());
        assert_eq!(a.mac(), b.mac());
    }

    #[test]
    fn test_encryption_and_mac_keys_differ() {
        let keys = derive_keys("passphrase", b"0123456789abcdef", TEST_ITERATIONS);
        assert_ne!(keys.encryption(), keys.mac());
    }

    #[test]
    fn test_different_passphrase_different_keys() {
        let a = derive_keys("one", b"0123456789abcdef", TEST_ITERATIONS);
        let b = derive_keys("two", b"0123456789abcdef", TEST_ITERATIONS);
        assert_ne!(a.encryption(), b.encryption());
    }

    #[test]
    fn test_different_salt_different_keys() {
        let a = derive_keys("passphrase", b"0123456789abcdef", TEST_ITERATIONS);
        let b = derive_keys("passphrase", b"fedcba9876543210", TEST_ITERATIONS);
        assert_ne!(a.encryption(), b.encryption());
    }

    #[test]
    fn test_different_iterations_different_keys() {
        let a = derive_keys("passphrase", b"0123456789abcdef", TEST_ITERATIONS);
        let b = derive_keys("passphrase", b"0123456789abcdef", TEST_ITERATIONS + 1);
        assert_ne!(a.encryption(), b.encryption());
    }
}
