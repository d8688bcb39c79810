//! Cryptographic primitives for the backup codec
//!
//! Key derivation lives here; the container formats and seal/unseal logic
//! are in the `codec` module.

pub mod key_derivation;

pub use key_derivation::{derive_keys, DerivedKeys, KEY_SIZE, PBKDF2_ITERATIONS};
