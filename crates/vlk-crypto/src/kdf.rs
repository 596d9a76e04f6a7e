//! Key derivation: Argon2id password → digest key
//!
//! Registration generates a fresh salt; verification re-supplies the stored
//! one and must land on the same key.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::{KEY_SIZE, SALT_SIZE};

/// A 256-bit symmetric key. Zeroized on drop to prevent secrets lingering
/// in memory.
#[derive(Clone)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Argon2id parameters
#[derive(Debug, Clone)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 4096)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 4096,
            time_cost: 3,
            parallelism: 1,
        }
    }
}

impl From<&vlk_core::config::CryptoConfig> for KdfParams {
    fn from(config: &vlk_core::config::CryptoConfig) -> Self {
        Self {
            mem_cost_kib: config.argon2_mem_cost_kib,
            time_cost: config.argon2_time_cost,
            parallelism: config.argon2_parallelism,
        }
    }
}

/// Result of [`digest`]: the derived key plus the salt that produced it.
pub struct Digest {
    pub key: MasterKey,
    pub salt: [u8; SALT_SIZE],
}

/// Derive a 256-bit key from a password via Argon2id.
///
/// When `salt` is `None` (registration path) a fresh random salt is
/// generated and returned; the caller stores it alongside the ciphertext.
/// When re-deriving (verification path) the stored salt is supplied.
pub fn digest(
    password: &SecretString,
    salt: Option<[u8; SALT_SIZE]>,
    params: &KdfParams,
) -> anyhow::Result<Digest> {
    let salt = salt.unwrap_or_else(|| {
        let mut fresh = [0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut fresh);
        fresh
    });

    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| anyhow::anyhow!("invalid Argon2id params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password.expose_secret().as_bytes(), &salt, &mut key)
        .map_err(|e| anyhow::anyhow!("Argon2id KDF failed: {e}"))?;

    Ok(Digest {
        key: MasterKey::from_bytes(key),
        salt,
    })
}
