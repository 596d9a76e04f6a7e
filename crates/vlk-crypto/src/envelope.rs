//! Two-tier vault wrapping and single-tier master-key sealing.

use rand::RngCore;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::kdf::{digest, KdfParams, MasterKey};
use crate::sealed::{b64_decode, b64_encode, open, open_key, seal, SealedBox};
use crate::{KEY_SIZE, SALT_SIZE};

/// Encrypted vault payload: the KDF salt, the wrapped content key, and the
/// payload sealed under the content key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultCiphertext {
    /// Argon2id salt (base64)
    pub salt: String,
    /// Content key sealed under the password digest
    pub wrapped_key: SealedBox,
    /// Payload sealed under the content key
    pub data: SealedBox,
}

/// Encrypt `plaintext` under a password.
///
/// A random 32-byte content key protects the payload; the password digest
/// wraps only the key. Password rotation re-wraps 32 bytes, not the vault.
pub fn encrypt_secrets(
    password: &SecretString,
    plaintext: &[u8],
    params: &KdfParams,
) -> anyhow::Result<VaultCiphertext> {
    let derived = digest(password, None, params)?;

    let mut content_key = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut content_key);

    let wrapped_key = seal(derived.key.as_bytes(), &content_key)?;
    let data = seal(&content_key, plaintext)?;
    content_key.zeroize();

    Ok(VaultCiphertext {
        salt: b64_encode(&derived.salt),
        wrapped_key,
        data,
    })
}

/// Decrypt a [`VaultCiphertext`] with the password that produced it.
///
/// A wrong password fails at the wrapped-key tag, before the payload is
/// touched.
pub fn decrypt_secrets(
    password: &SecretString,
    ciphertext: &VaultCiphertext,
    params: &KdfParams,
) -> anyhow::Result<Vec<u8>> {
    let salt_bytes = b64_decode(&ciphertext.salt)?;
    let salt: [u8; SALT_SIZE] = salt_bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("bad salt length: {} bytes", salt_bytes.len()))?;

    let derived = digest(password, Some(salt), params)?;
    let mut content_key = open_key(derived.key.as_bytes(), &ciphertext.wrapped_key)?;

    let plaintext = open(&content_key, &ciphertext.data);
    content_key.zeroize();
    plaintext
}

/// Single-tier seal under an already-established symmetric key, bypassing
/// password derivation (session/master key transit path).
pub fn encrypt_with_master(master: &MasterKey, plaintext: &[u8]) -> anyhow::Result<SealedBox> {
    seal(master.as_bytes(), plaintext)
}

/// Inverse of [`encrypt_with_master`].
pub fn decrypt_with_master(master: &MasterKey, boxed: &SealedBox) -> anyhow::Result<Vec<u8>> {
    open(master.as_bytes(), boxed)
}
