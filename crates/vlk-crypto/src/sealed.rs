//! AEAD primitive: XChaCha20-Poly1305 with a random nonce per encryption
//! and a detached authentication tag.
//!
//! A `SealedBox` is the serialized form every encrypted value takes on disk
//! and on the wire: `{ iv, tag, data }`, each field standard base64.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{KEY_SIZE, NONCE_SIZE, TAG_SIZE};

/// One AEAD-encrypted value with its nonce and detached tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedBox {
    /// 24-byte nonce (base64)
    pub iv: String,
    /// 16-byte Poly1305 tag (base64)
    pub tag: String,
    /// Ciphertext without the tag (base64)
    pub data: String,
}

/// Encrypt `plaintext` under a 256-bit key with a fresh random nonce.
pub fn seal(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> anyhow::Result<SealedBox> {
    let cipher = XChaCha20Poly1305::new(key.into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let mut combined = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| anyhow::anyhow!("AEAD encryption failed: {e}"))?;

    // The aead crate appends the tag; detach it for the wire form
    let tag_offset = combined.len() - TAG_SIZE;
    let tag = combined.split_off(tag_offset);

    Ok(SealedBox {
        iv: b64_encode(&nonce_bytes),
        tag: b64_encode(&tag),
        data: b64_encode(&combined),
    })
}

/// Decrypt a `SealedBox`, verifying the tag before returning plaintext.
///
/// Fails closed: any tag mismatch or malformed field is an error, never
/// partial plaintext.
pub fn open(key: &[u8; KEY_SIZE], boxed: &SealedBox) -> anyhow::Result<Vec<u8>> {
    let nonce_bytes = b64_decode(&boxed.iv)?;
    if nonce_bytes.len() != NONCE_SIZE {
        anyhow::bail!(
            "bad nonce length: {} bytes (expected {NONCE_SIZE})",
            nonce_bytes.len()
        );
    }
    let tag = b64_decode(&boxed.tag)?;
    if tag.len() != TAG_SIZE {
        anyhow::bail!("bad tag length: {} bytes (expected {TAG_SIZE})", tag.len());
    }

    let mut combined = b64_decode(&boxed.data)?;
    combined.extend_from_slice(&tag);

    let cipher = XChaCha20Poly1305::new(key.into());
    let nonce = XNonce::from_slice(&nonce_bytes);

    cipher
        .decrypt(nonce, combined.as_ref())
        .map_err(|_| anyhow::anyhow!("AEAD decryption failed: wrong key or corrupted data"))
}

/// Decrypt into a fixed-size key buffer, zeroizing the intermediate vec.
pub(crate) fn open_key(key: &[u8; KEY_SIZE], boxed: &SealedBox) -> anyhow::Result<[u8; KEY_SIZE]> {
    let mut plaintext = open(key, boxed)?;
    if plaintext.len() != KEY_SIZE {
        plaintext.zeroize();
        anyhow::bail!(
            "unwrapped key has wrong size: {} bytes (expected {KEY_SIZE})",
            plaintext.len()
        );
    }
    let mut out = [0u8; KEY_SIZE];
    out.copy_from_slice(&plaintext);
    plaintext.zeroize();
    Ok(out)
}

pub(crate) fn b64_encode(data: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.encode(data)
}

pub(crate) fn b64_decode(s: &str) -> anyhow::Result<Vec<u8>> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD
        .decode(s)
        .map_err(|e| anyhow::anyhow!("base64 decode: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let key = [7u8; KEY_SIZE];
        let boxed = seal(&key, b"attack at dawn").unwrap();
        let plaintext = open(&key, &boxed).unwrap();
        assert_eq!(plaintext, b"attack at dawn");
    }

    #[test]
    fn test_open_wrong_key_fails() {
        let boxed = seal(&[1u8; KEY_SIZE], b"secret").unwrap();
        assert!(open(&[2u8; KEY_SIZE], &boxed).is_err());
    }

    #[test]
    fn test_open_tampered_tag_fails() {
        let key = [9u8; KEY_SIZE];
        let mut boxed = seal(&key, b"secret").unwrap();
        boxed.tag = b64_encode(&[0u8; TAG_SIZE]);
        assert!(open(&key, &boxed).is_err());
    }

    #[test]
    fn test_open_tampered_data_fails() {
        let key = [9u8; KEY_SIZE];
        let mut boxed = seal(&key, b"a longer secret payload").unwrap();
        let mut raw = b64_decode(&boxed.data).unwrap();
        raw[0] ^= 0xff;
        boxed.data = b64_encode(&raw);
        assert!(open(&key, &boxed).is_err());
    }

    #[test]
    fn test_nonces_are_fresh() {
        let key = [3u8; KEY_SIZE];
        let a = seal(&key, b"same plaintext").unwrap();
        let b = seal(&key, b"same plaintext").unwrap();
        assert_ne!(a.iv, b.iv, "nonces must be random per encryption");
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn test_empty_plaintext() {
        let key = [5u8; KEY_SIZE];
        let boxed = seal(&key, b"").unwrap();
        assert_eq!(open(&key, &boxed).unwrap(), b"");
    }
}
