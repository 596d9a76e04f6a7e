//! Per-user server state and the password-wrapped client envelope.

use serde::{Deserialize, Serialize};

use vlk_crypto::{MasterKey, SealedBox, KEY_SIZE};

use crate::PakeError;

/// Everything the server stores per registered user. Scalars and points
/// are base64 strings so the record serializes the same way it travels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub user_id: String,
    /// OPRF key `ks` (scalar).
    pub ks: String,
    /// Server static private key `ps` (scalar).
    pub ps: String,
    /// Server static public key `Ps`.
    pub server_public: String,
    /// Client static public key `Pu`.
    pub client_public: String,
    /// [`ClientEnvelope`] sealed under the hardened OPRF output `rw`.
    pub envelope: SealedBox,
}

impl CredentialRecord {
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| anyhow::anyhow!("serialize credential record: {e}"))
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| anyhow::anyhow!("parse credential record: {e}"))
    }
}

/// The client's long-term keys, recoverable only with the password.
/// Sealed under `rw` and handed back during every login attempt; a wrong
/// password fails the AEAD open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEnvelope {
    /// Client static private key `pu` (scalar).
    pub pu: String,
    /// Client static public key `Pu`.
    pub client_public: String,
    /// Server static public key `Ps`, pinned at registration.
    pub server_public: String,
}

impl ClientEnvelope {
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| anyhow::anyhow!("serialize client envelope: {e}"))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PakeError> {
        serde_json::from_slice(bytes).map_err(|_| PakeError::WrongPassword)
    }
}

/// The mutually authenticated session key both sides hold after a
/// successful handshake. Zeroized on drop.
pub struct SessionKey {
    bytes: [u8; KEY_SIZE],
}

impl SessionKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Hand the key to the envelope layer for vault encryption.
    pub fn to_master_key(&self) -> MasterKey {
        MasterKey::from_bytes(self.bytes)
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
