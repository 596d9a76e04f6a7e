//! vlk-crypto: envelope encryption for vaultlink payloads
//!
//! Two-tier wrapping with XChaCha20-Poly1305:
//!
//! ```text
//! Password ──Argon2id──▶ Digest (256-bit, salted)
//!   └── wraps ──▶ Content Key (256-bit random)
//!         └── seals ──▶ vault payload
//! ```
//!
//! The two tiers decouple who can open the vault (password) from what
//! protects the bytes (content key): rotating the password re-wraps the
//! 32-byte key, not the payload. Once a session or master key exists,
//! single-tier sealing skips the password derivation entirely.
//!
//! Everything that crosses a boundary — file, URL fragment, mailbox body —
//! is framed by [`frame`]: URL-safe base64 over a small tagged structure.

pub mod envelope;
pub mod frame;
pub mod kdf;
pub mod sealed;

pub use envelope::{
    decrypt_secrets, decrypt_with_master, encrypt_secrets, encrypt_with_master, VaultCiphertext,
};
pub use frame::{from_wire, to_wire};
pub use kdf::{digest, Digest, KdfParams, MasterKey};
pub use sealed::{open, seal, SealedBox};

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

/// Size of an Argon2id salt
pub const SALT_SIZE: usize = 16;
