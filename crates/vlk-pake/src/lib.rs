//! vlk-pake: password-authenticated key exchange over the message channel
//!
//! An OPAQUE-style protocol on ristretto255: the server holds a per-user
//! credential record (the "pepper") — an OPRF key share, its own static
//! keypair, the client's static public key, and an AEAD envelope wrapping
//! the client's static keys under a password-rehydratable key. Neither the
//! password nor a password-equivalent ever crosses the channel.
//!
//! Login combines an OPRF evaluation (blind → evaluate → unblind → iterated
//! hardening) with a triple Diffie-Hellman over both parties' static and
//! ephemeral keys, then mutual key-confirmation tags. Every protocol
//! message travels as a framed body through `vlk-channel`; each handshake's
//! ephemeral state lives only inside the engine call that created it.
//!
//! Failure is binary on the wire: an observer of the channel sees only
//! `AuthResult { ok: false }`, never which check failed. The named errors
//! below stay on the failing party's side.

pub mod client;
pub mod group;
pub mod messages;
pub mod record;
pub mod server;

pub use messages::HandshakeMessage;
pub use record::{ClientEnvelope, CredentialRecord, SessionKey};

use thiserror::Error;
use vlk_channel::ChannelError;

/// OPRF output hardening rounds, shared with the `[pake]` config section.
/// Configurable but never negotiated at runtime.
pub const DEFAULT_ITERATIONS: u32 = vlk_core::config::PakeConfig::DEFAULT_ITERATIONS;

#[derive(Debug, Error)]
pub enum PakeError {
    /// A received value did not decode to a valid group element.
    #[error("received value is not a valid group element")]
    InvalidGroupElement,

    /// The credential envelope did not open, or its contents are not a
    /// consistent keypair — the presented password is wrong.
    #[error("credential envelope rejected the derived key (wrong password)")]
    WrongPassword,

    /// The server's confirmation value did not match ours.
    #[error("server confirmation mismatch")]
    ServerConfirmMismatch,

    /// The client's confirmation value did not match ours.
    #[error("client confirmation mismatch")]
    ClientConfirmMismatch,

    /// The peer's final result flag denied the handshake.
    #[error("peer denied authentication")]
    Denied,

    /// A well-formed message of the wrong kind arrived at this address.
    #[error("unexpected message: {0}")]
    UnexpectedMessage(&'static str),

    /// The persisted credential record failed to decode.
    #[error("stored credential record is corrupt")]
    InvalidRecord,

    /// The body at this address was not a valid protocol frame.
    #[error("malformed wire payload: {0}")]
    Wire(String),

    /// No message arrived within the caller's allotted wait. Recoverable;
    /// the caller decides whether to re-issue the handshake.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error(transparent)]
    Channel(ChannelError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ChannelError> for PakeError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Timeout(addr) => PakeError::Timeout(addr),
            other => PakeError::Channel(other),
        }
    }
}
