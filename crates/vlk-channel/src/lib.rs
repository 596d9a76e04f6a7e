//! vlk-channel: request/response RPC over a polled, rate-limited list.
//!
//! The [`Mailbox`] is the rendezvous primitive: values keyed by
//! `(scope, operation-id, tag)` with exactly one waiting reader or one
//! cached value per address. The [`relay`] turns a remote list resource —
//! anything implementing [`MailBackend`] — into deliveries to that
//! mailbox, serializing all mutations through a FIFO so writes never
//! interleave with polls.
//!
//! The channel carries opaque string bodies; payloads are framed and
//! encrypted before they get here.

pub mod backend;
pub mod mailbox;
pub mod relay;

pub use backend::{MailBackend, MailItem, MemoryBackend};
pub use mailbox::{Address, Mailbox};
pub use relay::{Channel, RelayConfig, RelayState};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    /// No message arrived within the allotted wait. Recoverable: the
    /// caller decides whether to re-issue or abandon.
    #[error("timed out waiting at {0}")]
    Timeout(String),

    /// A reader is already registered at this address — a programming
    /// error in the caller, never retried.
    #[error("a reader is already waiting at {0}")]
    DuplicateWaiter(String),

    /// A value is already cached at this address.
    #[error("a value is already cached at {0}")]
    AddressOccupied(String),

    /// An address component contains the `:` separator, so the label
    /// would not parse back to the same address — a programming error in
    /// the caller, never retried.
    #[error("address component contains the separator: {0}")]
    InvalidAddress(String),

    /// The channel's relay has stopped; no further delivery is possible.
    #[error("channel relay stopped")]
    Stopped,
}
