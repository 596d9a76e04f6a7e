//! Polling relay: the background task that bridges a [`MailBackend`] to a
//! [`Mailbox`].
//!
//! One relay per channel instance. Each tick it is in exactly one state:
//!
//! ```text
//! Idle ─▶ Polling ──────────────▶ Stopped
//!    └──▶ Mutating ─▶ Draining ─┘
//! ```
//!
//! Mutations (add/remove) queue on a FIFO and drain one per tick, strictly
//! between polls; no read is issued while mutations are pending, so writes
//! take priority and never interleave with a fetch. Cancellation is
//! cooperative: the done flag is checked once per iteration and in-flight
//! backend calls complete. The relay has no deadline of its own — callers
//! bound waits through [`Mailbox::get_within`].

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::{MailBackend, MailItem};
use crate::mailbox::{Address, Mailbox};
use crate::ChannelError;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Fixed inter-poll delay (production default: 5 s)
    pub poll_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl RelayConfig {
    /// Short interval for local/dev backends without a rate limit.
    pub fn dev() -> Self {
        Self {
            poll_interval: Duration::from_millis(25),
        }
    }
}

impl From<&vlk_core::config::ChannelConfig> for RelayConfig {
    fn from(config: &vlk_core::config::ChannelConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Polling,
    Mutating,
    Draining,
    Stopped,
}

#[derive(Debug)]
enum Mutation {
    Add { label: String, body: String },
    Remove { id: u64 },
    /// Cleanup drain: delete every remaining item in this channel's scope.
    RemoveAll,
    /// Deterministic-stop marker; exists only to be drained.
    Nop,
}

/// An addressable request/response channel over a polled backend.
///
/// `give` enqueues an add-item mutation; `get` suspends on the mailbox
/// until the relay delivers a matching item.
pub struct Channel {
    mailbox: Arc<Mailbox>,
    queue: Arc<Mutex<VecDeque<Mutation>>>,
    done: CancellationToken,
    state_rx: watch::Receiver<RelayState>,
    handle: JoinHandle<()>,
}

impl Channel {
    /// Create the mailbox and spawn the relay task.
    pub fn spawn(scope: &str, backend: Arc<dyn MailBackend>, config: RelayConfig) -> Self {
        let mailbox = Arc::new(Mailbox::new(scope));
        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let done = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(RelayState::Idle);

        let handle = tokio::spawn(relay_loop(
            mailbox.clone(),
            backend,
            queue.clone(),
            done.clone(),
            state_tx,
            config,
        ));

        Self {
            mailbox,
            queue,
            done,
            state_rx,
            handle,
        }
    }

    pub fn scope(&self) -> &str {
        self.mailbox.scope()
    }

    /// The rendezvous primitive, for callers that need direct access.
    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    /// Enqueue a message for the peer: an add-item mutation carrying the
    /// address label and the (already framed) body.
    pub fn give(&self, op_id: &str, tag: &str, body: String) -> Result<(), ChannelError> {
        if self.done.is_cancelled() {
            return Err(ChannelError::Stopped);
        }
        self.mailbox.check_address(op_id, tag)?;
        let label = Address::new(self.mailbox.scope(), op_id, tag).label();
        self.queue
            .lock()
            .expect("relay queue lock poisoned")
            .push_back(Mutation::Add { label, body });
        Ok(())
    }

    /// Wait for a message at `(scope, op_id, tag)` with no deadline.
    pub async fn get(&self, op_id: &str, tag: &str) -> Result<String, ChannelError> {
        self.mailbox.get(op_id, tag).await
    }

    /// Wait with an upper bound; the waiter is deregistered on timeout.
    pub async fn get_within(
        &self,
        op_id: &str,
        tag: &str,
        wait: Duration,
    ) -> Result<String, ChannelError> {
        self.mailbox.get_within(op_id, tag, wait).await
    }

    /// Request a stop after the current iteration. With `cleanup`, a
    /// remove-all drain runs first; a final no-op marks the queue end so
    /// the stop is deterministic.
    pub fn shutdown(&self, cleanup: bool) {
        {
            let mut queue = self.queue.lock().expect("relay queue lock poisoned");
            if cleanup {
                queue.push_back(Mutation::RemoveAll);
            }
            queue.push_back(Mutation::Nop);
        }
        self.done.cancel();
    }

    /// Current relay state.
    pub fn state(&self) -> RelayState {
        *self.state_rx.borrow()
    }

    /// Suspend until the relay reaches `Stopped`.
    pub async fn stopped(&self) {
        let mut rx = self.state_rx.clone();
        while *rx.borrow_and_update() != RelayState::Stopped {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    /// Await the relay task after a shutdown request.
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

async fn relay_loop(
    mailbox: Arc<Mailbox>,
    backend: Arc<dyn MailBackend>,
    queue: Arc<Mutex<VecDeque<Mutation>>>,
    done: CancellationToken,
    state_tx: watch::Sender<RelayState>,
    config: RelayConfig,
) {
    let mut seen: HashSet<u64> = HashSet::new();
    let mut own: HashSet<String> = HashSet::new();
    let scope = mailbox.scope().to_string();

    loop {
        let pending = queue
            .lock()
            .expect("relay queue lock poisoned")
            .pop_front();

        match pending {
            Some(mutation) => {
                let more = !queue
                    .lock()
                    .expect("relay queue lock poisoned")
                    .is_empty();
                let _ = state_tx.send(if more {
                    RelayState::Draining
                } else {
                    RelayState::Mutating
                });

                match apply_mutation(&*backend, &scope, &mutation).await {
                    Ok(()) => {
                        // Remember own outbound labels so the echo is not
                        // delivered back into this channel's mailbox
                        if let Mutation::Add { label, .. } = &mutation {
                            own.insert(label.clone());
                        }
                    }
                    Err(e) => {
                        if done.is_cancelled() {
                            warn!(scope, error = %e, ?mutation, "dropping failed mutation during shutdown");
                        } else {
                            warn!(scope, error = %e, ?mutation, "mutation failed; retrying next tick");
                            queue
                                .lock()
                                .expect("relay queue lock poisoned")
                                .push_front(mutation);
                        }
                    }
                }
            }
            None => {
                if done.is_cancelled() {
                    break;
                }
                let _ = state_tx.send(RelayState::Polling);
                match backend.fetch_items().await {
                    Ok(items) => deliver(&mailbox, &items, &mut seen, &own),
                    Err(e) => warn!(scope, error = %e, "poll failed; continuing"),
                }
            }
        }

        // Sleep one interval, or fall through at once when cancellation
        // arrives so the queue drains without delay.
        tokio::select! {
            _ = done.cancelled() => {}
            _ = tokio::time::sleep(config.poll_interval) => {}
        }
    }

    let _ = state_tx.send(RelayState::Stopped);
    debug!(scope, "relay stopped");
}

async fn apply_mutation(
    backend: &dyn MailBackend,
    scope: &str,
    mutation: &Mutation,
) -> anyhow::Result<()> {
    match mutation {
        Mutation::Add { label, body } => {
            backend.add_item(label, body).await?;
            debug!(scope, label, "item added");
        }
        Mutation::Remove { id } => {
            backend.remove_item(*id).await?;
            debug!(scope, id, "item removed");
        }
        Mutation::RemoveAll => {
            let items = backend.fetch_items().await?;
            for item in items {
                let ours = Address::parse(&item.label)
                    .map(|addr| addr.scope == scope)
                    .unwrap_or(false);
                if ours {
                    backend.remove_item(item.id).await?;
                }
            }
            debug!(scope, "scope items cleared");
        }
        Mutation::Nop => {}
    }
    Ok(())
}

/// Hand every unseen item in this channel's scope to the mailbox. Items
/// this channel added itself echo back through the shared list and are
/// skipped, never cached.
fn deliver(mailbox: &Mailbox, items: &[MailItem], seen: &mut HashSet<u64>, own: &HashSet<String>) {
    for item in items {
        if seen.contains(&item.id) {
            continue;
        }
        let Some(addr) = Address::parse(&item.label) else {
            continue;
        };
        if addr.scope != mailbox.scope() {
            continue;
        }
        seen.insert(item.id);
        if own.contains(&item.label) {
            continue;
        }

        match mailbox.give(&addr.op_id, &addr.tag, item.body.clone()) {
            Ok(()) => debug!(label = %item.label, id = item.id, "delivered"),
            // A replayed or malformed-address item at an occupied slot is
            // logged and dropped
            Err(e) => debug!(label = %item.label, error = %e, "delivery skipped"),
        }
    }
}
