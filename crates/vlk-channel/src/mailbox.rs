//! Address-keyed rendezvous: `get` suspends a single reader, `give` hands
//! off directly or caches for a future reader.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::ChannelError;

/// A full channel address. Two instances with distinct scopes can never
/// collide even when operation ids and tags are reused; to keep that
/// guarantee, no component may contain the `:` separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub scope: String,
    pub op_id: String,
    pub tag: String,
}

impl Address {
    pub fn new(scope: &str, op_id: &str, tag: &str) -> Self {
        Self {
            scope: scope.into(),
            op_id: op_id.into(),
            tag: tag.into(),
        }
    }

    /// The item label carried on the backend: `scope:op:tag`.
    pub fn label(&self) -> String {
        format!("{}:{}:{}", self.scope, self.op_id, self.tag)
    }

    /// Parse a backend label. `None` for labels that are not channel
    /// addresses at all.
    pub fn parse(label: &str) -> Option<Self> {
        let mut parts = label.splitn(3, ':');
        let scope = parts.next()?;
        let op_id = parts.next()?;
        let tag = parts.next()?;
        Some(Self::new(scope, op_id, tag))
    }
}

enum Slot {
    Waiting(oneshot::Sender<String>),
    Ready(String),
}

/// One scope's worth of addressed slots.
///
/// Invariant: at most one live waiter and at most one cached value per
/// address, never both.
pub struct Mailbox {
    scope: String,
    slots: Mutex<HashMap<(String, String), Slot>>,
}

impl Mailbox {
    pub fn new(scope: &str) -> Self {
        Self {
            scope: scope.into(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn address(&self, op_id: &str, tag: &str) -> Address {
        Address::new(&self.scope, op_id, tag)
    }

    /// A component containing the separator would produce a label that
    /// parses back to a different address, letting scopes collide.
    pub(crate) fn check_address(&self, op_id: &str, tag: &str) -> Result<(), ChannelError> {
        if self.scope.contains(':') || op_id.contains(':') || tag.contains(':') {
            return Err(ChannelError::InvalidAddress(
                self.address(op_id, tag).label(),
            ));
        }
        Ok(())
    }

    /// Consume a cached value immediately, or register as the single
    /// waiter and suspend until a matching `give`.
    pub async fn get(&self, op_id: &str, tag: &str) -> Result<String, ChannelError> {
        self.check_address(op_id, tag)?;
        let rx = {
            let mut slots = self.slots.lock().expect("mailbox lock poisoned");
            let key = (op_id.to_string(), tag.to_string());
            match slots.remove(&key) {
                Some(Slot::Ready(value)) => return Ok(value),
                Some(Slot::Waiting(tx)) => {
                    // Put the existing waiter back untouched
                    slots.insert(key, Slot::Waiting(tx));
                    return Err(ChannelError::DuplicateWaiter(
                        self.address(op_id, tag).label(),
                    ));
                }
                None => {
                    let (tx, rx) = oneshot::channel();
                    slots.insert(key, Slot::Waiting(tx));
                    rx
                }
            }
        };

        rx.await.map_err(|_| ChannelError::Stopped)
    }

    /// [`Mailbox::get`] with an upper bound on the wait. On timeout the
    /// waiter registration is removed so the address is clean for a retry.
    pub async fn get_within(
        &self,
        op_id: &str,
        tag: &str,
        wait: Duration,
    ) -> Result<String, ChannelError> {
        match tokio::time::timeout(wait, self.get(op_id, tag)).await {
            Ok(result) => result,
            Err(_) => {
                self.deregister(op_id, tag);
                Err(ChannelError::Timeout(self.address(op_id, tag).label()))
            }
        }
    }

    /// Hand a value to the registered waiter, or cache it for the next
    /// `get`. A second value at an occupied address is an error.
    pub fn give(&self, op_id: &str, tag: &str, value: String) -> Result<(), ChannelError> {
        self.check_address(op_id, tag)?;
        let mut slots = self.slots.lock().expect("mailbox lock poisoned");
        let key = (op_id.to_string(), tag.to_string());
        match slots.remove(&key) {
            Some(Slot::Waiting(tx)) => {
                if let Err(value) = tx.send(value) {
                    // Reader timed out between give and send; keep the value
                    slots.insert(key, Slot::Ready(value));
                }
                Ok(())
            }
            Some(Slot::Ready(old)) => {
                slots.insert(key, Slot::Ready(old));
                Err(ChannelError::AddressOccupied(
                    self.address(op_id, tag).label(),
                ))
            }
            None => {
                slots.insert(key, Slot::Ready(value));
                Ok(())
            }
        }
    }

    /// Drop a dangling waiter registration. A value that raced in stays
    /// cached.
    fn deregister(&self, op_id: &str, tag: &str) {
        let mut slots = self.slots.lock().expect("mailbox lock poisoned");
        let key = (op_id.to_string(), tag.to_string());
        if let Some(Slot::Waiting(_)) = slots.get(&key) {
            slots.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_give_before_get_resolves_immediately() {
        let mailbox = Mailbox::new("test");
        mailbox.give("op", "tag", "hello".into()).unwrap();
        assert_eq!(mailbox.get("op", "tag").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_get_before_give_suspends_until_delivery() {
        let mailbox = std::sync::Arc::new(Mailbox::new("test"));

        let reader = {
            let mailbox = mailbox.clone();
            tokio::spawn(async move { mailbox.get("op", "tag").await })
        };
        tokio::task::yield_now().await;

        mailbox.give("op", "tag", "later".into()).unwrap();
        assert_eq!(reader.await.unwrap().unwrap(), "later");
    }

    #[tokio::test]
    async fn test_duplicate_waiter_is_an_error() {
        let mailbox = std::sync::Arc::new(Mailbox::new("test"));

        let _first = {
            let mailbox = mailbox.clone();
            tokio::spawn(async move { mailbox.get("op", "tag").await })
        };
        tokio::task::yield_now().await;

        let second = mailbox
            .get_within("op", "tag", Duration::from_millis(50))
            .await;
        assert!(matches!(second, Err(ChannelError::DuplicateWaiter(_))));
    }

    #[tokio::test]
    async fn test_second_cached_value_is_an_error() {
        let mailbox = Mailbox::new("test");
        mailbox.give("op", "tag", "one".into()).unwrap();
        let second = mailbox.give("op", "tag", "two".into());
        assert!(matches!(second, Err(ChannelError::AddressOccupied(_))));

        // The first value is untouched
        assert_eq!(mailbox.get("op", "tag").await.unwrap(), "one");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_deregisters_the_waiter() {
        let mailbox = Mailbox::new("test");

        let result = mailbox
            .get_within("op", "tag", Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(ChannelError::Timeout(_))));

        // Address is clean: a new give caches normally, a new get consumes
        mailbox.give("op", "tag", "fresh".into()).unwrap();
        assert_eq!(mailbox.get("op", "tag").await.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn test_distinct_tags_do_not_interfere() {
        let mailbox = Mailbox::new("test");
        mailbox.give("op", "a", "va".into()).unwrap();
        mailbox.give("op", "b", "vb".into()).unwrap();
        assert_eq!(mailbox.get("op", "b").await.unwrap(), "vb");
        assert_eq!(mailbox.get("op", "a").await.unwrap(), "va");
    }

    #[tokio::test]
    async fn test_separator_in_component_is_rejected() {
        let mailbox = Mailbox::new("test");
        assert!(matches!(
            mailbox.give("op", "y:z", "v".into()),
            Err(ChannelError::InvalidAddress(_))
        ));
        assert!(matches!(
            mailbox.get("a:b", "tag").await,
            Err(ChannelError::InvalidAddress(_))
        ));

        // A scope containing the separator poisons every address in it
        let nested = Mailbox::new("A:x");
        assert!(matches!(
            nested.give("op", "tag", "v".into()),
            Err(ChannelError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_address_label_roundtrip() {
        let addr = Address::new("pake", "root", "auth_request");
        assert_eq!(addr.label(), "pake:root:auth_request");
        assert_eq!(Address::parse(&addr.label()).unwrap(), addr);
        assert!(Address::parse("not-an-address").is_none());
    }
}
