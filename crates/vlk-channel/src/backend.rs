//! Transport backend: the rate-limited, list-shaped remote resource.
//!
//! Production backends wrap a third-party collaboration API; the in-memory
//! implementation here backs tests and local development.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

/// One item on the remote list: a unique label and an opaque body.
#[derive(Debug, Clone)]
pub struct MailItem {
    pub id: u64,
    pub label: String,
    pub body: String,
}

#[async_trait]
pub trait MailBackend: Send + Sync {
    /// List every current item. Called once per poll interval.
    async fn fetch_items(&self) -> anyhow::Result<Vec<MailItem>>;

    /// Append an item.
    async fn add_item(&self, label: &str, body: &str) -> anyhow::Result<()>;

    /// Delete an item by id. Deleting an unknown id is not an error.
    async fn remove_item(&self, id: u64) -> anyhow::Result<()>;
}

/// In-memory backend shared between channel instances in tests.
#[derive(Default)]
pub struct MemoryBackend {
    items: Mutex<Vec<MailItem>>,
    next_id: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("backend lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MailBackend for MemoryBackend {
    async fn fetch_items(&self) -> anyhow::Result<Vec<MailItem>> {
        Ok(self.items.lock().expect("backend lock poisoned").clone())
    }

    async fn add_item(&self, label: &str, body: &str) -> anyhow::Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.items
            .lock()
            .expect("backend lock poisoned")
            .push(MailItem {
                id,
                label: label.into(),
                body: body.into(),
            });
        Ok(())
    }

    async fn remove_item(&self, id: u64) -> anyhow::Result<()> {
        self.items
            .lock()
            .expect("backend lock poisoned")
            .retain(|item| item.id != id);
        Ok(())
    }
}
