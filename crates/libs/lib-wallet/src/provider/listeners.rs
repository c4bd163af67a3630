//! Event listener bookkeeping shared by provider implementations.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{EventHandler, ListenerId, ProviderEvent, ProviderEventKind};

/// Registered handlers, keyed by event kind and listener id.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, ProviderEventKind, EventHandler)>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: ProviderEventKind, handler: EventHandler) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.listeners.write().push((id, kind, handler));
        id
    }

    pub fn remove(&self, kind: ProviderEventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(lid, lkind, _)| !(*lid == id && *lkind == kind));
        listeners.len() != before
    }

    /// Deliver `event` to every handler subscribed to its kind.
    ///
    /// Handlers run outside the lock so they may subscribe or unsubscribe.
    /// Returns the number of handlers invoked.
    pub fn emit(&self, event: &ProviderEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<EventHandler> = self
            .listeners
            .read()
            .iter()
            .filter(|(_, lkind, _)| *lkind == kind)
            .map(|(_, _, handler)| handler.clone())
            .collect();

        for handler in &handlers {
            handler(event.clone());
        }

        handlers.len()
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
