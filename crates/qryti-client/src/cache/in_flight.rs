//! Registry of outstanding GET requests, keyed like the cache.
//!
//! Each registration gets a ticket. A request that settles only removes the
//! entry carrying its own ticket, so an entry that was detached (logout,
//! invalidation) and re-registered is never removed by the older request.

use std::collections::HashMap;

#[derive(Debug)]
struct Pending<F> {
    ticket: u64,
    path: String,
    handle: F,
}

/// At most one pending handle per key
#[derive(Debug)]
pub struct InFlightRegistry<F> {
    entries: HashMap<String, Pending<F>>,
    next_ticket: u64,
}

impl<F: Clone> InFlightRegistry<F> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_ticket: 0,
        }
    }

    /// Handle of the outstanding request for `key`
    pub fn get(&self, key: &str) -> Option<F> {
        self.entries.get(key).map(|pending| pending.handle.clone())
    }

    /// Register a new request for `key`, building its handle from the ticket.
    ///
    /// Replaces any handle already registered for the key; callers check
    /// [`get`](Self::get) first under the same lock.
    pub fn register<M>(&mut self, key: String, path: String, make: M) -> F
    where
        M: FnOnce(u64) -> F,
    {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let handle = make(ticket);
        self.entries.insert(
            key,
            Pending {
                ticket,
                path,
                handle: handle.clone(),
            },
        );
        handle
    }

    /// Remove the entry for `key` if it still carries `ticket`.
    ///
    /// Returns false when the entry was detached or replaced in the meantime.
    pub fn complete(&mut self, key: &str, ticket: u64) -> bool {
        match self.entries.get(key) {
            Some(pending) if pending.ticket == ticket => {
                self.entries.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Detach every request whose path matches
    pub fn detach_where<P>(&mut self, mut matches: P) -> usize
    where
        P: FnMut(&str) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|_, pending| !matches(&pending.path));
        before - self.entries.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: Clone> Default for InFlightRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_complete() {
        let mut registry = InFlightRegistry::new();
        let handle = registry.register("k".to_string(), "/models".to_string(), |t| t * 10);
        assert_eq!(handle, 10);
        assert_eq!(registry.get("k"), Some(10));

        assert!(registry.complete("k", 1));
        assert!(!registry.contains("k"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_stale_ticket_does_not_remove_newer_entry() {
        let mut registry = InFlightRegistry::new();
        registry.register("k".to_string(), "/models".to_string(), |t| t);
        registry.clear();
        registry.register("k".to_string(), "/models".to_string(), |t| t);

        assert!(!registry.complete("k", 1));
        assert_eq!(registry.get("k"), Some(2));
        assert!(registry.complete("k", 2));
    }

    #[test]
    fn test_detach_where() {
        let mut registry = InFlightRegistry::new();
        registry.register("a".to_string(), "/models".to_string(), |t| t);
        registry.register("b".to_string(), "/models/3".to_string(), |t| t);
        registry.register("c".to_string(), "/clients".to_string(), |t| t);

        let detached = registry.detach_where(|path| path.starts_with("/models"));
        assert_eq!(detached, 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("c"));
    }
}
