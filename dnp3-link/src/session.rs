//! Link sessions and the session registry

use dnp3_core::{LinkHeader, Route};
use std::fmt;

/// A logical link session bound to one route
///
/// The registry owns the session for as long as it is registered; callers
/// address it through the [`SessionHandle`] returned at registration.
pub trait LinkSession: Send {
    /// Deliver one inbound frame addressed to this session's route
    fn on_frame(&mut self, header: LinkHeader, payload: &[u8]);

    /// Notification that the shared channel came up
    fn on_channel_open(&mut self) {}

    /// Notification that the shared channel went down
    fn on_channel_closed(&mut self) {}
}

/// Generation-checked handle to a registered session
///
/// A handle taken before `remove` goes stale the moment the record is
/// evicted; the registry detects the stale generation and rejects the
/// handle instead of touching a reused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    index: usize,
    generation: u32,
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}v{}", self.index, self.generation)
    }
}

pub(crate) struct SessionRecord {
    pub session: Box<dyn LinkSession>,
    pub route: Route,
    pub enabled: bool,
}

struct Slot {
    generation: u32,
    record: Option<SessionRecord>,
}

/// Ordered collection of session records
///
/// Slots are reused after removal with a bumped generation. Routing order
/// is registration order, which matters only if the one-record-per-route
/// invariant were ever violated; the registry enforces it on insert.
#[derive(Default)]
pub struct SessionRegistry {
    slots: Vec<Slot>,
    order: Vec<SessionHandle>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under a route
    ///
    /// Returns `None` if the route is already bound; the registry is left
    /// unchanged in that case. The new record starts disabled.
    pub fn add(&mut self, session: Box<dyn LinkSession>, route: Route) -> Option<SessionHandle> {
        if self.is_route_in_use(&route) {
            return None;
        }

        let record = SessionRecord {
            session,
            route,
            enabled: false,
        };

        let handle = match self.slots.iter().position(|s| s.record.is_none()) {
            Some(index) => {
                self.slots[index].record = Some(record);
                SessionHandle {
                    index,
                    generation: self.slots[index].generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                SessionHandle {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };

        self.order.push(handle);
        Some(handle)
    }

    /// Remove a record, bumping the slot generation
    ///
    /// Returns `false` for a stale or unknown handle.
    pub fn remove(&mut self, handle: SessionHandle) -> bool {
        match self.slot_mut(handle) {
            Some(slot) => {
                slot.record = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.order.retain(|h| *h != handle);
                true
            }
            None => false,
        }
    }

    fn slot_mut(&mut self, handle: SessionHandle) -> Option<&mut Slot> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation == handle.generation && slot.record.is_some() {
            Some(slot)
        } else {
            None
        }
    }

    pub(crate) fn get(&self, handle: SessionHandle) -> Option<&SessionRecord> {
        let slot = self.slots.get(handle.index)?;
        if slot.generation == handle.generation {
            slot.record.as_ref()
        } else {
            None
        }
    }

    pub(crate) fn get_mut(&mut self, handle: SessionHandle) -> Option<&mut SessionRecord> {
        self.slot_mut(handle).and_then(|s| s.record.as_mut())
    }

    /// Check whether any record is bound to the given route
    pub fn is_route_in_use(&self, route: &Route) -> bool {
        self.iter_records().any(|r| r.route == *route)
    }

    /// Check whether any record is enabled
    pub fn any_enabled(&self) -> bool {
        self.iter_records().any(|r| r.enabled)
    }

    /// Number of registered records
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn iter_records(&self) -> impl Iterator<Item = &SessionRecord> {
        self.order
            .iter()
            .filter_map(|h| self.slots.get(h.index))
            .filter_map(|s| s.record.as_ref())
    }

    /// Find the first enabled record matching an inbound frame header, in
    /// registration order
    pub(crate) fn find_enabled_mut(&mut self, header: &LinkHeader) -> Option<&mut SessionRecord> {
        let order = self.order.clone();
        for handle in order {
            let matches = self
                .get(handle)
                .map(|r| r.enabled && r.route.matches(header))
                .unwrap_or(false);
            if matches {
                return self.get_mut(handle);
            }
        }
        None
    }

    /// Visit every registered session mutably, in registration order
    pub(crate) fn for_each_mut<F: FnMut(&mut SessionRecord)>(&mut self, mut f: F) {
        let order = self.order.clone();
        for handle in order {
            if let Some(record) = self.get_mut(handle) {
                f(record);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSession;

    impl LinkSession for NullSession {
        fn on_frame(&mut self, _header: LinkHeader, _payload: &[u8]) {}
    }

    #[test]
    fn test_add_rejects_duplicate_route() {
        let mut registry = SessionRegistry::new();
        let route = Route::new(1, 10);

        assert!(registry.add(Box::new(NullSession), route).is_some());
        assert!(registry.add(Box::new(NullSession), route).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_stale_handle_is_rejected_after_slot_reuse() {
        let mut registry = SessionRegistry::new();
        let first = registry.add(Box::new(NullSession), Route::new(1, 10)).unwrap();
        assert!(registry.remove(first));

        // The slot is reused with a new generation
        let second = registry.add(Box::new(NullSession), Route::new(2, 20)).unwrap();
        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
        assert!(!registry.remove(first));
        assert!(registry.get(second).is_some());
    }

    #[test]
    fn test_route_freed_on_remove() {
        let mut registry = SessionRegistry::new();
        let route = Route::new(1, 10);
        let handle = registry.add(Box::new(NullSession), route).unwrap();
        assert!(registry.is_route_in_use(&route));

        registry.remove(handle);
        assert!(!registry.is_route_in_use(&route));
        assert!(registry.add(Box::new(NullSession), route).is_some());
    }
}
