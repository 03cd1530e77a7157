//! Handle resolution and its memoizing cache.
//!
//! A handle names a resolution slot, not interned content. The first
//! successful `resolve` of a slot stores the value; every later access
//! returns the stored value without calling the resolver again. A failed
//! resolve stores nothing, so the slot stays unresolved and the next access
//! retries.

use crate::ids::HandleId;
use log::{debug, trace};
use std::cell::OnceCell;

/// Maps a raw handle to its runtime value.
///
/// Must behave as a pure function of `handle` for memoization to be
/// sound. Retrying after an error relies on the resolver being idempotent.
pub trait Resolver {
    type Value;
    type Error;

    fn resolve(&self, handle: u32) -> Result<Self::Value, Self::Error>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    type Value = R::Value;
    type Error = R::Error;

    fn resolve(&self, handle: u32) -> Result<Self::Value, Self::Error> {
        (**self).resolve(handle)
    }
}

/// Adapts a closure into a [`Resolver`].
pub struct FnResolver<F>(pub F);

impl<F, V, E> Resolver for FnResolver<F>
where
    F: Fn(u32) -> Result<V, E>,
{
    type Value = V;
    type Error = E;

    fn resolve(&self, handle: u32) -> Result<V, E> {
        (self.0)(handle)
    }
}

/// State of one resolution slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<V> {
    Unresolved,
    Resolved(V),
}

impl<V> Resolution<V> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn resolved(self) -> Option<V> {
        match self {
            Resolution::Resolved(value) => Some(value),
            Resolution::Unresolved => None,
        }
    }
}

/// Resolution slots aligned 1:1 with a pool's handle sequence.
///
/// Each slot moves from `Unresolved` to `Resolved` at most once. Slots
/// use interior mutability so resolution works through `&self`; that also
/// makes the cache `!Sync`, confining it to a single thread.
pub struct ResolutionCache<V> {
    slots: Vec<OnceCell<V>>,
}

impl<V> ResolutionCache<V> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Cache with `len` unresolved slots.
    pub fn with_len(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceCell::new()).collect(),
        }
    }

    /// Append an unresolved slot for a newly allocated handle.
    pub fn push_unresolved(&mut self) {
        self.slots.push(OnceCell::new());
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn state(&self, id: HandleId) -> Resolution<&V> {
        match self.slots[id.index()].get() {
            Some(value) => Resolution::Resolved(value),
            None => Resolution::Unresolved,
        }
    }

    /// Number of slots already resolved.
    pub fn resolved_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }

    /// Resolve slot `id`, invoking `resolver` only if the slot is unresolved.
    ///
    /// `handles` is the pool's handle sequence the slots are aligned with.
    /// The resolver runs outside the slot, so a reentrant resolve of the
    /// same slot completes normally; the first value stored wins.
    pub fn resolve<R>(&self, id: HandleId, handles: &[u32], resolver: &R) -> Result<&V, R::Error>
    where
        R: Resolver<Value = V> + ?Sized,
    {
        let slot = &self.slots[id.index()];
        if let Some(value) = slot.get() {
            return Ok(value);
        }

        let handle = handles[id.index()];
        match resolver.resolve(handle) {
            Ok(value) => {
                trace!("resolved slot {} (handle {})", id.raw(), handle);
                Ok(slot.get_or_init(|| value))
            }
            Err(error) => {
                debug!(
                    "resolver failed for slot {} (handle {}), slot left unresolved",
                    id.raw(),
                    handle
                );
                Err(error)
            }
        }
    }
}

impl<V> Default for ResolutionCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn id(raw: u32) -> HandleId {
        HandleId::from_raw(raw).unwrap()
    }

    #[test]
    fn resolves_once_per_slot() {
        let calls = Cell::new(0);
        let resolver = FnResolver(|handle: u32| {
            calls.set(calls.get() + 1);
            Ok::<_, ()>(handle * 10)
        });
        let handles = [4, 4];
        let cache = ResolutionCache::with_len(handles.len());

        assert_eq!(cache.resolve(id(1), &handles, &resolver), Ok(&40));
        assert_eq!(cache.resolve(id(1), &handles, &resolver), Ok(&40));
        assert_eq!(calls.get(), 1);

        // Same raw handle, different slot
        assert_eq!(cache.resolve(id(2), &handles, &resolver), Ok(&40));
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.resolved_count(), 2);
    }

    #[test]
    fn failure_leaves_slot_unresolved() {
        let attempts = Cell::new(0);
        let resolver = FnResolver(|handle: u32| {
            attempts.set(attempts.get() + 1);
            if attempts.get() == 1 {
                Err("not loaded yet")
            } else {
                Ok(handle)
            }
        });
        let handles = [9];
        let cache = ResolutionCache::with_len(1);

        assert_eq!(cache.resolve(id(1), &handles, &resolver), Err("not loaded yet"));
        assert_eq!(cache.state(id(1)), Resolution::Unresolved);

        assert_eq!(cache.resolve(id(1), &handles, &resolver), Ok(&9));
        assert_eq!(cache.state(id(1)), Resolution::Resolved(&9));
        assert_eq!(attempts.get(), 2);
    }

    /// Resolves the same slot again from inside its own resolution.
    struct Reentrant<'a> {
        cache: &'a ResolutionCache<u32>,
        handles: &'a [u32],
        calls: Cell<u32>,
    }

    impl Resolver for Reentrant<'_> {
        type Value = u32;
        type Error = ();

        fn resolve(&self, handle: u32) -> Result<u32, ()> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if call == 1 {
                let nested = *self.cache.resolve(id(1), self.handles, self)?;
                assert_eq!(nested, handle * 10 + 2);
            }
            Ok(handle * 10 + call)
        }
    }

    #[test]
    fn reentrant_resolve_keeps_first_stored_value() {
        let handles = [3];
        let cache = ResolutionCache::with_len(1);
        let resolver = Reentrant {
            cache: &cache,
            handles: &handles,
            calls: Cell::new(0),
        };

        // The nested call stores 32 first; the outer 31 is discarded
        assert_eq!(cache.resolve(id(1), &handles, &resolver), Ok(&32));
        assert_eq!(resolver.calls.get(), 2);

        assert_eq!(cache.resolve(id(1), &handles, &resolver), Ok(&32));
        assert_eq!(cache.state(id(1)), Resolution::Resolved(&32));
        assert_eq!(resolver.calls.get(), 2);
    }

    #[test]
    fn push_unresolved_extends_alignment() {
        let mut cache = ResolutionCache::<u32>::new();
        assert!(cache.is_empty());

        cache.push_unresolved();
        cache.push_unresolved();

        assert_eq!(cache.len(), 2);
        assert!(!cache.state(id(2)).is_resolved());
        assert_eq!(cache.state(id(1)).resolved(), None);
    }
}
