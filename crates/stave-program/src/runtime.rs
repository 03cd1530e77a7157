//! Read-only view of a frozen pool plus lazy handle resolution.

use crate::ids::{ArrayId, FloatId, HandleId, NegativeId, SerializableId, StringId, TableId};
use crate::pool::ConstantPool;
use crate::primitive::{Primitive, PrimitiveError};
use crate::resolver::{Resolution, ResolutionCache, Resolver};

/// Runtime constants loaded from an exported pool.
///
/// Plain getters are pure lookups into the pool. `resolve_handle` is the
/// only operation with an effect, and it only touches the resolution cache.
pub struct RuntimeConstants<T, S, R: Resolver> {
    pool: ConstantPool<T, S>,
    resolver: R,
    resolved: ResolutionCache<R::Value>,
}

impl<T, S, R: Resolver> RuntimeConstants<T, S, R> {
    pub fn new(resolver: R, pool: ConstantPool<T, S>) -> Self {
        let resolved = ResolutionCache::with_len(pool.handles.len());
        Self {
            pool,
            resolver,
            resolved,
        }
    }

    pub fn pool(&self) -> &ConstantPool<T, S> {
        &self.pool
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn get_string(&self, id: StringId) -> &str {
        self.pool.get_string(id)
    }

    pub fn get_float(&self, id: FloatId) -> f64 {
        self.pool.get_float(id)
    }

    pub fn get_negative(&self, id: NegativeId) -> i64 {
        self.pool.get_negative(id)
    }

    pub fn get_array(&self, id: ArrayId) -> &[u32] {
        self.pool.get_array(id)
    }

    pub fn get_string_array(&self, id: ArrayId) -> Vec<&str> {
        self.pool.get_string_array(id)
    }

    pub fn get_symbol_table(&self, id: TableId) -> &T {
        self.pool.get_symbol_table(id)
    }

    pub fn get_serializable(&self, id: SerializableId) -> &S {
        self.pool.get_serializable(id)
    }

    pub fn get_primitive(&self, operand: u32) -> Result<Primitive<'_>, PrimitiveError> {
        self.pool.get_primitive(operand)
    }

    /// Resolve a handle slot, calling the resolver at most once per slot.
    ///
    /// Resolver errors are returned unchanged and leave the slot
    /// unresolved, so a later call retries.
    pub fn resolve_handle(&self, id: HandleId) -> Result<&R::Value, R::Error> {
        self.resolved.resolve(id, &self.pool.handles, &self.resolver)
    }

    pub fn resolution(&self, id: HandleId) -> Resolution<&R::Value> {
        self.resolved.state(id)
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.resolved_count()
    }

    /// Drop the resolver and cache, returning the pool.
    pub fn into_pool(self) -> ConstantPool<T, S> {
        self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PoolBuilder;
    use crate::resolver::FnResolver;
    use std::cell::RefCell;

    #[test]
    fn resolve_handle_is_memoized() {
        let mut builder = PoolBuilder::<(), ()>::new();
        let first = builder.allocate_handle(42);
        let second = builder.allocate_handle(42);

        let seen = RefCell::new(Vec::new());
        let constants = RuntimeConstants::new(
            FnResolver(|handle: u32| {
                seen.borrow_mut().push(handle);
                Ok::<_, String>(format!("component-{handle}"))
            }),
            builder.export(),
        );

        assert_eq!(constants.resolution(first), Resolution::Unresolved);
        for _ in 0..3 {
            assert_eq!(constants.resolve_handle(first).unwrap(), "component-42");
        }
        assert_eq!(constants.resolve_handle(second).unwrap(), "component-42");

        // Two slots, each resolved once, in access order
        assert_eq!(*seen.borrow(), vec![42, 42]);
        assert_eq!(constants.resolved_count(), 2);
    }

    #[test]
    fn resolved_value_is_stable() {
        let mut builder = PoolBuilder::<(), ()>::new();
        let id = builder.allocate_handle(1);
        let constants = RuntimeConstants::new(
            FnResolver(|_: u32| Ok::<_, ()>(vec![1, 2, 3])),
            builder.export(),
        );

        let a = constants.resolve_handle(id).unwrap();
        let b = constants.resolve_handle(id).unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn getters_are_pure() {
        let mut builder = PoolBuilder::<(), ()>::new();
        let s = builder.intern_string("name");
        let f = builder.intern_float(0.25);
        let n = builder.intern_negative(-8);
        let constants = RuntimeConstants::new(FnResolver(|_: u32| Ok::<(), ()>(())), builder.export());

        for _ in 0..2 {
            assert_eq!(constants.get_string(s), "name");
            assert_eq!(constants.get_float(f), 0.25);
            assert_eq!(constants.get_negative(n), -8);
        }
        assert_eq!(constants.into_pool().strings, vec!["name"]);
    }
}
