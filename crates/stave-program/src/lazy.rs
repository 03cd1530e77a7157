//! In-process constants for lazy compilation.
//!
//! When templates are compiled on demand inside the running process, the
//! compiler keeps interning while the runtime already reads and resolves.
//! `LazyConstants` combines both sides over one pool, with the same index
//! conventions as [`RuntimeConstants`](crate::RuntimeConstants), and adds
//! the auxiliary table for live values that can never be serialized.

use crate::builder::PoolBuilder;
use crate::ids::{
    to_u32, ArrayId, FloatId, HandleId, NegativeId, OtherId, SerializableId, StringId, TableId,
};
use crate::pool::ConstantPool;
use crate::primitive::{Primitive, PrimitiveError};
use crate::resolver::{Resolution, ResolutionCache, Resolver};
use std::sync::Arc;

/// Append-only table of live values, addressed 1-based.
pub struct OtherTable<O> {
    values: Vec<O>,
}

impl<O> OtherTable<O> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value. Never deduplicated.
    pub fn register(&mut self, value: O) -> OtherId {
        self.values.push(value);
        OtherId::from_len(self.values.len())
    }

    pub fn get(&self, id: OtherId) -> &O {
        &self.values[id.index()]
    }

    pub fn len(&self) -> u32 {
        to_u32(self.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<O> Default for OtherTable<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder, reader and auxiliary table over a single growing pool.
pub struct LazyConstants<T, S, R: Resolver, O> {
    builder: PoolBuilder<T, S>,
    resolver: R,
    resolved: ResolutionCache<R::Value>,
    others: OtherTable<O>,
}

impl<T, S, R: Resolver, O> LazyConstants<T, S, R, O> {
    pub fn new(resolver: R) -> Self {
        Self {
            builder: PoolBuilder::new(),
            resolver,
            resolved: ResolutionCache::new(),
            others: OtherTable::new(),
        }
    }

    /// Continue from a previously exported pool.
    pub fn from_pool(resolver: R, pool: ConstantPool<T, S>) -> Self {
        let resolved = ResolutionCache::with_len(pool.handles.len());
        Self {
            builder: PoolBuilder::from_pool(pool),
            resolver,
            resolved,
            others: OtherTable::new(),
        }
    }

    // --- Interning ---

    pub fn intern_string(&mut self, value: &str) -> StringId {
        self.builder.intern_string(value)
    }

    pub fn intern_float(&mut self, value: f64) -> FloatId {
        self.builder.intern_float(value)
    }

    pub fn intern_array(&mut self, values: Arc<[u32]>) -> ArrayId {
        self.builder.intern_array(values)
    }

    pub fn intern_string_array<V: AsRef<str>>(&mut self, values: &[V]) -> ArrayId {
        self.builder.intern_string_array(values)
    }

    pub fn intern_table(&mut self, table: Arc<T>) -> TableId {
        self.builder.intern_table(table)
    }

    pub fn intern_serializable(&mut self, value: Arc<S>) -> SerializableId {
        self.builder.intern_serializable(value)
    }

    pub fn intern_negative(&mut self, value: i64) -> NegativeId {
        self.builder.intern_negative(value)
    }

    pub fn intern_primitive(&mut self, value: Primitive<'_>) -> u32 {
        self.builder.intern_primitive(value)
    }

    /// Allocate a handle slot and its unresolved cache entry at the same offset.
    pub fn allocate_handle(&mut self, handle: u32) -> HandleId {
        let id = self.builder.allocate_handle(handle);
        self.resolved.push_unresolved();
        debug_assert_eq!(self.resolved.len(), self.builder.pool().handles.len());
        id
    }

    // --- Reading ---

    pub fn pool(&self) -> &ConstantPool<T, S> {
        self.builder.pool()
    }

    pub fn get_string(&self, id: StringId) -> &str {
        self.pool().get_string(id)
    }

    pub fn get_float(&self, id: FloatId) -> f64 {
        self.pool().get_float(id)
    }

    pub fn get_negative(&self, id: NegativeId) -> i64 {
        self.pool().get_negative(id)
    }

    pub fn get_array(&self, id: ArrayId) -> &[u32] {
        self.pool().get_array(id)
    }

    pub fn get_string_array(&self, id: ArrayId) -> Vec<&str> {
        self.pool().get_string_array(id)
    }

    pub fn get_symbol_table(&self, id: TableId) -> &T {
        self.pool().get_symbol_table(id)
    }

    pub fn get_serializable(&self, id: SerializableId) -> &S {
        self.pool().get_serializable(id)
    }

    pub fn get_primitive(&self, operand: u32) -> Result<Primitive<'_>, PrimitiveError> {
        self.pool().get_primitive(operand)
    }

    /// Resolve a handle slot, calling the resolver at most once per slot.
    pub fn resolve_handle(&self, id: HandleId) -> Result<&R::Value, R::Error> {
        self.resolved
            .resolve(id, &self.builder.pool().handles, &self.resolver)
    }

    pub fn resolution(&self, id: HandleId) -> Resolution<&R::Value> {
        self.resolved.state(id)
    }

    // --- Auxiliary table ---

    pub fn register_other(&mut self, value: O) -> OtherId {
        self.others.register(value)
    }

    pub fn get_other(&self, id: OtherId) -> &O {
        self.others.get(id)
    }

    pub fn others(&self) -> &OtherTable<O> {
        &self.others
    }

    /// Freeze into a pool. Resolver, cache and live values are dropped.
    pub fn export(self) -> ConstantPool<T, S> {
        self.builder.export()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FnResolver;
    use std::cell::Cell;
    use std::rc::Rc;

    type BoxedResolve<'a> = Box<dyn Fn(u32) -> Result<u32, ()> + 'a>;
    type Lazy<'a> = LazyConstants<(), (), FnResolver<BoxedResolve<'a>>, Rc<str>>;

    fn counting(calls: &Cell<u32>) -> Lazy<'_> {
        let resolve: BoxedResolve<'_> = Box::new(move |handle: u32| {
            calls.set(calls.get() + 1);
            Ok(handle + 100)
        });
        LazyConstants::new(FnResolver(resolve))
    }

    #[test]
    fn interleaved_build_and_resolve() {
        let calls = Cell::new(0);
        let mut constants = counting(&calls);

        let a = constants.allocate_handle(1);
        assert_eq!(constants.resolve_handle(a), Ok(&101));

        // Allocating more handles keeps earlier slots resolved
        let b = constants.allocate_handle(1);
        assert_eq!(constants.resolution(a), Resolution::Resolved(&101));
        assert_eq!(constants.resolution(b), Resolution::Unresolved);

        assert_eq!(constants.resolve_handle(b), Ok(&101));
        assert_eq!(constants.resolve_handle(a), Ok(&101));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn others_are_one_based_and_never_dedup() {
        let calls = Cell::new(0);
        let mut constants = counting(&calls);
        let capability: Rc<str> = Rc::from("capability");

        let first = constants.register_other(capability.clone());
        let second = constants.register_other(capability);

        assert_eq!((first.raw(), second.raw()), (1, 2));
        assert_eq!(&**constants.get_other(second), "capability");
        assert_eq!(constants.others().len(), 2);
    }

    #[test]
    fn same_offsets_as_runtime_reader() {
        let calls = Cell::new(0);
        let mut constants = counting(&calls);

        let s = constants.intern_string("x");
        let f = constants.intern_float(3.5);
        let n = constants.intern_negative(-2);
        let h = constants.allocate_handle(5);

        assert_eq!(s.raw(), 0);
        assert_eq!(f.raw(), 0);
        assert_eq!(n.raw(), 1);
        assert_eq!(h.raw(), 1);
        assert_eq!(constants.get_float(f), 3.5);
        assert_eq!(constants.get_negative(n), -2);

        let pool = constants.export();
        assert_eq!(pool.handles, vec![5]);
        assert_eq!(pool.get_float(f), 3.5);
    }

    #[test]
    fn from_pool_aligns_cache() {
        let mut builder = PoolBuilder::<(), ()>::new();
        builder.allocate_handle(8);

        let resolve: BoxedResolve<'_> = Box::new(|handle: u32| Ok(handle));
        let mut constants: Lazy<'_> = LazyConstants::from_pool(FnResolver(resolve), builder.export());
        let next = constants.allocate_handle(9);

        assert_eq!(next.raw(), 2);
        assert_eq!(constants.resolve_handle(HandleId::from_raw(1).unwrap()), Ok(&8));
        assert_eq!(constants.resolve_handle(next), Ok(&9));
    }
}
