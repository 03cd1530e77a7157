//! Compile-time constant pool builder.
//!
//! Strings and floats are deduplicated by value. Arrays, tables and
//! serializables are deduplicated by identity: interning the same `Arc`
//! twice yields one entry, while two structurally equal but separately
//! allocated values get two entries. Handles and negatives are never
//! deduplicated.

use crate::ids::{
    to_u32, ArrayId, FloatId, HandleId, NegativeId, SerializableId, StringId, TableId,
};
use crate::pool::ConstantPool;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Identity key of a shared allocation.
///
/// Stable for as long as the builder holds the `Arc`, which it does for
/// every interned value.
fn identity<T: ?Sized>(value: &Arc<T>) -> usize {
    Arc::as_ptr(value) as *const () as usize
}

/// Accumulates interned constants for one compilation unit.
pub struct PoolBuilder<T, S> {
    pool: ConstantPool<T, S>,
    /// Reverse lookup: string → StringId
    string_ids: FxHashMap<String, StringId>,
    /// Reverse lookup: float bit pattern → FloatId
    float_ids: FxHashMap<u64, FloatId>,
    /// Reverse lookup: allocation address → ArrayId
    array_ids: FxHashMap<usize, ArrayId>,
    table_ids: FxHashMap<usize, TableId>,
    serializable_ids: FxHashMap<usize, SerializableId>,
}

impl<T, S> PoolBuilder<T, S> {
    pub fn new() -> Self {
        Self {
            pool: ConstantPool::new(),
            string_ids: FxHashMap::default(),
            float_ids: FxHashMap::default(),
            array_ids: FxHashMap::default(),
            table_ids: FxHashMap::default(),
            serializable_ids: FxHashMap::default(),
        }
    }

    /// Resume building on top of an exported pool.
    ///
    /// Value-deduplicated families keep deduplicating against the existing
    /// entries. Identity-deduplicated families only match the `Arc`s owned
    /// by `pool` itself.
    pub fn from_pool(pool: ConstantPool<T, S>) -> Self {
        let mut builder = Self::new();

        for (index, value) in pool.strings.iter().enumerate() {
            builder
                .string_ids
                .entry(value.clone())
                .or_insert(StringId::from_index(index));
        }
        for (index, value) in pool.floats.iter().enumerate() {
            builder
                .float_ids
                .entry(value.to_bits())
                .or_insert(FloatId::from_index(index));
        }
        for (index, value) in pool.arrays.iter().enumerate() {
            builder
                .array_ids
                .insert(identity(value), ArrayId::from_index(index));
        }
        for (index, value) in pool.tables.iter().enumerate() {
            builder
                .table_ids
                .insert(identity(value), TableId::from_index(index));
        }
        for (index, value) in pool.serializables.iter().enumerate() {
            builder
                .serializable_ids
                .insert(identity(value), SerializableId::from_index(index));
        }

        builder.pool = pool;
        builder
    }

    /// Intern a string, returning its StringId.
    pub fn intern_string(&mut self, value: &str) -> StringId {
        if let Some(&id) = self.string_ids.get(value) {
            return id;
        }
        let id = StringId::from_index(self.pool.strings.len());
        self.pool.strings.push(value.to_owned());
        self.string_ids.insert(value.to_owned(), id);
        id
    }

    /// Intern a float by bit pattern, so `0.0` and `-0.0` stay distinct.
    pub fn intern_float(&mut self, value: f64) -> FloatId {
        let bits = value.to_bits();
        if let Some(&id) = self.float_ids.get(&bits) {
            return id;
        }
        let id = FloatId::from_index(self.pool.floats.len());
        self.pool.floats.push(value);
        self.float_ids.insert(bits, id);
        id
    }

    pub fn intern_array(&mut self, values: Arc<[u32]>) -> ArrayId {
        let key = identity(&values);
        if let Some(&id) = self.array_ids.get(&key) {
            return id;
        }
        let id = ArrayId::from_index(self.pool.arrays.len());
        self.pool.arrays.push(values);
        self.array_ids.insert(key, id);
        id
    }

    /// Intern each string, then intern the resulting index array.
    ///
    /// The index array is a fresh allocation, so repeated calls with the
    /// same strings produce distinct array entries.
    pub fn intern_string_array<V: AsRef<str>>(&mut self, values: &[V]) -> ArrayId {
        let indices: Vec<u32> = values
            .iter()
            .map(|value| self.intern_string(value.as_ref()).raw())
            .collect();
        self.intern_array(Arc::from(indices))
    }

    pub fn intern_table(&mut self, table: Arc<T>) -> TableId {
        let key = identity(&table);
        if let Some(&id) = self.table_ids.get(&key) {
            return id;
        }
        let id = TableId::from_index(self.pool.tables.len());
        self.pool.tables.push(table);
        self.table_ids.insert(key, id);
        id
    }

    pub fn intern_serializable(&mut self, value: Arc<S>) -> SerializableId {
        let key = identity(&value);
        if let Some(&id) = self.serializable_ids.get(&key) {
            return id;
        }
        let id = SerializableId::from_index(self.pool.serializables.len());
        self.pool.serializables.push(value);
        self.serializable_ids.insert(key, id);
        id
    }

    /// Append a negative number. Never deduplicated.
    pub fn intern_negative(&mut self, value: i64) -> NegativeId {
        self.pool.negatives.push(value);
        NegativeId::from_len(self.pool.negatives.len())
    }

    /// Allocate a new resolution slot for `handle`.
    ///
    /// Every call yields a new, strictly increasing slot, even for a handle
    /// that already has one.
    pub fn allocate_handle(&mut self, handle: u32) -> HandleId {
        self.pool.handles.push(handle);
        HandleId::from_len(self.pool.handles.len())
    }

    /// Constants interned so far.
    pub fn pool(&self) -> &ConstantPool<T, S> {
        &self.pool
    }

    /// Number of handles allocated so far.
    pub fn handle_count(&self) -> u32 {
        to_u32(self.pool.handles.len())
    }

    /// Snapshot of the constants interned so far.
    pub fn to_pool(&self) -> ConstantPool<T, S> {
        self.pool.clone()
    }

    /// Freeze the builder into its exported pool.
    pub fn export(self) -> ConstantPool<T, S> {
        self.pool
    }
}

impl<T, S> Default for PoolBuilder<T, S> {
    fn default() -> Self {
        Self::new()
    }
}
