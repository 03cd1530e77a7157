//! Inspect exported constant pools

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use stave_program::{
    ArrayId, ConstantPool, FloatId, HandleId, NegativeId, PoolStats, Resolver, RuntimeConstants,
    SerializableId, StringId, TableId,
};

/// Pool with opaque JSON tables and serializables.
pub type JsonPool = ConstantPool<Value, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Family {
    Strings,
    Arrays,
    StringArrays,
    Tables,
    Handles,
    Serializables,
    Floats,
    Negatives,
}

pub fn load_pool(path: &Path) -> Result<JsonPool> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pool: {}", path.display()))?;
    JsonPool::from_json(&content).with_context(|| format!("Invalid pool JSON: {}", path.display()))
}

pub fn inspect(pool: &JsonPool) -> PoolStats {
    pool.stats()
}

fn check_range(family: Family, index: usize, len: usize) -> Result<()> {
    if index >= len {
        bail!("{family:?} index {index} out of range (pool has {len})");
    }
    Ok(())
}

/// Read one entry. `raw` is the operand as stored in bytecode, so the
/// 1-based families reject `0` as NULL.
pub fn get(pool: &JsonPool, family: Family, raw: u32) -> Result<Value> {
    let index = raw as usize;
    let value = match family {
        Family::Strings => {
            check_range(family, index, pool.strings.len())?;
            json!(pool.get_string(StringId::from_raw(raw)))
        }
        Family::Arrays => {
            check_range(family, index, pool.arrays.len())?;
            json!(pool.get_array(ArrayId::from_raw(raw)))
        }
        Family::StringArrays => {
            check_range(family, index, pool.arrays.len())?;
            let elements = pool.get_array(ArrayId::from_raw(raw));
            for &element in elements {
                check_range(Family::Strings, element as usize, pool.strings.len())
                    .context("Array is not a string array")?;
            }
            json!(pool.get_string_array(ArrayId::from_raw(raw)))
        }
        Family::Tables => {
            check_range(family, index, pool.tables.len())?;
            pool.get_symbol_table(TableId::from_raw(raw)).clone()
        }
        Family::Serializables => {
            check_range(family, index, pool.serializables.len())?;
            pool.get_serializable(SerializableId::from_raw(raw)).clone()
        }
        Family::Floats => {
            check_range(family, index, pool.floats.len())?;
            json!(pool.get_float(FloatId::from_raw(raw)))
        }
        Family::Handles => {
            let id = HandleId::from_raw(raw).context("Handle 0 is NULL")?;
            check_range(family, id.index(), pool.handles.len())?;
            json!(pool.get_handle(id))
        }
        Family::Negatives => {
            let id = NegativeId::from_raw(raw).context("Negative 0 is NULL")?;
            check_range(family, id.index(), pool.negatives.len())?;
            json!(pool.get_negative(id))
        }
    };
    Ok(value)
}

/// Resolves raw handles from a JSON registry, counting calls.
pub struct RegistryResolver {
    entries: HashMap<u32, Value>,
    calls: Cell<usize>,
}

impl RegistryResolver {
    pub fn new(entries: HashMap<u32, Value>) -> Self {
        Self {
            entries,
            calls: Cell::new(0),
        }
    }

    /// Registry files map raw handles (as object keys) to values.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry: {}", path.display()))?;
        let entries: HashMap<u32, Value> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid registry JSON: {}", path.display()))?;
        Ok(Self::new(entries))
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Resolver for RegistryResolver {
    type Value = Value;
    type Error = anyhow::Error;

    fn resolve(&self, handle: u32) -> Result<Value> {
        self.calls.set(self.calls.get() + 1);
        self.entries
            .get(&handle)
            .cloned()
            .ok_or_else(|| anyhow!("Handle {handle} is not in the registry"))
    }
}

#[derive(Debug, Serialize)]
pub struct ResolvedHandle {
    pub slot: u32,
    pub handle: u32,
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub resolved: Vec<ResolvedHandle>,
    pub resolver_calls: usize,
}

/// Resolve each requested slot in order. Repeated slots hit the cache.
pub fn resolve(pool: JsonPool, resolver: RegistryResolver, slots: &[u32]) -> Result<ResolveReport> {
    let constants = RuntimeConstants::new(resolver, pool);
    let mut resolved = Vec::with_capacity(slots.len());

    for &slot in slots {
        let id = HandleId::from_raw(slot).context("Handle 0 is NULL")?;
        check_range(Family::Handles, id.index(), constants.pool().handles.len())?;
        let handle = constants.pool().get_handle(id);
        let value = constants
            .resolve_handle(id)
            .with_context(|| format!("Failed to resolve slot {slot}"))?
            .clone();
        resolved.push(ResolvedHandle {
            slot,
            handle,
            value,
        });
    }

    let resolver_calls = constants.resolver().calls();
    log::debug!(
        "{} lookups, {} resolver calls",
        resolved.len(),
        resolver_calls
    );
    Ok(ResolveReport {
        resolved,
        resolver_calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stave_program::PoolBuilder;
    use std::sync::Arc;

    fn sample_pool() -> JsonPool {
        let mut builder = PoolBuilder::<Value, Value>::new();
        builder.intern_string("header");
        builder.intern_string_array(&["a", "b"]);
        builder.intern_table(Arc::new(json!({ "symbols": ["@title"] })));
        builder.intern_float(1.5);
        builder.intern_negative(-3);
        builder.allocate_handle(40);
        builder.allocate_handle(41);
        builder.allocate_handle(40);
        builder.export()
    }

    #[test]
    fn get_reads_each_family() {
        let pool = sample_pool();

        assert_eq!(get(&pool, Family::Strings, 0).unwrap(), json!("header"));
        assert_eq!(get(&pool, Family::StringArrays, 0).unwrap(), json!(["a", "b"]));
        assert_eq!(get(&pool, Family::Arrays, 0).unwrap(), json!([1, 2]));
        assert_eq!(
            get(&pool, Family::Tables, 0).unwrap(),
            json!({ "symbols": ["@title"] })
        );
        assert_eq!(get(&pool, Family::Floats, 0).unwrap(), json!(1.5));
        assert_eq!(get(&pool, Family::Negatives, 1).unwrap(), json!(-3));
        assert_eq!(get(&pool, Family::Handles, 2).unwrap(), json!(41));
    }

    #[test]
    fn get_rejects_null_and_out_of_range() {
        let pool = sample_pool();

        assert!(get(&pool, Family::Handles, 0).is_err());
        assert!(get(&pool, Family::Handles, 4).is_err());
        assert!(get(&pool, Family::Strings, 3).is_err());
        assert!(get(&pool, Family::Serializables, 0).is_err());
    }

    #[test]
    fn repeated_slots_resolve_once() {
        let registry = HashMap::from([(40, json!("first")), (41, json!("second"))]);
        let report = resolve(sample_pool(), RegistryResolver::new(registry), &[3, 1, 3, 2, 1]).unwrap();

        let values: Vec<&Value> = report.resolved.iter().map(|r| &r.value).collect();
        assert_eq!(
            values,
            [&json!("first"), &json!("first"), &json!("first"), &json!("second"), &json!("first")]
        );
        // Slots 1 and 3 hold the same raw handle but are separate slots
        assert_eq!(report.resolver_calls, 3);
    }

    #[test]
    fn missing_registry_entry_fails() {
        let registry = HashMap::from([(40, json!("first"))]);
        assert!(resolve(sample_pool(), RegistryResolver::new(registry), &[2]).is_err());
    }
}
