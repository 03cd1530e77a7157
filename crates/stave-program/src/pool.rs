//! The exported, immutable constant pool.
//!
//! A pool is seven parallel sequences. An entry's position in its sequence
//! is its identity, so any encoding that preserves order round-trips the
//! pool exactly.
//!
//! Note: JSON encoding requires the `json` feature.

use crate::ids::{ArrayId, FloatId, HandleId, NegativeId, SerializableId, StringId, TableId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Frozen constants of one compilation unit.
///
/// `T` is the symbol table type, `S` the serializable value type. Lookups
/// assume an in-range index produced by the same compilation; passing any
/// other index is a defect in the producing pipeline and panics.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstantPool<T, S> {
    pub strings: Vec<String>,
    pub arrays: Vec<Arc<[u32]>>,
    pub tables: Vec<Arc<T>>,
    pub handles: Vec<u32>,
    pub serializables: Vec<Arc<S>>,
    #[serde(with = "float_repr")]
    pub floats: Vec<f64>,
    pub negatives: Vec<i64>,
}

/// Floats as numbers, with non-finite values as tagged strings.
///
/// `"Infinity"`, `"-Infinity"` and `"NaN"` cover the common cases. Any other
/// NaN keeps its payload as `"NaN:0x<bits>"`, so every entry round-trips
/// bit for bit.
mod float_repr {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum FloatRepr {
        Finite(f64),
        Special(String),
    }

    impl From<f64> for FloatRepr {
        fn from(value: f64) -> Self {
            if value.is_finite() {
                FloatRepr::Finite(value)
            } else if value == f64::INFINITY {
                FloatRepr::Special("Infinity".to_string())
            } else if value == f64::NEG_INFINITY {
                FloatRepr::Special("-Infinity".to_string())
            } else if value.to_bits() == f64::NAN.to_bits() {
                FloatRepr::Special("NaN".to_string())
            } else {
                FloatRepr::Special(format!("NaN:{:#018x}", value.to_bits()))
            }
        }
    }

    fn parse_special(tag: &str) -> Option<f64> {
        match tag {
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            "NaN" => Some(f64::NAN),
            _ => {
                let hex = tag.strip_prefix("NaN:0x")?;
                let value = f64::from_bits(u64::from_str_radix(hex, 16).ok()?);
                value.is_nan().then_some(value)
            }
        }
    }

    pub fn serialize<S: Serializer>(floats: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(floats.iter().map(|&value| FloatRepr::from(value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Vec::<FloatRepr>::deserialize(deserializer)?
            .into_iter()
            .map(|repr| match repr {
                FloatRepr::Finite(value) => Ok(value),
                FloatRepr::Special(tag) => parse_special(&tag)
                    .ok_or_else(|| D::Error::custom(format!("invalid float {tag:?}"))),
            })
            .collect()
    }
}

/// Entry counts per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStats {
    pub strings: usize,
    pub arrays: usize,
    pub tables: usize,
    pub handles: usize,
    pub serializables: usize,
    pub floats: usize,
    pub negatives: usize,
}

impl<T, S> ConstantPool<T, S> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            strings: Vec::new(),
            arrays: Vec::new(),
            tables: Vec::new(),
            handles: Vec::new(),
            serializables: Vec::new(),
            floats: Vec::new(),
            negatives: Vec::new(),
        }
    }

    pub fn get_string(&self, id: StringId) -> &str {
        &self.strings[id.index()]
    }

    pub fn get_float(&self, id: FloatId) -> f64 {
        self.floats[id.index()]
    }

    pub fn get_negative(&self, id: NegativeId) -> i64 {
        self.negatives[id.index()]
    }

    pub fn get_array(&self, id: ArrayId) -> &[u32] {
        &self.arrays[id.index()]
    }

    /// Read an array whose elements are string indices.
    pub fn get_string_array(&self, id: ArrayId) -> Vec<&str> {
        self.get_array(id)
            .iter()
            .map(|&raw| self.get_string(StringId::from_raw(raw)))
            .collect()
    }

    pub fn get_symbol_table(&self, id: TableId) -> &T {
        &self.tables[id.index()]
    }

    pub fn get_serializable(&self, id: SerializableId) -> &S {
        &self.serializables[id.index()]
    }

    /// Raw handle stored in a resolution slot.
    pub fn get_handle(&self, id: HandleId) -> u32 {
        self.handles[id.index()]
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            strings: self.strings.len(),
            arrays: self.arrays.len(),
            tables: self.tables.len(),
            handles: self.handles.len(),
            serializables: self.serializables.len(),
            floats: self.floats.len(),
            negatives: self.negatives.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stats() == PoolStats::default()
    }
}

#[cfg(feature = "json")]
impl<T, S> ConstantPool<T, S>
where
    T: Serialize + for<'de> Deserialize<'de>,
    S: Serialize + for<'de> Deserialize<'de>,
{
    /// Serialize the pool to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize the pool to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a pool from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// Manual impls: `Arc` payloads clone without requiring `T: Clone`.
impl<T, S> Clone for ConstantPool<T, S> {
    fn clone(&self) -> Self {
        Self {
            strings: self.strings.clone(),
            arrays: self.arrays.clone(),
            tables: self.tables.clone(),
            handles: self.handles.clone(),
            serializables: self.serializables.clone(),
            floats: self.floats.clone(),
            negatives: self.negatives.clone(),
        }
    }
}

impl<T, S> Default for ConstantPool<T, S> {
    fn default() -> Self {
        Self::new()
    }
}
