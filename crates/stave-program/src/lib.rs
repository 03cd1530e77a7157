//! Constant pool shared between template compilation and runtime.
//!
//! The compiler interns constants into a [`PoolBuilder`] and exports a
//! frozen [`ConstantPool`]. The runtime loads the pool into
//! [`RuntimeConstants`] and resolves handles lazily through a [`Resolver`],
//! at most once per handle slot. [`LazyConstants`] serves in-process lazy
//! compilation, where both sides share one growing pool.

pub mod builder;
pub mod ids;
pub mod lazy;
pub mod pool;
pub mod primitive;
pub mod resolver;
pub mod runtime;

pub use builder::PoolBuilder;
pub use ids::{ArrayId, FloatId, HandleId, NegativeId, OtherId, SerializableId, StringId, TableId};
pub use lazy::{LazyConstants, OtherTable};
pub use pool::{ConstantPool, PoolStats};
pub use primitive::{Primitive, PrimitiveError, PrimitiveType};
pub use resolver::{FnResolver, Resolution, ResolutionCache, Resolver};
pub use runtime::RuntimeConstants;
