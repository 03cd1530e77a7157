//! Build → export → JSON → load → resolve, the way a compiled template
//! crosses from the compiler process into the runtime.

use serde::{Deserialize, Serialize};
use stave_program::{
    ConstantPool, FnResolver, HandleId, PoolBuilder, Primitive, Resolution, RuntimeConstants,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SymbolTable {
    parameters: Vec<String>,
    has_eval: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Meta {
    ModuleName(String),
    Line(u32),
}

type Pool = ConstantPool<SymbolTable, Meta>;

struct Compiled {
    pool: Pool,
    greeting: u32,
    names: stave_program::ArrayId,
    layout: HandleId,
    helper: HandleId,
    layout_again: HandleId,
}

fn compile_unit() -> Compiled {
    let mut builder = PoolBuilder::new();

    let greeting = builder.intern_primitive(Primitive::Str("hello"));
    builder.intern_primitive(Primitive::Int(-1));
    builder.intern_primitive(Primitive::Float(2.5));
    let names = builder.intern_string_array(&["title", "hello", "body"]);

    let table = Arc::new(SymbolTable {
        parameters: vec!["@title".into()],
        has_eval: false,
    });
    builder.intern_table(table.clone());
    builder.intern_table(table);
    builder.intern_serializable(Arc::new(Meta::ModuleName("templates/card".into())));

    let layout = builder.allocate_handle(7);
    let helper = builder.allocate_handle(3);
    let layout_again = builder.allocate_handle(7);

    Compiled {
        pool: builder.export(),
        greeting,
        names,
        layout,
        helper,
        layout_again,
    }
}

#[test]
fn exported_pool_survives_json() {
    let compiled = compile_unit();
    let json = compiled.pool.to_json().unwrap();
    let loaded = Pool::from_json(&json).unwrap();

    assert_eq!(loaded, compiled.pool);
    assert_eq!(loaded.tables.len(), 1);
    assert_eq!(loaded.handles, vec![7, 3, 7]);
    assert_eq!(
        loaded.get_string_array(compiled.names),
        vec!["title", "hello", "body"]
    );
    assert_eq!(loaded.get_primitive(compiled.greeting), Ok(Primitive::Str("hello")));
}

#[test]
fn runtime_resolves_each_slot_once() {
    let compiled = compile_unit();
    let loaded = Pool::from_json(&compiled.pool.to_json().unwrap()).unwrap();

    let registry: HashMap<u32, &str> = HashMap::from([(7, "Layout"), (3, "format-date")]);
    let loads = RefCell::new(Vec::new());
    let constants = RuntimeConstants::new(
        FnResolver(|handle: u32| {
            loads.borrow_mut().push(handle);
            registry
                .get(&handle)
                .map(|name| name.to_string())
                .ok_or_else(|| format!("no definition for handle {handle}"))
        }),
        loaded,
    );

    // Arbitrary access order
    let order = [
        compiled.helper,
        compiled.layout_again,
        compiled.layout,
        compiled.helper,
        compiled.layout,
    ];
    for id in order {
        constants.resolve_handle(id).unwrap();
    }

    assert_eq!(*loads.borrow(), vec![3, 7, 7]);
    assert_eq!(
        constants.resolution(compiled.layout),
        Resolution::Resolved(&"Layout".to_string())
    );
    assert_eq!(constants.resolved_count(), 3);
}

#[test]
fn failing_resolver_is_retried() {
    let compiled = compile_unit();
    let available = RefCell::new(false);
    let constants = RuntimeConstants::new(
        FnResolver(|handle: u32| {
            if *available.borrow() {
                Ok(handle)
            } else {
                Err("module not loaded")
            }
        }),
        compiled.pool,
    );

    assert_eq!(constants.resolve_handle(compiled.layout), Err("module not loaded"));
    assert_eq!(constants.resolution(compiled.layout), Resolution::Unresolved);

    *available.borrow_mut() = true;
    assert_eq!(constants.resolve_handle(compiled.layout), Ok(&7));
}
