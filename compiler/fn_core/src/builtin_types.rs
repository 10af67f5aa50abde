//! Built-in types shared by all functions.
//!
//! Each built-in is a per-thread singleton, so `Rc::ptr_eq` identifies it
//! regardless of where the handle came from. Defaults are the host type's
//! `Default`: `0.0`, `0`, `false`, `(0, 0, 0)` and `""`.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::cpu_type_info::{CpuTypeInfo, CpuTypeInfoForType};
use crate::types::{SharedType, Type};

/// Three packed `f32`s, laid out like a C struct.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Float3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

struct BuiltinTypes {
    float: SharedType,
    int32: SharedType,
    boolean: SharedType,
    float3: SharedType,
    string: SharedType,
    by_name: FxHashMap<&'static str, SharedType>,
}

fn new_cpu_type<T: Default + Clone + 'static>(name: &'static str) -> SharedType {
    let ty = Type::new(name);
    ty.add_extension::<dyn CpuTypeInfo>(Rc::new(CpuTypeInfoForType::<T>::new()));
    ty
}

impl BuiltinTypes {
    fn new() -> Self {
        let float = new_cpu_type::<f32>("Float");
        let int32 = new_cpu_type::<i32>("Int32");
        let boolean = new_cpu_type::<bool>("Bool");
        let float3 = new_cpu_type::<Float3>("FVec3");
        let string = new_cpu_type::<String>("String");

        let by_name = [
            ("Float", &float),
            ("Int32", &int32),
            ("Bool", &boolean),
            ("FVec3", &float3),
            ("String", &string),
        ]
        .into_iter()
        .map(|(name, ty)| (name, Rc::clone(ty)))
        .collect();

        Self {
            float,
            int32,
            boolean,
            float3,
            string,
            by_name,
        }
    }
}

thread_local! {
    static BUILTINS: BuiltinTypes = BuiltinTypes::new();
}

/// `Float`: `f32`, default `0.0`.
pub fn get_float_type() -> SharedType {
    BUILTINS.with(|b| Rc::clone(&b.float))
}

/// `Int32`: `i32`, default `0`.
pub fn get_int32_type() -> SharedType {
    BUILTINS.with(|b| Rc::clone(&b.int32))
}

/// `Bool`: `bool`, default `false`.
pub fn get_bool_type() -> SharedType {
    BUILTINS.with(|b| Rc::clone(&b.boolean))
}

/// `FVec3`: [`Float3`], default all zero.
pub fn get_float3_type() -> SharedType {
    BUILTINS.with(|b| Rc::clone(&b.float3))
}

/// `String`: owned `String`, default empty.
pub fn get_string_type() -> SharedType {
    BUILTINS.with(|b| Rc::clone(&b.string))
}

/// Look up a built-in type by its display name.
pub fn type_by_name(name: &str) -> Option<SharedType> {
    BUILTINS.with(|b| b.by_name.get(name).cloned())
}
