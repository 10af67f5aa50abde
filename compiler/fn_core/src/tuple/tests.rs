use std::rc::Rc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::builtin_types::{
    get_bool_type, get_float3_type, get_float_type, get_int32_type, get_string_type, Float3,
};
use crate::cpu_type_info::CpuTypeInfoForType;
use crate::types::Type;

fn meta(types: Vec<SharedType>) -> Rc<TupleMeta> {
    match TupleMeta::new(types) {
        Ok(meta) => Rc::new(meta),
        Err(e) => panic!("tuple meta: {e}"),
    }
}

// -- Layout --

#[test]
fn offsets_respect_field_alignment() {
    let meta = meta(vec![get_bool_type(), get_int32_type(), get_bool_type(), get_float3_type()]);
    assert_eq!(meta.offsets(), &[0_u32, 4, 8, 12]);
    assert_eq!(meta.alignment(), 4);
    assert_eq!(meta.size_of_data(), 24);
}

#[test]
fn data_size_is_padded_to_alignment() {
    let meta = meta(vec![get_int32_type(), get_bool_type()]);
    assert_eq!(meta.offsets(), &[0_u32, 4]);
    assert_eq!(meta.size_of_data(), 8);
}

#[test]
fn empty_meta_has_no_data() {
    let meta = meta(Vec::new());
    assert!(meta.is_empty());
    assert_eq!(meta.size_of_data(), 0);
    let tuple = Tuple::new(meta);
    assert!(tuple.all_initialized());
}

#[test]
fn type_without_cpu_info_is_rejected() {
    let opaque = Type::new("Opaque");
    let err = TupleMeta::new(vec![get_float_type(), opaque]).err();
    assert_eq!(
        err.map(|e| e.to_string()),
        Some("type `Opaque` has no `CPU Type Info` extension".to_string())
    );
}

// -- Default initialization --

#[test]
fn init_default_all_writes_type_defaults() {
    let mut tuple = Tuple::new(meta(vec![
        get_int32_type(),
        get_string_type(),
        get_bool_type(),
    ]));
    assert!(!tuple.all_initialized());

    tuple.init_default_all();

    assert!(tuple.all_initialized());
    assert_eq!(tuple.get::<i32>(0), 0);
    assert_eq!(tuple.get::<String>(1), "");
    assert!(!tuple.get::<bool>(2));
}

#[test]
fn init_default_all_resets_previous_values() {
    let mut tuple = Tuple::new(meta(vec![get_string_type(), get_float3_type()]));
    tuple.set(0, "sculpt".to_string());
    tuple.set(1, Float3::new(1.0, 2.0, 3.0));

    tuple.init_default_all();

    assert_eq!(tuple.get::<String>(0), "");
    assert_eq!(tuple.get::<Float3>(1), Float3::default());
}

// -- Typed access --

#[test]
fn set_and_get_round_trip() {
    let mut tuple = Tuple::new(meta(vec![get_float_type(), get_string_type()]));
    tuple.set(0, 0.5_f32);
    tuple.set(1, "brush".to_string());
    tuple.set(1, "strength".to_string());

    assert_eq!(tuple.get::<f32>(0), 0.5);
    assert_eq!(tuple.get_ref::<String>(1), "strength");
}

#[test]
fn relocate_out_uninitializes_field() {
    let mut tuple = Tuple::new(meta(vec![get_string_type()]));
    tuple.set(0, "moved".to_string());

    let value: String = tuple.relocate_out(0);

    assert_eq!(value, "moved");
    assert!(!tuple.is_initialized(0));
}

#[test]
#[should_panic(expected = "not initialized")]
fn reading_uninitialized_field_panics() {
    let tuple = Tuple::new(meta(vec![get_int32_type()]));
    let _ = tuple.get::<i32>(0);
}

#[test]
#[should_panic(expected = "accessed as `i64`")]
fn set_with_wider_type_panics() {
    let mut tuple = Tuple::new(meta(vec![get_int32_type(), get_int32_type()]));
    tuple.set(0, 1_i32);
    tuple.set(1, 2_i32);
    tuple.set(0, -1_i64);
}

#[test]
#[should_panic(expected = "accessed as `f32`")]
fn get_with_wrong_type_panics() {
    let mut tuple = Tuple::new(meta(vec![get_int32_type()]));
    tuple.set(0, 3_i32);
    let _ = tuple.get_ref::<f32>(0);
}

#[test]
#[should_panic(expected = "accessed as `alloc::string::String`")]
fn relocate_out_with_wrong_type_panics() {
    let mut tuple = Tuple::new(meta(vec![get_float_type()]));
    tuple.set(0, 1.5_f32);
    let _ = tuple.relocate_out::<String>(0);
}

#[test]
#[should_panic(expected = "copy from field 0 of type `Int32` into field 0 of type `String`")]
fn copy_element_between_types_panics() {
    let mut from = Tuple::new(meta(vec![get_int32_type()]));
    from.set(0, 7_i32);
    let mut to = Tuple::new(meta(vec![get_string_type()]));
    Tuple::copy_element(&from, 0, &mut to, 0);
}

#[test]
fn copy_element_between_tuples() {
    let mut from = Tuple::new(meta(vec![get_int32_type(), get_string_type()]));
    from.set(0, 7_i32);
    from.set(1, "copied".to_string());
    let mut to = Tuple::new(meta(vec![get_string_type()]));
    to.init_default_all();

    Tuple::copy_element(&from, 1, &mut to, 0);

    assert_eq!(to.get::<String>(0), "copied");
    assert_eq!(from.get::<String>(1), "copied");
}

#[test]
fn raw_copy_in_and_relocate_out() {
    let mut tuple = Tuple::new(meta(vec![get_bool_type(), get_float3_type()]));
    let input = Float3::new(4.0, 5.0, 6.0);

    // SAFETY: input is a live, aligned Float3
    unsafe { tuple.copy_in_raw(1, std::ptr::from_ref(&input).cast::<u8>()) };
    assert_eq!(tuple.get::<Float3>(1), input);

    let mut output = std::mem::MaybeUninit::<Float3>::uninit();
    // SAFETY: output is aligned and uninitialized
    unsafe { tuple.relocate_out_raw(1, output.as_mut_ptr().cast::<u8>()) };
    // SAFETY: relocate_out_raw initialized it
    assert_eq!(unsafe { output.assume_init() }, input);
    assert!(!tuple.is_initialized(1));
}

#[test]
fn data_is_addressable_by_offset() {
    let mut tuple = Tuple::new(meta(vec![get_bool_type(), get_int32_type()]));
    tuple.set(0, true);
    tuple.set(1, -12_i32);

    let offset = tuple.meta().offsets()[1] as usize;
    // SAFETY: offset 1 holds a live i32
    let raw = unsafe { tuple.data_ptr().add(offset).cast::<i32>().read() };
    assert_eq!(raw, -12);
    assert_eq!(tuple.data_ptr() as usize % tuple.meta().alignment(), 0);
}

/// Host type holding a reference count so drops are observable.
#[derive(Clone, Default)]
struct Probe(Option<Rc<()>>);

#[test]
fn dropping_tuple_destroys_initialized_fields() {
    let probe_type = Type::new("Probe");
    probe_type.add_extension::<dyn CpuTypeInfo>(Rc::new(CpuTypeInfoForType::<Probe>::new()));
    let shared = Rc::new(());
    {
        let mut tuple = Tuple::new(meta(vec![Rc::clone(&probe_type); 4]));
        for i in 0..3 {
            tuple.set(i, Probe(Some(Rc::clone(&shared))));
        }
        let moved: Probe = tuple.relocate_out(1);
        assert_eq!(Rc::strong_count(&shared), 4);
        drop(moved);
        assert_eq!(Rc::strong_count(&shared), 3);
    }
    assert_eq!(Rc::strong_count(&shared), 1);
}

proptest! {
    #[test]
    fn offsets_are_aligned_and_disjoint(kinds in proptest::collection::vec(0u8..5, 0..12)) {
        let types: Vec<SharedType> = kinds
            .iter()
            .map(|k| match k {
                0 => get_float_type(),
                1 => get_int32_type(),
                2 => get_bool_type(),
                3 => get_float3_type(),
                _ => get_string_type(),
            })
            .collect();
        let meta = meta(types);

        let mut end = 0usize;
        for (offset, info) in meta.offsets().iter().zip(meta.type_infos()) {
            let offset = *offset as usize;
            prop_assert_eq!(offset % info.alignment(), 0);
            prop_assert!(offset >= end);
            end = offset + info.size();
        }
        prop_assert!(meta.size_of_data() >= end);
        prop_assert_eq!(meta.size_of_data() % meta.alignment(), 0);
    }
}
