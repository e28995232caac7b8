//! Rust types as type descriptors.
//!
//! [`Describe`] maps a Rust type onto the shape vocabulary, registering named
//! records in a [`Registry`] as it goes. Std containers are covered here;
//! structs opt in through [`describe_record!`](crate::describe_record) or a
//! hand-written impl that calls [`Registry::describe_record`].
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::descriptor::TyRef;
use crate::ir::{Record, Registry, Ty};
use crate::render::{self, Schema};

pub trait Describe {
    fn describe(registry: &mut Registry) -> Ty;
}

/// Describe `T` and everything it refers to.
pub fn schema_of<T: Describe + ?Sized>() -> Schema {
    let mut registry = Registry::new();
    let root = T::describe(&mut registry);
    Schema::new(registry, root)
}

impl Registry {
    /// Register `name` once, building its fields with `build`.
    ///
    /// A second request for the same name (including one made from inside
    /// `build`, i.e. a recursive type) returns the reference without building
    /// again.
    pub fn describe_record(&mut self, name: &str, build: impl FnOnce(&mut Registry) -> Record) -> Ty {
        if !self.declare(name) {
            return Ty::named(name);
        }
        let record = build(self);
        self.define(name, record)
    }
}

/// Declare a struct and its [`Describe`] impl in one go.
///
/// ```
/// shape_schema::describe_record! {
///     pub struct Point { pub x: f64, pub y: f64 }
/// }
/// let out = shape_schema::schema_of::<Point>().render().unwrap();
/// assert_eq!(out, "{\n    'x': 'f64',\n    'y': 'f64'\n}");
/// ```
#[macro_export]
macro_rules! describe_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $fty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $fty,
            )*
        }

        impl $crate::Describe for $name {
            fn describe(registry: &mut $crate::ir::Registry) -> $crate::ir::Ty {
                registry.describe_record(stringify!($name), |registry| {
                    let mut record = $crate::ir::Record::new();
                    $(
                        record.push(stringify!($field), <$fty as $crate::Describe>::describe(registry));
                    )*
                    let _ = &registry;
                    record
                })
            }
        }
    };
}

// ————————————————————————————————————————————————————————————————————————————
// STD IMPLS
// ————————————————————————————————————————————————————————————————————————————

macro_rules! primitive {
    ($($t:ty => $name:literal),* $(,)?) => {
        $(
            impl Describe for $t {
                fn describe(_: &mut Registry) -> Ty { Ty::primitive($name) }
            }
        )*
    };
}

primitive! {
    bool => "bool",
    i8 => "i8", i16 => "i16", i32 => "i32", i64 => "i64", i128 => "i128", isize => "isize",
    u8 => "u8", u16 => "u16", u32 => "u32", u64 => "u64", u128 => "u128", usize => "usize",
    f32 => "f32", f64 => "f64",
    char => "char",
    String => "String",
    str => "str",
}

impl Describe for () {
    fn describe(_: &mut Registry) -> Ty { Ty::Null }
}

impl<T: Describe> Describe for Option<T> {
    fn describe(registry: &mut Registry) -> Ty {
        Ty::optional(T::describe(registry))
    }
}

macro_rules! transparent {
    ($($wrapper:ident),*) => {
        $(
            impl<T: Describe + ?Sized> Describe for $wrapper<T> {
                fn describe(registry: &mut Registry) -> Ty { T::describe(registry) }
            }
        )*
    };
}

transparent!(Box, Rc, Arc);

impl<T: Describe + ?Sized> Describe for &T {
    fn describe(registry: &mut Registry) -> Ty { T::describe(registry) }
}

macro_rules! list {
    ($($coll:ident),*) => {
        $(
            impl<T: Describe> Describe for $coll<T> {
                fn describe(registry: &mut Registry) -> Ty { Ty::list(T::describe(registry)) }
            }
        )*
    };
}

list!(Vec, VecDeque, HashSet, BTreeSet);

impl<T: Describe> Describe for [T] {
    fn describe(registry: &mut Registry) -> Ty { Ty::list(T::describe(registry)) }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe(registry: &mut Registry) -> Ty { Ty::list(T::describe(registry)) }
}

fn text_of(registry: &Registry, ty: &Ty) -> String {
    render::describe(&TyRef::new(registry, ty))
}

macro_rules! map {
    ($($coll:ident),*) => {
        $(
            impl<K: Describe, V: Describe> Describe for $coll<K, V> {
                fn describe(registry: &mut Registry) -> Ty {
                    let k = K::describe(registry);
                    let v = V::describe(registry);
                    Ty::other(format!("Dict[{}, {}]", text_of(registry, &k), text_of(registry, &v)))
                }
            }
        )*
    };
}

map!(HashMap, BTreeMap, IndexMap);

macro_rules! tuple {
    ($($name:ident),+) => {
        impl<$($name: Describe),+> Describe for ($($name,)+) {
            fn describe(registry: &mut Registry) -> Ty {
                let parts = [$(
                    { let ty = $name::describe(registry); text_of(registry, &ty) }
                ),+];
                Ty::other(format!("Tuple[{}]", parts.join(", ")))
            }
        }
    };
}

tuple!(A);
tuple!(A, B);
tuple!(A, B, C);
tuple!(A, B, C, D);
