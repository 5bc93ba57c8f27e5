//! Schema generation for rgql.
//!
//! This crate provides:
//! - `descriptor`: The generated GraphQL type graph
//! - `builder`: Registry to schema translation
//! - `sdl`: SDL printing
//! - `validate`: Schema-shape validation of operations
//! - `store`: Atomically swapped schema snapshots

pub mod builder;
pub mod descriptor;
pub mod sdl;
pub mod store;
pub mod validate;

pub use builder::{build, SchemaError};
pub use descriptor::{
    EnumDef, FieldDef, InputFieldDef, InputObjectDef, InterfaceDef, ObjectDef, ScalarDef,
    SchemaDescriptor, TypeDef, TypeRef,
};
pub use store::{SchemaSnapshot, SchemaStore};
pub use validate::{validate, ValidationError, ValidationErrorCode, ValidationErrors};
