//! Declarative JSON codec for entity types.
//!
//! An [`Entity`] lists its mapped fields once in a [`FieldTable`]; [`encode`]
//! and [`decode`] walk that table recursively. Field kinds are fixed when the
//! table is built and the traversal dispatches on them.

pub mod collection;
pub mod entity;
pub mod enumeration;
pub mod error;
pub mod fieldtable;
pub mod leaf;

pub use collection::{Collection, CollectionPolicy};
pub use entity::{decode, decode_value, encode, encode_value, field_table, Entity};
pub use enumeration::Enumeration;
pub use error::CodecError;
pub use fieldtable::{ElementKind, Field, FieldKind, FieldTable, ScalarKind};
pub use leaf::Leaf;
