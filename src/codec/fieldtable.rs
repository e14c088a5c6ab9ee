use serde_json::Value;

use crate::codec::collection::{Collection, CollectionPolicy};
use crate::codec::entity::{decode_with, encode_object, encode_with, field_table, Entity};
use crate::codec::enumeration::{decode_enum, encode_enum, Enumeration};
use crate::codec::error::{shape_of, CodecError};
use crate::codec::leaf::Leaf;

/// Scalar family of a leaf field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Integer,
    Float,
    Boolean,
    String,
}

/// Element family of a collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Scalars and date/time values.
    Leaf,
    /// Nested entities.
    Entity,
}

/// What a mapped field holds, resolved when the field is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Entity,
    Collection {
        element: ElementKind,
        policy: CollectionPolicy,
    },
    Date,
    Time,
    DateTime,
    Enum,
}

type Reader<T> = Box<dyn Fn(&T) -> Result<Value, CodecError> + Send + Sync>;
type Writer<T> = Box<dyn Fn(&mut T, &Value) -> Result<(), CodecError> + Send + Sync>;
type Resetter<T> = Box<dyn Fn(&mut T) + Send + Sync>;

/// A single mapped field: JSON key, kind, and typed accessors.
pub struct Field<T> {
    key: &'static str,
    kind: FieldKind,
    read: Reader<T>,
    write: Writer<T>,
    reset: Resetter<T>,
}

impl<T> Field<T> {
    /// JSON key the field is written under.
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Kind resolved when the field was registered.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub(crate) fn read(&self, entity: &T) -> Result<Value, CodecError> {
        (self.read)(entity)
    }

    pub(crate) fn write(&self, entity: &mut T, value: &Value) -> Result<(), CodecError> {
        (self.write)(entity, value)
    }

    /// Put the field back to the value it has in `T::default()`.
    pub(crate) fn reset(&self, entity: &mut T) {
        (self.reset)(entity)
    }
}

impl<T> std::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Ordered table of the mapped fields of an entity type.
///
/// Filled in by [`Entity::fields`] with accessor pairs. Plain non-capturing
/// closures such as `|u| &u.name` coerce to the function pointers each
/// method expects.
///
/// ```
/// use entity_http_client::codec::{Entity, FieldTable};
///
/// #[derive(Default)]
/// struct User {
///     id: i64,
///     name: String,
///     tags: Vec<String>,
/// }
///
/// impl Entity for User {
///     fn fields(table: FieldTable<Self>) -> FieldTable<Self> {
///         table
///             .field("id", |u| &u.id, |u| &mut u.id)
///             .field("name", |u| &u.name, |u| &mut u.name)
///             .collection("tags", |u| &u.tags, |u| &mut u.tags)
///     }
/// }
/// ```
pub struct FieldTable<T> {
    fields: Vec<Field<T>>,
}

impl<T: Entity> Default for FieldTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> FieldTable<T> {
    /// Create an empty table. [`field_table`] fills one in for an entity.
    pub fn new() -> Self {
        FieldTable { fields: vec![] }
    }

    /// Number of mapped fields, embedded ones included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Field<T>> {
        self.fields.iter()
    }

    /// Map a scalar or date/time field.
    pub fn field<V: Leaf + 'static>(
        self,
        key: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.with(
            key,
            V::KIND,
            Box::new(move |entity: &T| get(entity).to_json()),
            Box::new(move |entity: &mut T, value: &Value| {
                *get_mut(entity) = V::from_json(value)?;
                Ok(())
            }),
            get_mut,
        )
    }

    /// Map an enumeration field.
    pub fn enumeration<V: Enumeration>(
        self,
        key: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.with(
            key,
            FieldKind::Enum,
            Box::new(move |entity: &T| Ok(encode_enum(get(entity)))),
            Box::new(move |entity: &mut T, value: &Value| {
                *get_mut(entity) = decode_enum(value)?;
                Ok(())
            }),
            get_mut,
        )
    }

    /// Map a nested entity field.
    pub fn entity<E: Entity>(
        self,
        key: &'static str,
        get: fn(&T) -> &E,
        get_mut: fn(&mut T) -> &mut E,
    ) -> Self {
        self.with(
            key,
            FieldKind::Entity,
            Box::new(move |entity: &T| encode_object(get(entity)).map(Value::Object)),
            Box::new(move |entity: &mut T, value: &Value| {
                *get_mut(entity) = decode_nested(value)?;
                Ok(())
            }),
            get_mut,
        )
    }

    /// Map a nested entity that may be absent; `None` is written as `null`.
    pub fn optional_entity<E: Entity>(
        self,
        key: &'static str,
        get: fn(&T) -> &Option<E>,
        get_mut: fn(&mut T) -> &mut Option<E>,
    ) -> Self {
        self.with(
            key,
            FieldKind::Entity,
            Box::new(move |entity: &T| match get(entity) {
                Some(inner) => encode_object(inner).map(Value::Object),
                None => Ok(Value::Null),
            }),
            Box::new(move |entity: &mut T, value: &Value| {
                *get_mut(entity) = Some(decode_nested(value)?);
                Ok(())
            }),
            get_mut,
        )
    }

    /// Map a collection of scalars or date/time values.
    ///
    /// On decode, `null` elements and elements whose JSON shape the element
    /// type does not accept are dropped. This holds for `Option` items too.
    pub fn collection<C>(
        self,
        key: &'static str,
        get: fn(&T) -> &C,
        get_mut: fn(&mut T) -> &mut C,
    ) -> Self
    where
        C: Collection + 'static,
        C::Item: Leaf,
    {
        self.with(
            key,
            FieldKind::Collection {
                element: ElementKind::Leaf,
                policy: C::POLICY,
            },
            Box::new(move |entity: &T| {
                get(entity)
                    .items()
                    .map(Leaf::to_json)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }),
            Box::new(move |entity: &mut T, value: &Value| {
                let mut collection = C::default();
                for (index, element) in as_array(value)?.iter().enumerate() {
                    if !element.is_null() && <C::Item as Leaf>::accepts(element) {
                        let item = <C::Item as Leaf>::from_json(element)
                            .map_err(|e| e.at(&format!("[{index}]")))?;
                        collection.insert(item);
                    }
                }
                *get_mut(entity) = collection;
                Ok(())
            }),
            get_mut,
        )
    }

    /// Map a collection of nested entities.
    pub fn entities<C>(
        self,
        key: &'static str,
        get: fn(&T) -> &C,
        get_mut: fn(&mut T) -> &mut C,
    ) -> Self
    where
        C: Collection + 'static,
        C::Item: Entity,
    {
        self.with(
            key,
            FieldKind::Collection {
                element: ElementKind::Entity,
                policy: C::POLICY,
            },
            Box::new(move |entity: &T| {
                let table = field_table::<C::Item>();
                get(entity)
                    .items()
                    .map(|item| encode_with(&table, item).map(Value::Object))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }),
            Box::new(move |entity: &mut T, value: &Value| {
                let table = field_table::<C::Item>();
                let mut collection = C::default();
                for (index, element) in as_array(value)?.iter().enumerate() {
                    let item = match element {
                        Value::Object(object) => decode_with(&table, object),
                        Value::Array(_) => Err(CodecError::UnsupportedNestedCollection),
                        other => Err(CodecError::TypeMismatch {
                            expected: "object",
                            found: shape_of(other),
                        }),
                    }
                    .map_err(|e| e.at(&format!("[{index}]")))?;
                    collection.insert(item);
                }
                *get_mut(entity) = collection;
                Ok(())
            }),
            get_mut,
        )
    }

    /// Flatten the fields of an embedded base record into this table.
    ///
    /// The base's fields keep their own order and are placed where `embed`
    /// is called.
    pub fn embed<B: Entity>(mut self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B) -> Self {
        for base in field_table::<B>().fields {
            let Field {
                key,
                kind,
                read,
                write,
                reset,
            } = base;
            self.fields.push(Field {
                key,
                kind,
                read: Box::new(move |entity: &T| read(get(entity))),
                write: Box::new(move |entity: &mut T, value: &Value| write(get_mut(entity), value)),
                reset: Box::new(move |entity: &mut T| reset(get_mut(entity))),
            });
        }
        self
    }

    fn with<V: 'static>(
        mut self,
        key: &'static str,
        kind: FieldKind,
        read: Reader<T>,
        write: Writer<T>,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.fields.push(Field {
            key,
            kind,
            read,
            write,
            reset: Box::new(move |entity: &mut T| {
                let mut fresh = T::default();
                std::mem::swap(get_mut(entity), get_mut(&mut fresh));
            }),
        });
        self
    }
}

fn decode_nested<E: Entity>(value: &Value) -> Result<E, CodecError> {
    match value {
        Value::Object(object) => decode_with(&field_table::<E>(), object),
        other => Err(CodecError::NotAnObject {
            found: shape_of(other),
        }),
    }
}

fn as_array(value: &Value) -> Result<&Vec<Value>, CodecError> {
    value.as_array().ok_or(CodecError::TypeMismatch {
        expected: "array",
        found: shape_of(value),
    })
}
