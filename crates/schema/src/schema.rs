//! Field descriptors.
//!
//! Descriptors are plain data: building one never runs validation logic. [`Schema::check`]
//! reports descriptors that could never accept a value, so callers can fail at
//! construction time instead of on every request.

use crate::SchemaError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::Iter;

/// The shape a value must have.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Accepts any value, including a missing one.
    Any,
    String,
    /// Any JSON number; numeric strings are coerced.
    Number,
    /// An integral number; integral strings are coerced.
    Int,
    /// `true`/`false`; the strings `"true"` and `"false"` are coerced.
    Boolean,
    /// Exactly this value. Must be a string, number, boolean or null.
    Literal(Value),
    /// `null`, missing, or the inner schema.
    Nullable(Box<Schema>),
    List(Box<Schema>),
    Tuple(Vec<Schema>),
    /// An object with arbitrary keys whose values all match the inner schema.
    Record(Box<Schema>),
    /// The first matching variant wins.
    Union(Vec<Schema>),
    Struct(Fields),
}

impl Schema {
    pub fn literal<V: Into<Value>>(value: V) -> Self {
        Self::Literal(value.into())
    }

    pub fn nullable(inner: Schema) -> Self {
        Self::Nullable(Box::new(inner))
    }

    pub fn list(item: Schema) -> Self {
        Self::List(Box::new(item))
    }

    pub fn record(item: Schema) -> Self {
        Self::Record(Box::new(item))
    }

    pub fn union<I: IntoIterator<Item = Schema>>(variants: I) -> Self {
        Self::Union(variants.into_iter().collect())
    }

    pub fn tuple<I: IntoIterator<Item = Schema>>(items: I) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    /// Whether a struct may omit a field described by this schema.
    pub fn is_optional(&self) -> bool {
        matches!(self, Schema::Any | Schema::Nullable(_))
    }

    /// Checks that the descriptor is well formed.
    pub fn check(&self) -> Result<(), SchemaError> {
        self.check_at(&mut Vec::new())
    }

    fn check_at(&self, path: &mut Vec<String>) -> Result<(), SchemaError> {
        match self {
            Schema::Any | Schema::String | Schema::Number | Schema::Int | Schema::Boolean => Ok(()),
            Schema::Literal(value) => match value {
                Value::Array(_) | Value::Object(_) => Err(SchemaError::invalid_literal(path, value)),
                _ => Ok(()),
            },
            Schema::Nullable(inner) | Schema::List(inner) | Schema::Record(inner) => inner.check_at(path),
            Schema::Tuple(items) => items.iter().enumerate().try_for_each(|(index, item)| {
                path.push(index.to_string());
                let result = item.check_at(path);
                path.pop();
                result
            }),
            Schema::Union(variants) if variants.is_empty() => Err(SchemaError::empty_union(path)),
            Schema::Union(variants) => variants.iter().try_for_each(|variant| variant.check_at(path)),
            Schema::Struct(fields) => fields.check_at(path),
        }
    }
}

impl From<Fields> for Schema {
    fn from(fields: Fields) -> Self {
        Schema::Struct(fields)
    }
}

/// A named set of field descriptors.
///
/// Backed by an ordered map, so two sets declaring the same fields in a different order
/// compare equal and validate identically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    inner: BTreeMap<String, Schema>,
}

impl Fields {
    pub fn new() -> Self {
        Self { inner: BTreeMap::new() }
    }

    /// Adds a field, replacing any previous descriptor with the same name.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.insert(name, schema);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) -> Option<Schema> {
        self.inner.insert(name.into(), schema)
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.inner.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, Schema> {
        self.inner.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    fn check_at(&self, path: &mut Vec<String>) -> Result<(), SchemaError> {
        for (name, schema) in &self.inner {
            if name.is_empty() {
                return Err(SchemaError::empty_field_name(path));
            }
            path.push(name.clone());
            let result = schema.check_at(path);
            path.pop();
            result?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a Schema);
    type IntoIter = Iter<'a, String, Schema>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Schema)> for Fields {
    fn from_iter<T: IntoIterator<Item = (K, Schema)>>(iter: T) -> Self {
        Self { inner: iter.into_iter().map(|(name, schema)| (name.into(), schema)).collect() }
    }
}
