//! Semantic attribute kinds.

use crate::filter::FilterOperator;
use serde_json::Value;
use std::fmt;

/// The semantic kind of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Id,
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
    Date,
    /// Free-form structured value, exposed as `JSON`.
    Object,
    Array(Box<AttributeKind>),
    /// An application-defined kind that behaves like `canonical`.
    Custom {
        name: String,
        canonical: Box<AttributeKind>,
    },
}

impl AttributeKind {
    /// Creates an array kind.
    pub fn array_of(kind: AttributeKind) -> Self {
        Self::Array(Box::new(kind))
    }

    /// Creates a custom kind aliasing a standard one.
    pub fn custom(name: impl Into<String>, canonical: AttributeKind) -> Self {
        Self::Custom {
            name: name.into(),
            canonical: Box::new(canonical),
        }
    }

    /// Resolves custom kinds to the standard kind they alias.
    pub fn canonical(&self) -> &AttributeKind {
        match self {
            Self::Custom { canonical, .. } => canonical.canonical(),
            other => other,
        }
    }

    /// Object and array attributes cannot be filtered or sorted by default.
    pub fn is_structured(&self) -> bool {
        matches!(self.canonical(), Self::Object | Self::Array(_))
    }

    /// The GraphQL scalar name used for this kind.
    ///
    /// Arrays report their element scalar; list wrapping is applied by the
    /// schema builder.
    pub fn scalar_name(&self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::String => "String",
            Self::Integer => "Int",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Datetime => "ISO8601DateTime",
            Self::Date => "ISO8601Date",
            Self::Object => "JSON",
            Self::Array(inner) => inner.scalar_name(),
            Self::Custom { canonical, .. } => canonical.scalar_name(),
        }
    }

    /// The operators a derived filter exposes for this kind.
    pub fn default_operators(&self) -> &'static [FilterOperator] {
        use FilterOperator::*;
        match self {
            Self::Id => &[Eq, NotEq],
            Self::String => &[
                Eq, NotEq, Eql, NotEql, Prefix, NotPrefix, Suffix, NotSuffix, Match, NotMatch,
            ],
            Self::Integer | Self::Float | Self::Datetime | Self::Date => {
                &[Eq, NotEq, Gt, Gte, Lt, Lte]
            }
            Self::Boolean => &[Eq],
            Self::Object | Self::Array(_) => &[],
            Self::Custom { canonical, .. } => canonical.default_operators(),
        }
    }

    /// Checks whether a single JSON value is acceptable as a filter value.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self.canonical(), value) {
            (_, Value::Null) => true,
            (Self::Id, Value::String(_) | Value::Number(_)) => true,
            (Self::String | Self::Datetime | Self::Date, Value::String(_)) => true,
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Float, Value::Number(_)) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Object, _) => true,
            (Self::Array(inner), Value::Array(items)) => items.iter().all(|v| inner.accepts(v)),
            _ => false,
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => f.write_str("id"),
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Boolean => f.write_str("boolean"),
            Self::Datetime => f.write_str("datetime"),
            Self::Date => f.write_str("date"),
            Self::Object => f.write_str("object"),
            Self::Array(inner) => write!(f, "array_of_{inner}"),
            Self::Custom { name, .. } => f.write_str(name),
        }
    }
}
