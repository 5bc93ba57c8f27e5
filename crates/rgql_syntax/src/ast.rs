//! Abstract syntax tree for executable GraphQL documents.

use crate::span::Span;
use rustc_hash::FxHashMap;
use serde_json::Map;
use std::fmt;

/// A complete executable document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub definitions: Vec<Definition>,
    pub span: Span,
}

/// A top-level definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Operation(OperationDefinition),
    Fragment(FragmentDefinition),
}

/// Type of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        })
    }
}

/// Operation definition.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDefinition {
    pub operation: OperationType,
    pub name: Option<Name>,
    pub variables: Vec<VariableDefinition>,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet,
    pub span: Span,
}

/// Variable definition.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<Value>,
    pub span: Span,
}

/// Type reference in a variable definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Named(Name),
    List(Box<Type>, Span),
    NonNull(Box<Type>, Span),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(&name.value),
            Self::List(inner, _) => write!(f, "[{inner}]"),
            Self::NonNull(inner, _) => write!(f, "{inner}!"),
        }
    }
}

/// Fragment definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentDefinition {
    pub name: Name,
    pub type_condition: Name,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet,
    pub span: Span,
}

/// Selection set.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSet {
    pub selections: Vec<Selection>,
    pub span: Span,
}

/// Selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    FragmentSpread(FragmentSpread),
    InlineFragment(InlineFragment),
}

/// Field selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub alias: Option<Name>,
    pub name: Name,
    pub arguments: Vec<Argument>,
    pub directives: Vec<Directive>,
    pub selection_set: Option<SelectionSet>,
    pub span: Span,
}

impl Field {
    /// The key this field is reported under in the response.
    pub fn response_key(&self) -> &str {
        self.alias.as_ref().unwrap_or(&self.name).value.as_str()
    }

    /// Finds an argument by name.
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|arg| arg.name.value == name)
    }
}

/// Fragment spread.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpread {
    pub name: Name,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// Inline fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    pub type_condition: Option<Name>,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet,
    pub span: Span,
}

/// Directive usage.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: Name,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

/// Argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Name,
    pub value: Value,
    pub span: Span,
}

/// Input value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Variable(Name),
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Enum(String),
    List(Vec<Value>),
    Object(Vec<(Name, Value)>),
}

impl Value {
    /// Converts the value to JSON, substituting variables.
    ///
    /// Variables absent from `variables` resolve to `null`; callers that track
    /// variable defaults merge them into `variables` first (see
    /// [`OperationDefinition::coerce_variables`]).
    pub fn to_json(&self, variables: &Map<String, serde_json::Value>) -> serde_json::Value {
        match self {
            Self::Variable(name) => variables
                .get(&name.value)
                .cloned()
                .unwrap_or(serde_json::Value::Null),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) | Self::Enum(s) => serde_json::Value::String(s.clone()),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Null => serde_json::Value::Null,
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json(variables)).collect())
            }
            Self::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(name, v)| (name.value.clone(), v.to_json(variables)))
                    .collect(),
            ),
        }
    }

    /// Returns the names of all variables referenced by this value.
    pub fn variables(&self) -> Vec<&Name> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a Name>) {
        match self {
            Self::Variable(name) => out.push(name),
            Self::List(items) => items.iter().for_each(|v| v.collect_variables(out)),
            Self::Object(fields) => fields.iter().for_each(|(_, v)| v.collect_variables(out)),
            _ => {}
        }
    }
}

/// Name with span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub value: String,
    pub span: Span,
}

impl Name {
    pub fn new(value: impl Into<String>, span: Span) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// Errors raised when picking an operation out of a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationLookupError {
    #[error("document does not contain any operation")]
    NoOperation,
    #[error("operation name is required when the document contains {0} operations")]
    Ambiguous(usize),
    #[error("unknown operation named \"{0}\"")]
    Unknown(String),
}

impl Document {
    /// Iterates over the operations in the document.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDefinition> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        })
    }

    /// Returns the fragments in the document keyed by name.
    pub fn fragments(&self) -> FxHashMap<&str, &FragmentDefinition> {
        self.definitions
            .iter()
            .filter_map(|d| match d {
                Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
                Definition::Operation(_) => None,
            })
            .collect()
    }

    /// Selects the operation to execute.
    pub fn operation(&self, name: Option<&str>) -> Result<&OperationDefinition, OperationLookupError> {
        match name {
            Some(name) => self
                .operations()
                .find(|op| op.name.as_ref().is_some_and(|n| n.value == name))
                .ok_or_else(|| OperationLookupError::Unknown(name.to_string())),
            None => {
                let mut ops = self.operations();
                let first = ops.next().ok_or(OperationLookupError::NoOperation)?;
                match ops.count() {
                    0 => Ok(first),
                    rest => Err(OperationLookupError::Ambiguous(rest + 1)),
                }
            }
        }
    }
}

impl OperationDefinition {
    /// Merges variable defaults into the provided variables.
    pub fn coerce_variables(
        &self,
        provided: &Map<String, serde_json::Value>,
    ) -> Map<String, serde_json::Value> {
        let mut out = provided.clone();
        for def in &self.variables {
            if !out.contains_key(&def.name.value) {
                if let Some(default) = &def.default_value {
                    out.insert(def.name.value.clone(), default.to_json(&Map::new()));
                }
            }
        }
        out
    }
}
