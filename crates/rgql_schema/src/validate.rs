//! Validates an operation against a generated schema.
//!
//! These are schema-shape errors: undeclared fields, arguments, input fields
//! (including filter operators a resource does not offer) and structural
//! selection mistakes. They are reported before any planning happens.

use crate::descriptor::{SchemaDescriptor, TypeDef, TypeRef};
use rgql_syntax::{
    Directive, Document, Field, FragmentDefinition, OperationDefinition, OperationType,
    Selection, SelectionSet, Span,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorCode {
    UnknownField,
    UnknownArgument,
    UnknownInputField,
    UnknownType,
    UnknownFragment,
    UnknownDirective,
    UndefinedVariable,
    MissingArgument,
    InvalidValue,
    LeafSelection,
    MissingSelection,
    InapplicableFragment,
    FragmentCycle,
    UnsupportedOperation,
}

/// A single schema-shape error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: ValidationErrorCode,
    pub message: String,
    /// Response path of the offending selection.
    pub path: Vec<String>,
    pub span: Span,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// All schema-shape errors of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if any error has the given code.
    pub fn has_code(&self, code: ValidationErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => f.write_str("validation failed"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more)", rest.len()),
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// Validates `operation` (from `document`) with the given variables.
pub fn validate(
    schema: &SchemaDescriptor,
    document: &Document,
    operation: &OperationDefinition,
    variables: &Map<String, Value>,
) -> Result<(), ValidationErrors> {
    let mut validator = Validator {
        schema,
        fragments: document.fragments(),
        variables,
        defined: operation
            .variables
            .iter()
            .map(|v| v.name.as_str())
            .collect(),
        errors: Vec::new(),
        path: Vec::new(),
        fragment_stack: Vec::new(),
    };

    if operation.operation == OperationType::Query {
        validator.selection_set(&operation.selection_set, &schema.query_type);
    } else {
        validator.error(
            ValidationErrorCode::UnsupportedOperation,
            operation.span,
            format!("{} operations are not supported", operation.operation),
        );
    }

    if validator.errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors {
            errors: validator.errors,
        })
    }
}

struct Validator<'a> {
    schema: &'a SchemaDescriptor,
    fragments: FxHashMap<&'a str, &'a FragmentDefinition>,
    variables: &'a Map<String, Value>,
    defined: FxHashSet<&'a str>,
    errors: Vec<ValidationError>,
    path: Vec<String>,
    fragment_stack: Vec<&'a str>,
}

impl<'a> Validator<'a> {
    fn error(&mut self, code: ValidationErrorCode, span: Span, message: String) {
        self.errors.push(ValidationError {
            code,
            message,
            path: self.path.clone(),
            span,
        });
    }

    fn selection_set(&mut self, set: &'a SelectionSet, parent: &str) {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) => {
                    self.directives(&field.directives);
                    self.field(field, parent);
                }
                Selection::FragmentSpread(spread) => {
                    self.directives(&spread.directives);
                    let name = spread.name.as_str();
                    let Some(fragment) = self.fragments.get(name).copied() else {
                        self.error(
                            ValidationErrorCode::UnknownFragment,
                            spread.span,
                            format!("unknown fragment `{name}`"),
                        );
                        continue;
                    };
                    if self.fragment_stack.contains(&name) {
                        self.error(
                            ValidationErrorCode::FragmentCycle,
                            spread.span,
                            format!("fragment `{name}` spreads itself"),
                        );
                        continue;
                    }
                    let condition = fragment.type_condition.as_str();
                    if self.applicable(condition, parent, fragment.type_condition.span) {
                        self.fragment_stack.push(name);
                        self.selection_set(&fragment.selection_set, condition);
                        self.fragment_stack.pop();
                    }
                }
                Selection::InlineFragment(inline) => {
                    self.directives(&inline.directives);
                    let condition = inline
                        .type_condition
                        .as_ref()
                        .map_or(parent, |name| name.as_str());
                    if self.applicable(condition, parent, inline.span) {
                        self.selection_set(&inline.selection_set, condition);
                    }
                }
            }
        }
    }

    fn field(&mut self, field: &'a Field, parent: &str) {
        let name = field.name.as_str();
        if name == "__typename" {
            if field.selection_set.is_some() {
                self.error(
                    ValidationErrorCode::LeafSelection,
                    field.span,
                    "field `__typename` cannot have a selection".to_string(),
                );
            }
            return;
        }

        let schema = self.schema;
        let Some(def) = schema.field(parent, name) else {
            self.error(
                ValidationErrorCode::UnknownField,
                field.name.span,
                format!("cannot query field `{name}` on type `{parent}`"),
            );
            return;
        };

        self.path.push(field.response_key().to_string());

        for arg in &field.arguments {
            self.undefined_variables(&arg.value, arg.span);
            match def.arguments.get(arg.name.as_str()) {
                Some(arg_def) => {
                    let value = arg.value.to_json(self.variables);
                    let location = format!("argument `{}`", arg.name.as_str());
                    self.value(&value, &arg_def.ty, &location, arg.span);
                }
                None => self.error(
                    ValidationErrorCode::UnknownArgument,
                    arg.name.span,
                    format!("unknown argument `{}` on field `{parent}.{name}`", arg.name.as_str()),
                ),
            }
        }
        for arg_def in def.arguments.values() {
            if arg_def.ty.is_non_null() && field.argument(&arg_def.name).is_none() {
                self.error(
                    ValidationErrorCode::MissingArgument,
                    field.span,
                    format!(
                        "field `{parent}.{name}` requires argument `{}` of type `{}`",
                        arg_def.name, arg_def.ty
                    ),
                );
            }
        }

        let target = def.ty.named_type();
        let composite = schema.get_type(target).is_some_and(TypeDef::is_composite);
        match (&field.selection_set, composite) {
            (Some(set), true) => self.selection_set(set, target),
            (None, true) => self.error(
                ValidationErrorCode::MissingSelection,
                field.span,
                format!("field `{name}` of type `{}` must have a selection of subfields", def.ty),
            ),
            (Some(_), false) => self.error(
                ValidationErrorCode::LeafSelection,
                field.span,
                format!("field `{name}` of type `{}` cannot have a selection", def.ty),
            ),
            (None, false) => {}
        }

        self.path.pop();
    }

    /// Checks a fragment type condition against the enclosing type.
    fn applicable(&mut self, condition: &str, parent: &str, span: Span) -> bool {
        let schema = self.schema;
        match schema.get_type(condition) {
            None => {
                self.error(
                    ValidationErrorCode::UnknownType,
                    span,
                    format!("unknown type `{condition}`"),
                );
                false
            }
            Some(ty) if !ty.is_composite() => {
                self.error(
                    ValidationErrorCode::InapplicableFragment,
                    span,
                    format!("fragment cannot condition on non-composite type `{condition}`"),
                );
                false
            }
            Some(_) => {
                let parent_types = schema.possible_types(parent);
                let overlaps = condition == parent
                    || schema
                        .possible_types(condition)
                        .iter()
                        .any(|t| parent_types.contains(t));
                if !overlaps {
                    self.error(
                        ValidationErrorCode::InapplicableFragment,
                        span,
                        format!("fragment on `{condition}` can never apply within `{parent}`"),
                    );
                }
                overlaps
            }
        }
    }

    fn directives(&mut self, directives: &[Directive]) {
        for directive in directives {
            let name = directive.name.as_str();
            if name != "skip" && name != "include" {
                self.error(
                    ValidationErrorCode::UnknownDirective,
                    directive.name.span,
                    format!("unknown directive `@{name}`"),
                );
                continue;
            }
            let condition = directive
                .arguments
                .iter()
                .find(|arg| arg.name.as_str() == "if");
            match condition {
                Some(arg) => {
                    self.undefined_variables(&arg.value, arg.span);
                    if !arg.value.to_json(self.variables).is_boolean() {
                        self.error(
                            ValidationErrorCode::InvalidValue,
                            arg.span,
                            format!("`@{name}(if:)` expects a Boolean"),
                        );
                    }
                }
                None => self.error(
                    ValidationErrorCode::MissingArgument,
                    directive.span,
                    format!("directive `@{name}` requires argument `if`"),
                ),
            }
        }
    }

    fn undefined_variables(&mut self, value: &rgql_syntax::Value, span: Span) {
        for var in value.variables() {
            if !self.defined.contains(var.as_str()) {
                self.error(
                    ValidationErrorCode::UndefinedVariable,
                    span,
                    format!("variable `${}` is not defined", var.as_str()),
                );
            }
        }
    }

    fn value(&mut self, value: &Value, ty: &TypeRef, location: &str, span: Span) {
        match ty {
            TypeRef::NonNull(inner) => {
                if value.is_null() {
                    self.error(
                        ValidationErrorCode::InvalidValue,
                        span,
                        format!("{location} expects a non-null `{ty}`"),
                    );
                } else {
                    self.value(value, inner, location, span);
                }
            }
            TypeRef::List(inner) => match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items {
                        self.value(item, inner, location, span);
                    }
                }
                // A single value coerces to a one-item list.
                other => self.value(other, inner, location, span),
            },
            TypeRef::Named(name) => {
                if value.is_null() {
                    return;
                }
                self.named_value(value, name, location, span);
            }
        }
    }

    fn named_value(&mut self, value: &Value, name: &str, location: &str, span: Span) {
        let schema = self.schema;
        match schema.get_type(name) {
            Some(TypeDef::Scalar(_)) => {
                let valid = match name {
                    "Int" => value.is_i64() || value.is_u64(),
                    "Float" => value.is_number(),
                    "String" | "ISO8601DateTime" | "ISO8601Date" => value.is_string(),
                    "Boolean" => value.is_boolean(),
                    "ID" => value.is_string() || value.is_i64() || value.is_u64(),
                    _ => true,
                };
                if !valid {
                    self.error(
                        ValidationErrorCode::InvalidValue,
                        span,
                        format!("{location} expects `{name}`, found {value}"),
                    );
                }
            }
            Some(TypeDef::Enum(def)) => {
                let known = value
                    .as_str()
                    .is_some_and(|v| def.values.iter().any(|allowed| allowed == v));
                if !known {
                    self.error(
                        ValidationErrorCode::InvalidValue,
                        span,
                        format!("{location} expects a value of enum `{name}`, found {value}"),
                    );
                }
            }
            Some(TypeDef::InputObject(def)) => {
                let Value::Object(fields) = value else {
                    self.error(
                        ValidationErrorCode::InvalidValue,
                        span,
                        format!("{location} expects input object `{name}`, found {value}"),
                    );
                    return;
                };
                for (key, field_value) in fields {
                    match def.fields.get(key) {
                        Some(field_def) => {
                            let nested = format!("{location}.{key}");
                            self.value(field_value, &field_def.ty, &nested, span);
                        }
                        None => self.error(
                            ValidationErrorCode::UnknownInputField,
                            span,
                            format!("field `{key}` is not defined by input type `{name}`"),
                        ),
                    }
                }
                for field_def in def.fields.values() {
                    if field_def.ty.is_non_null() && !fields.contains_key(&field_def.name) {
                        self.error(
                            ValidationErrorCode::MissingArgument,
                            span,
                            format!(
                                "{location} is missing required field `{}` of `{name}`",
                                field_def.name
                            ),
                        );
                    }
                }
            }
            _ => self.error(
                ValidationErrorCode::InvalidValue,
                span,
                format!("{location} uses non-input type `{name}`"),
            ),
        }
    }
}
