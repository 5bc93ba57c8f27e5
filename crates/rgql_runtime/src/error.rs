//! Bridge errors and their GraphQL error representation.

use indexmap::IndexMap;
use rgql_resource::{GuardError, ResourceError, ResourceErrorKind};
use rgql_schema::ValidationErrors;
use rgql_syntax::{OperationLookupError, SyntaxErrors};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// Typed error codes reported under `extensions.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ParseError,
    NoOperation,
    ValidationError,
    UnknownField,
    AccessDenied,
    GuardFailed,
    DepthExceeded,
    PageSizeExceeded,
    MissingRequiredFilter,
    InvalidArgument,
    ConflictingSelection,
    InvalidResult,
    UnsupportedPagination,
    ResourceError,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::NoOperation => "NO_OPERATION",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::UnknownField => "UNKNOWN_FIELD",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::GuardFailed => "GUARD_FAILED",
            Self::DepthExceeded => "DEPTH_EXCEEDED",
            Self::PageSizeExceeded => "PAGE_SIZE_EXCEEDED",
            Self::MissingRequiredFilter => "MISSING_REQUIRED_FILTER",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ConflictingSelection => "CONFLICTING_SELECTION",
            Self::InvalidResult => "INVALID_RESULT",
            Self::UnsupportedPagination => "UNSUPPORTED_PAGINATION",
            Self::ResourceError => "RESOURCE_ERROR",
        }
    }

    /// Returns true if the request itself is at fault.
    pub const fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::GuardFailed | Self::InvalidResult | Self::ResourceError
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of access a guard protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Read,
    Filter,
    Sort,
    Traverse,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Filter => "filter",
            Self::Sort => "sort",
            Self::Traverse => "traverse",
        })
    }
}

/// Everything that can abort a request.
///
/// Any of these fails the whole operation; no partial data is returned.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Syntax(#[from] SyntaxErrors),

    #[error(transparent)]
    Operation(#[from] OperationLookupError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("unknown resource type `{0}`")]
    UnknownResource(String),

    #[error("`{resource}` has no attribute or relationship `{field}`")]
    UnknownField {
        resource: String,
        field: String,
        path: Vec<String>,
    },

    #[error("fragment `{0}` is not defined")]
    UnknownFragment(String),

    #[error("access denied: cannot {access} `{resource}.{name}`")]
    AccessDenied {
        resource: String,
        name: String,
        access: Access,
        path: Vec<String>,
    },

    #[error("guard on `{resource}.{name}` failed: {source}")]
    GuardFailed {
        resource: String,
        name: String,
        path: Vec<String>,
        #[source]
        source: GuardError,
    },

    #[error("query depth {depth} exceeds the maximum of {max}")]
    DepthExceeded {
        depth: usize,
        max: usize,
        path: Vec<String>,
    },

    #[error("page size {size} exceeds the maximum of {max}")]
    PageSizeExceeded {
        size: u64,
        max: u64,
        path: Vec<String>,
    },

    #[error("`{resource}` requires a filter on `{attribute}`")]
    MissingRequiredFilter {
        resource: String,
        attribute: String,
        path: Vec<String>,
    },

    #[error("`{resource}` cannot be filtered by `{attribute}`")]
    UnknownFilter {
        resource: String,
        attribute: String,
        path: Vec<String>,
    },

    #[error("filter `{resource}.{attribute}` does not support operator `{operator}`")]
    UnsupportedOperator {
        resource: String,
        attribute: String,
        operator: String,
        path: Vec<String>,
    },

    #[error("`{resource}` cannot be sorted by `{attribute}`")]
    UnknownSort {
        resource: String,
        attribute: String,
        path: Vec<String>,
    },

    #[error("invalid argument `{argument}`: {message}")]
    InvalidArgument {
        argument: String,
        message: String,
        path: Vec<String>,
    },

    #[error("relationship `{resource}.{relationship}` points to a single record and takes no arguments")]
    OneRelationshipArguments {
        resource: String,
        relationship: String,
        path: Vec<String>,
    },

    #[error("fields with response key `{key}` select different fields or arguments")]
    ConflictingSelection { key: String, path: Vec<String> },

    #[error("entity `{id}` of `{resource}` has unknown discriminant {discriminant:?}")]
    UnknownDiscriminant {
        resource: String,
        id: String,
        discriminant: Option<String>,
        path: Vec<String>,
    },

    #[error("resource layer returned {found} where {expected} was planned")]
    ResultShape {
        expected: &'static str,
        found: &'static str,
        path: Vec<String>,
    },

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl BridgeError {
    /// The typed error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Syntax(_) => ErrorCode::ParseError,
            Self::Operation(_) => ErrorCode::NoOperation,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::UnknownResource(_) | Self::UnknownField { .. } | Self::UnknownFragment(_) => {
                ErrorCode::UnknownField
            }
            Self::AccessDenied { .. } => ErrorCode::AccessDenied,
            Self::GuardFailed { .. } => ErrorCode::GuardFailed,
            Self::DepthExceeded { .. } => ErrorCode::DepthExceeded,
            Self::PageSizeExceeded { .. } => ErrorCode::PageSizeExceeded,
            Self::MissingRequiredFilter { .. } => ErrorCode::MissingRequiredFilter,
            Self::UnknownFilter { .. }
            | Self::UnsupportedOperator { .. }
            | Self::UnknownSort { .. }
            | Self::InvalidArgument { .. }
            | Self::OneRelationshipArguments { .. } => ErrorCode::InvalidArgument,
            Self::ConflictingSelection { .. } => ErrorCode::ConflictingSelection,
            Self::UnknownDiscriminant { .. } | Self::ResultShape { .. } => {
                ErrorCode::InvalidResult
            }
            Self::Resource(err) => match err.kind {
                ResourceErrorKind::UnsupportedPagination => ErrorCode::UnsupportedPagination,
                ResourceErrorKind::RequiredFilterMissing => ErrorCode::MissingRequiredFilter,
                ResourceErrorKind::NotFound | ResourceErrorKind::Backend => {
                    ErrorCode::ResourceError
                }
            },
        }
    }

    /// The response path the error relates to, if any.
    pub fn path(&self) -> Option<&[String]> {
        match self {
            Self::UnknownField { path, .. }
            | Self::AccessDenied { path, .. }
            | Self::GuardFailed { path, .. }
            | Self::DepthExceeded { path, .. }
            | Self::PageSizeExceeded { path, .. }
            | Self::MissingRequiredFilter { path, .. }
            | Self::UnknownFilter { path, .. }
            | Self::UnsupportedOperator { path, .. }
            | Self::UnknownSort { path, .. }
            | Self::InvalidArgument { path, .. }
            | Self::OneRelationshipArguments { path, .. }
            | Self::ConflictingSelection { path, .. }
            | Self::UnknownDiscriminant { path, .. }
            | Self::ResultShape { path, .. } => Some(path),
            Self::Resource(err) => Some(&err.path),
            Self::Validation(errors) => errors
                .first()
                .map(|e| e.path.as_slice())
                .filter(|p| !p.is_empty()),
            Self::Syntax(_)
            | Self::Operation(_)
            | Self::UnknownResource(_)
            | Self::UnknownFragment(_) => None,
        }
    }

    /// Structured details reported next to the code.
    fn details(&self) -> IndexMap<&'static str, Value> {
        let mut details = IndexMap::new();
        match self {
            Self::AccessDenied {
                resource,
                name,
                access,
                ..
            } => {
                details.insert("type", json!(resource));
                details.insert("field", json!(name));
                details.insert("access", json!(access));
            }
            Self::GuardFailed { resource, name, .. } => {
                details.insert("type", json!(resource));
                details.insert("field", json!(name));
            }
            Self::UnknownField {
                resource, field, ..
            } => {
                details.insert("type", json!(resource));
                details.insert("field", json!(field));
            }
            Self::DepthExceeded { depth, max, .. } => {
                details.insert("depth", json!(depth));
                details.insert("maxDepth", json!(max));
            }
            Self::PageSizeExceeded { size, max, .. } => {
                details.insert("size", json!(size));
                details.insert("maxPageSize", json!(max));
            }
            Self::MissingRequiredFilter {
                resource,
                attribute,
                ..
            }
            | Self::UnknownFilter {
                resource,
                attribute,
                ..
            }
            | Self::UnknownSort {
                resource,
                attribute,
                ..
            } => {
                details.insert("type", json!(resource));
                details.insert("attribute", json!(attribute));
            }
            Self::UnsupportedOperator {
                resource,
                attribute,
                operator,
                ..
            } => {
                details.insert("type", json!(resource));
                details.insert("attribute", json!(attribute));
                details.insert("operator", json!(operator));
            }
            Self::Validation(errors) => {
                let codes: Vec<_> = errors.errors.iter().map(|e| e.code).collect();
                details.insert("validation", json!(codes));
            }
            Self::Resource(err) => {
                details.insert("relationshipPath", json!(err.path.join(".")));
            }
            _ => {}
        }
        details
    }

    /// Converts the error into a GraphQL error object.
    pub fn to_field_error(&self) -> FieldError {
        let mut error = FieldError::new(self.to_string()).with_code(self.code());
        if let Some(path) = self.path() {
            error = error.with_path(path.to_vec());
        }
        for (key, value) in self.details() {
            error = error.with_extension(key, value);
        }
        error
    }
}

/// A GraphQL error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub extensions: IndexMap<String, Value>,
}

impl FieldError {
    /// Creates a new field error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            extensions: IndexMap::new(),
        }
    }

    /// Adds a path to the error.
    #[must_use]
    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = Some(path);
        self
    }

    /// Adds an extension.
    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    /// Sets the error code extension.
    #[must_use]
    pub fn with_code(self, code: ErrorCode) -> Self {
        self.with_extension("code", Value::String(code.as_str().to_string()))
    }

    /// The code extension, if set.
    pub fn code(&self) -> Option<&str> {
        self.extensions.get("code").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_names_the_attribute() {
        let err = BridgeError::AccessDenied {
            resource: "Employee".into(),
            name: "salary".into(),
            access: Access::Read,
            path: vec!["employees".into()],
        };
        let error = err.to_field_error();

        assert_eq!(error.message, "access denied: cannot read `Employee.salary`");
        assert_eq!(error.code(), Some("ACCESS_DENIED"));
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "message": "access denied: cannot read `Employee.salary`",
                "path": ["employees"],
                "extensions": {
                    "code": "ACCESS_DENIED",
                    "type": "Employee",
                    "field": "salary",
                    "access": "read"
                }
            })
        );
    }

    #[test]
    fn test_resource_errors_keep_their_path() {
        let err = BridgeError::from(ResourceError::new(
            ResourceErrorKind::UnsupportedPagination,
            vec!["employees".into(), "positions".into()],
            "cannot page",
        ));
        assert_eq!(err.code(), ErrorCode::UnsupportedPagination);
        assert_eq!(err.path(), Some(&["employees".to_string(), "positions".to_string()][..]));
        assert_eq!(
            err.to_field_error().extensions["relationshipPath"],
            json!("employees.positions")
        );
    }

    #[test]
    fn test_code_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(ErrorCode::DepthExceeded).unwrap(),
            json!("DEPTH_EXCEEDED")
        );
        assert!(!ErrorCode::ResourceError.is_client_error());
    }
}
