//! The resource-layer contract.

use crate::context::RequestContext;
use crate::plan::PlanNode;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Executes plans against a data store.
///
/// Implementations return entities for `plan` with every child plan already
/// loaded under [`Entity::relationships`], keyed by the child's response key.
/// Polymorphic entities report their discriminant.
#[async_trait]
pub trait ResourceLayer: Send + Sync {
    async fn fetch(
        &self,
        plan: &PlanNode,
        ctx: &RequestContext,
    ) -> Result<Vec<Entity>, ResourceError>;
}

/// A loaded entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    pub id: String,
    pub discriminant: Option<String>,
    pub attributes: IndexMap<String, Value>,
    pub relationships: IndexMap<String, Related>,
}

/// Related entities loaded for one child plan.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    One(Option<Box<Entity>>),
    Many(Vec<Entity>),
}

impl Entity {
    /// Creates a new entity.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_discriminant(mut self, discriminant: impl Into<String>) -> Self {
        self.discriminant = Some(discriminant.into());
        self
    }

    /// Sets an attribute value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Reads an attribute; `id` falls back to the entity id.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        match self.attributes.get(name) {
            Some(value) => Some(value.clone()),
            None if name == "id" => Some(Value::String(self.id.clone())),
            None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceErrorKind {
    /// The entity does not exist. Resolved to `null` or `[]`.
    NotFound,
    /// The relationship cannot page independently per parent.
    UnsupportedPagination,
    RequiredFilterMissing,
    Backend,
}

impl fmt::Display for ResourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotFound => "not found",
            Self::UnsupportedPagination => "unsupported pagination",
            Self::RequiredFilterMissing => "required filter missing",
            Self::Backend => "backend error",
        })
    }
}

/// A failure reported by the resource layer, tagged with the response path
/// of the plan node that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at `{}`: {message}", .path.join("."))]
pub struct ResourceError {
    pub kind: ResourceErrorKind,
    pub path: Vec<String>,
    pub message: String,
}

impl ResourceError {
    pub fn new(kind: ResourceErrorKind, path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    pub fn not_found(plan: &PlanNode, message: impl Into<String>) -> Self {
        Self::new(ResourceErrorKind::NotFound, plan.path.clone(), message)
    }

    pub fn unsupported_pagination(plan: &PlanNode, message: impl Into<String>) -> Self {
        Self::new(
            ResourceErrorKind::UnsupportedPagination,
            plan.path.clone(),
            message,
        )
    }

    pub fn backend(plan: &PlanNode, message: impl Into<String>) -> Self {
        Self::new(ResourceErrorKind::Backend, plan.path.clone(), message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ResourceErrorKind::NotFound
    }
}
