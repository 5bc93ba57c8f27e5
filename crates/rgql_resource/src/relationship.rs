//! Relationship declarations.

use crate::guard::Guard;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How many related entities a relationship yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    HasMany,
    ManyToMany,
    HasOne,
    BelongsTo,
    PolymorphicBelongsTo,
}

impl RelationshipKind {
    pub const fn cardinality(self) -> Cardinality {
        match self {
            Self::HasMany | Self::ManyToMany => Cardinality::Many,
            Self::HasOne | Self::BelongsTo | Self::PolymorphicBelongsTo => Cardinality::One,
        }
    }
}

/// A relationship from one resource to another.
#[derive(Debug, Clone)]
pub struct RelationshipSpec {
    pub name: String,
    pub kind: RelationshipKind,
    /// Target resource type. For polymorphic belongs-to relationships this is
    /// the abstract type synthesized by the registry.
    pub target: String,
    /// Candidate resource types keyed by discriminant.
    pub candidates: IndexMap<String, String>,
    pub guard: Guard,
    pub description: Option<String>,
}

impl RelationshipSpec {
    fn new(name: impl Into<String>, kind: RelationshipKind, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            target: target.into(),
            candidates: IndexMap::new(),
            guard: Guard::Allow,
            description: None,
        }
    }

    pub fn has_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, RelationshipKind::HasMany, target)
    }

    pub fn many_to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, RelationshipKind::ManyToMany, target)
    }

    pub fn has_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, RelationshipKind::HasOne, target)
    }

    pub fn belongs_to(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, RelationshipKind::BelongsTo, target)
    }

    /// A to-one relationship whose target type depends on the entity.
    pub fn polymorphic_belongs_to<D, T>(
        name: impl Into<String>,
        candidates: impl IntoIterator<Item = (D, T)>,
    ) -> Self
    where
        D: Into<String>,
        T: Into<String>,
    {
        let mut spec = Self::new(name, RelationshipKind::PolymorphicBelongsTo, String::new());
        spec.candidates = candidates
            .into_iter()
            .map(|(d, t)| (d.into(), t.into()))
            .collect();
        spec
    }

    /// Sets the traversal guard.
    #[must_use]
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn cardinality(&self) -> Cardinality {
        self.kind.cardinality()
    }

    /// Only to-many relationships take `filter`, `sort` and `page`.
    pub fn accepts_arguments(&self) -> bool {
        self.cardinality() == Cardinality::Many
    }

    pub fn is_polymorphic(&self) -> bool {
        self.kind == RelationshipKind::PolymorphicBelongsTo
    }
}
