//! Resource type declarations.

use crate::attribute::AttributeSpec;
use crate::filter::FilterSpec;
use crate::kind::AttributeKind;
use crate::relationship::RelationshipSpec;
use crate::sort::SortSpec;
use indexmap::IndexMap;

/// Public root-query names of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entrypoint {
    /// Collection field, e.g. `employees`.
    pub collection: String,
    /// Singular lookup field, e.g. `employee`.
    pub single: String,
}

/// A resource type and its declared capabilities.
///
/// Declared with the `with_*` builders, then finalized by
/// [`RegistryBuilder::build`](crate::RegistryBuilder::build), which merges
/// inherited capabilities and derives filters and sorts.
#[derive(Debug, Clone)]
pub struct ResourceType {
    pub name: String,
    pub description: Option<String>,
    pub entrypoint: Option<Entrypoint>,
    pub parent: Option<String>,
    /// Discriminant value this type is registered under in its parent.
    pub discriminant: Option<String>,
    pub attributes: IndexMap<String, AttributeSpec>,
    pub relationships: IndexMap<String, RelationshipSpec>,
    pub filters: IndexMap<String, FilterSpec>,
    pub sorts: IndexMap<String, SortSpec>,
    /// Concrete variant types keyed by discriminant.
    pub variants: IndexMap<String, String>,
    /// Synthesized for polymorphic relationships; never queried directly.
    pub is_abstract: bool,
}

impl ResourceType {
    /// Creates a new resource type with an `id` attribute.
    pub fn new(name: impl Into<String>) -> Self {
        let mut attributes = IndexMap::new();
        attributes.insert("id".to_string(), AttributeSpec::new("id", AttributeKind::Id));
        Self {
            name: name.into(),
            description: None,
            entrypoint: None,
            parent: None,
            discriminant: None,
            attributes,
            relationships: IndexMap::new(),
            filters: IndexMap::new(),
            sorts: IndexMap::new(),
            variants: IndexMap::new(),
            is_abstract: false,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Exposes the resource at the root of the query type.
    #[must_use]
    pub fn with_entrypoint(mut self, collection: impl Into<String>, single: impl Into<String>) -> Self {
        self.entrypoint = Some(Entrypoint {
            collection: collection.into(),
            single: single.into(),
        });
        self
    }

    /// Declares this type a variant of `parent` under `discriminant`.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>, discriminant: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self.discriminant = Some(discriminant.into());
        self
    }

    /// Adds an attribute, replacing any attribute of the same name.
    #[must_use]
    pub fn with_attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.insert(attribute.name.clone(), attribute);
        self
    }

    #[must_use]
    pub fn with_relationship(mut self, relationship: RelationshipSpec) -> Self {
        self.relationships
            .insert(relationship.name.clone(), relationship);
        self
    }

    /// Declares a filter explicitly instead of deriving it.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filters.insert(filter.attribute.clone(), filter);
        self
    }

    /// Declares a sort explicitly instead of deriving it.
    #[must_use]
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sorts.insert(sort.attribute.clone(), sort);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.get(name)
    }

    pub fn relationship(&self, name: &str) -> Option<&RelationshipSpec> {
        self.relationships.get(name)
    }

    pub fn filter(&self, attribute: &str) -> Option<&FilterSpec> {
        self.filters.get(attribute)
    }

    pub fn sort(&self, attribute: &str) -> Option<&SortSpec> {
        self.sorts.get(attribute)
    }

    /// Whether entities of this type carry a discriminant.
    pub fn is_polymorphic(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Returns the variant type name for a discriminant.
    pub fn variant(&self, discriminant: &str) -> Option<&str> {
        self.variants.get(discriminant).map(String::as_str)
    }
}
