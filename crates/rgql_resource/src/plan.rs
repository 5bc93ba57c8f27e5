//! Resource query plans.
//!
//! A plan mirrors the selected relationship tree of one root field. Each node
//! tells the resource layer which attributes to load, how to filter, sort and
//! page, and which relationships to load underneath. Polymorphic nodes carry
//! additional per-discriminant selections in [`PlanNode::variants`].

use crate::filter::FilterOperator;
use crate::relationship::Cardinality;
use crate::sort::SortDirection;
use indexmap::IndexMap;
use serde::Serialize;

/// One resource-typed position in the response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanNode {
    /// Resource type the node loads.
    pub resource: String,
    /// Relationship traversed from the parent, `None` at the root.
    pub relationship: Option<String>,
    /// Response path of the node, e.g. `["creditCards", "transactions"]`.
    pub path: Vec<String>,
    pub cardinality: Cardinality,
    /// Attribute names to load, deduplicated, in selection order.
    pub fields: Vec<String>,
    /// Response keys to produce, in selection order.
    pub output: Vec<OutputField>,
    pub filters: Vec<FilterParam>,
    pub sorts: Vec<SortParam>,
    pub page: Option<PageParams>,
    /// Child plans keyed by response key.
    pub children: IndexMap<String, PlanNode>,
    /// Additional selections keyed by discriminant.
    pub variants: IndexMap<String, VariantPlan>,
}

/// Selections that only apply to entities with one discriminant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantPlan {
    /// Concrete resource type of the variant.
    pub resource: String,
    pub fields: Vec<String>,
    /// Keys replacing or extending the base output.
    pub output: Vec<OutputField>,
    /// Children replacing or extending the base children.
    pub children: IndexMap<String, PlanNode>,
}

/// A key in the assembled response object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputField {
    Attribute { key: String, attribute: String },
    Relationship { key: String },
    Typename { key: String },
}

impl OutputField {
    pub fn key(&self) -> &str {
        match self {
            Self::Attribute { key, .. } | Self::Relationship { key } | Self::Typename { key } => key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterParam {
    pub attribute: String,
    pub operator: FilterOperator,
    /// A scalar, or a list meaning "any of".
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortParam {
    pub attribute: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageParams {
    pub size: Option<u64>,
    /// 1-based page number.
    pub number: Option<u64>,
}

impl PlanNode {
    /// Creates an empty node for a resource.
    pub fn new(resource: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            resource: resource.into(),
            relationship: None,
            path: Vec::new(),
            cardinality,
            fields: Vec::new(),
            output: Vec::new(),
            filters: Vec::new(),
            sorts: Vec::new(),
            page: None,
            children: IndexMap::new(),
            variants: IndexMap::new(),
        }
    }

    /// The response key of this node.
    pub fn response_key(&self) -> &str {
        self.path.last().map_or("", String::as_str)
    }

    /// The path joined with dots, for error messages.
    pub fn path_display(&self) -> String {
        self.path.join(".")
    }

    /// Attribute names to load for an entity with the given discriminant.
    pub fn fields_for(&self, discriminant: Option<&str>) -> Vec<&str> {
        let mut fields: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        if let Some(variant) = discriminant.and_then(|d| self.variants.get(d)) {
            for field in &variant.fields {
                if !fields.contains(&field.as_str()) {
                    fields.push(field);
                }
            }
        }
        fields
    }

    /// Child plans that apply to an entity with the given discriminant.
    ///
    /// Variant children replace base children with the same response key.
    pub fn children_for(&self, discriminant: Option<&str>) -> Vec<&PlanNode> {
        let variant = discriminant.and_then(|d| self.variants.get(d));
        let mut children: Vec<&PlanNode> = self
            .children
            .iter()
            .map(|(key, child)| {
                variant
                    .and_then(|v| v.children.get(key))
                    .unwrap_or(child)
            })
            .collect();
        if let Some(variant) = variant {
            children.extend(
                variant
                    .children
                    .iter()
                    .filter(|(key, _)| !self.children.contains_key(*key))
                    .map(|(_, child)| child),
            );
        }
        children
    }

    /// Output keys for an entity with the given discriminant.
    pub fn output_for(&self, discriminant: Option<&str>) -> Vec<&OutputField> {
        let variant = discriminant.and_then(|d| self.variants.get(d));
        let mut output: Vec<&OutputField> = self
            .output
            .iter()
            .map(|field| {
                variant
                    .and_then(|v| v.output.iter().find(|o| o.key() == field.key()))
                    .unwrap_or(field)
            })
            .collect();
        if let Some(variant) = variant {
            output.extend(
                variant
                    .output
                    .iter()
                    .filter(|o| !self.output.iter().any(|base| base.key() == o.key())),
            );
        }
        output
    }

    /// Number of nested plan levels, counting this node.
    pub fn depth(&self) -> usize {
        let base = self.children.values().map(PlanNode::depth);
        let variants = self
            .variants
            .values()
            .flat_map(|v| v.children.values().map(PlanNode::depth));
        1 + base.chain(variants).max().unwrap_or(0)
    }
}
