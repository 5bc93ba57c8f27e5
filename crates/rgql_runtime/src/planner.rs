//! Selection planning.
//!
//! The planner walks an operation's selection tree against the capability
//! registry and produces one [`PlanNode`] tree per root field. Every field,
//! filter and sort it puts into a plan has been resolved against a declared
//! capability and passed its guard for the request context. Planning happens
//! entirely before the resource layer is called.
//!
//! Fragments on a polymorphic node are split by discriminant: selections
//! made inside `... on Visa` only ever end up in the `Visa` variant plan,
//! and a relationship selected in two fragments gets one independent child
//! plan per discriminant, each carrying the arguments of its own fragment.

use crate::config::BridgeConfig;
use crate::error::{Access, BridgeError};
use crate::guard::GuardEvaluator;
use indexmap::IndexMap;
use rgql_resource::{
    AttributeKind, Cardinality, FilterOperator, FilterParam, FilterSpec, Guard, OutputField,
    PageParams, PlanNode, Registry, RelationshipSpec, RequestContext, ResourceType, SortDirection,
    SortParam, SortSpec, VariantPlan,
};
use rgql_syntax::{
    Directive, Document, Field, FragmentDefinition, OperationDefinition, Selection, SelectionSet,
};
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// A planned root field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RootPlan {
    /// A collection entrypoint.
    Collection(PlanNode),
    /// A singular entrypoint looked up by id.
    Single(PlanNode),
    /// `__typename` on the query root.
    Typename { key: String },
}

impl RootPlan {
    /// The response key of the root field.
    pub fn key(&self) -> &str {
        match self {
            Self::Collection(plan) | Self::Single(plan) => plan.response_key(),
            Self::Typename { key } => key,
        }
    }

    pub fn plan(&self) -> Option<&PlanNode> {
        match self {
            Self::Collection(plan) | Self::Single(plan) => Some(plan),
            Self::Typename { .. } => None,
        }
    }
}

/// Fields grouped by response key, in selection order.
type FieldGroups<'a> = IndexMap<String, Vec<&'a Field>>;

#[derive(Default)]
struct Collected<'a> {
    base: FieldGroups<'a>,
    variants: IndexMap<String, FieldGroups<'a>>,
}

#[derive(Debug, Clone, Copy)]
enum Scope<'a> {
    /// Applies to every entity of the node.
    Base,
    /// Applies only to entities with this discriminant.
    Variant {
        discriminant: &'a str,
        resource: &'a str,
    },
}

#[derive(Default)]
struct Selected {
    fields: Vec<String>,
    output: Vec<OutputField>,
    children: IndexMap<String, PlanNode>,
}

/// Plans operations for one request.
pub struct Planner<'a> {
    registry: &'a Registry,
    fragments: FxHashMap<&'a str, &'a FragmentDefinition>,
    variables: &'a Map<String, Value>,
    guards: GuardEvaluator<'a>,
    config: BridgeConfig,
}

impl<'a> Planner<'a> {
    /// Creates a new planner.
    ///
    /// `variables` must already include defaults from the operation's
    /// variable definitions.
    pub fn new(
        registry: &'a Registry,
        document: &'a Document,
        variables: &'a Map<String, Value>,
        ctx: &'a RequestContext,
    ) -> Self {
        Self {
            registry,
            fragments: document.fragments(),
            variables,
            guards: GuardEvaluator::new(ctx),
            config: BridgeConfig::default(),
        }
    }

    /// Sets the planning limits.
    #[must_use]
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Plans every root field of `operation`.
    pub fn plan_operation(
        &self,
        operation: &'a OperationDefinition,
    ) -> Result<Vec<RootPlan>, BridgeError> {
        let mut groups = FieldGroups::new();
        self.collect_root(&operation.selection_set, &mut groups, &mut Vec::new())?;

        // Depth is checked for every root before any root is planned.
        let mut depths = Vec::with_capacity(groups.len());
        for (key, fields) in &groups {
            let depth = self.root_depth(fields);
            if let Some(max) = self.config.max_depth {
                if depth > max {
                    return Err(BridgeError::DepthExceeded {
                        depth,
                        max,
                        path: vec![key.clone()],
                    });
                }
            }
            depths.push(depth);
        }

        let mut plans = Vec::with_capacity(groups.len());
        for ((key, fields), depth) in groups.iter().zip(depths) {
            plans.push(self.plan_root(key, fields, depth)?);
        }
        Ok(plans)
    }

    /// Plan depth of a root field, counting the root as 1.
    fn root_depth(&self, fields: &[&'a Field]) -> usize {
        let mut visiting = Vec::new();
        1 + fields
            .iter()
            .copied()
            .filter_map(|f| f.selection_set.as_ref())
            .map(|set| self.depth(set, &mut visiting))
            .max()
            .unwrap_or(0)
    }

    fn plan_root(
        &self,
        key: &str,
        fields: &[&'a Field],
        depth: usize,
    ) -> Result<RootPlan, BridgeError> {
        let path = vec![key.to_string()];
        let field = self.merged_field(key, fields, &[])?;
        let name = field.name.as_str();
        if name == "__typename" {
            return Ok(RootPlan::Typename {
                key: key.to_string(),
            });
        }

        let Some((entrypoint, resource)) = self
            .registry
            .entrypoints()
            .find(|(ep, _)| ep.collection == name || ep.single == name)
        else {
            return Err(BridgeError::UnknownField {
                resource: "Query".to_string(),
                field: name.to_string(),
                path,
            });
        };

        if entrypoint.collection == name {
            let mut plan = self.plan_node(resource, Cardinality::Many, None, path, fields)?;
            self.list_arguments(&mut plan, resource, field, true)?;
            debug!(entrypoint = name, depth, "planned collection");
            Ok(RootPlan::Collection(plan))
        } else {
            let mut plan = self.plan_node(resource, Cardinality::One, None, path, fields)?;
            plan.filters.push(self.id_filter(field, &plan.path)?);
            debug!(entrypoint = name, depth, "planned single");
            Ok(RootPlan::Single(plan))
        }
    }

    /// Plans one resource-typed position from the fields selecting it.
    fn plan_node(
        &self,
        resource: &'a ResourceType,
        cardinality: Cardinality,
        relationship: Option<&str>,
        path: Vec<String>,
        fields: &[&'a Field],
    ) -> Result<PlanNode, BridgeError> {
        let mut node = PlanNode::new(&resource.name, cardinality);
        node.relationship = relationship.map(str::to_string);
        node.path = path;

        let mut collected = Collected::default();
        let mut visiting = Vec::new();
        for field in fields.iter().copied() {
            if let Some(set) = &field.selection_set {
                self.collect(set, resource, Scope::Base, &mut collected, &mut visiting)?;
            }
        }
        let Collected { base, variants } = collected;

        let selected = self.plan_selection(resource, &node.path, &base)?;
        node.fields = selected.fields;
        node.output = selected.output;
        node.children = selected.children;

        for (discriminant, groups) in variants {
            let Some(variant) = resource
                .variant(&discriminant)
                .and_then(|name| self.registry.get(name))
            else {
                continue;
            };
            // Keys also selected on the base merge with the base selection.
            let mut merged = FieldGroups::new();
            for (key, fields) in groups {
                let mut all = base.get(&key).cloned().unwrap_or_default();
                all.extend(fields);
                merged.insert(key, all);
            }
            let selected = self.plan_selection(variant, &node.path, &merged)?;
            node.variants.insert(
                discriminant,
                VariantPlan {
                    resource: variant.name.clone(),
                    fields: selected.fields,
                    output: selected.output,
                    children: selected.children,
                },
            );
        }

        Ok(node)
    }

    fn plan_selection(
        &self,
        resource: &'a ResourceType,
        path: &[String],
        groups: &FieldGroups<'a>,
    ) -> Result<Selected, BridgeError> {
        let mut selected = Selected::default();
        for (key, fields) in groups {
            let field = self.merged_field(key, fields, path)?;
            let name = field.name.as_str();
            let mut field_path = path.to_vec();
            field_path.push(key.clone());

            if name == "__typename" {
                selected
                    .output
                    .push(OutputField::Typename { key: key.clone() });
            } else if let Some(attribute) = resource.attribute(name) {
                self.guards.require(
                    &attribute.readable,
                    Access::Read,
                    &resource.name,
                    name,
                    &field_path,
                )?;
                self.require_variants(resource, Access::Read, name, &field_path, |variant| {
                    variant.attribute(name).map(|attr| &attr.readable)
                })?;
                if !selected.fields.iter().any(|f| f == name) {
                    selected.fields.push(name.to_string());
                }
                selected.output.push(OutputField::Attribute {
                    key: key.clone(),
                    attribute: name.to_string(),
                });
            } else if let Some(relationship) = resource.relationship(name) {
                self.guards.require(
                    &relationship.guard,
                    Access::Traverse,
                    &resource.name,
                    name,
                    &field_path,
                )?;
                self.require_variants(resource, Access::Traverse, name, &field_path, |variant| {
                    variant.relationship(name).map(|rel| &rel.guard)
                })?;
                let child =
                    self.plan_relationship(resource, relationship, field, fields, field_path)?;
                selected
                    .output
                    .push(OutputField::Relationship { key: key.clone() });
                selected.children.insert(key.clone(), child);
            } else {
                return Err(BridgeError::UnknownField {
                    resource: resource.name.clone(),
                    field: name.to_string(),
                    path: field_path,
                });
            }
        }
        Ok(selected)
    }

    fn plan_relationship(
        &self,
        owner: &ResourceType,
        relationship: &'a RelationshipSpec,
        field: &'a Field,
        fields: &[&'a Field],
        path: Vec<String>,
    ) -> Result<PlanNode, BridgeError> {
        let target = self
            .registry
            .get(&relationship.target)
            .ok_or_else(|| BridgeError::UnknownResource(relationship.target.clone()))?;
        let cardinality = relationship.cardinality();

        if cardinality == Cardinality::One && !field.arguments.is_empty() {
            return Err(BridgeError::OneRelationshipArguments {
                resource: owner.name.clone(),
                relationship: relationship.name.clone(),
                path,
            });
        }

        let mut node = self.plan_node(target, cardinality, Some(&relationship.name), path, fields)?;
        if cardinality == Cardinality::Many {
            self.list_arguments(&mut node, target, field, false)?;
        }
        Ok(node)
    }

    /// A selection on a polymorphic node reaches every variant, so it must
    /// also pass the guard each variant declares for it.
    fn require_variants(
        &self,
        resource: &ResourceType,
        access: Access,
        name: &str,
        path: &[String],
        guard_of: impl Fn(&ResourceType) -> Option<&Guard>,
    ) -> Result<(), BridgeError> {
        for (_, variant) in self.registry.variants(resource) {
            if let Some(guard) = guard_of(variant) {
                self.guards.require(guard, access, &variant.name, name, path)?;
            }
        }
        Ok(())
    }

    /// Checks that every field under one response key selects the same
    /// field with the same arguments, and returns the first.
    fn merged_field(
        &self,
        key: &str,
        fields: &[&'a Field],
        path: &[String],
    ) -> Result<&'a Field, BridgeError> {
        let conflict = || BridgeError::ConflictingSelection {
            key: key.to_string(),
            path: path.to_vec(),
        };
        let (first, rest) = fields.split_first().ok_or_else(conflict)?;
        let arguments = self.arguments(first);
        for other in rest {
            if other.name.value != first.name.value || self.arguments(other) != arguments {
                return Err(conflict());
            }
        }
        Ok(first)
    }

    fn arguments(&self, field: &Field) -> Vec<(String, Value)> {
        let mut arguments: Vec<_> = field
            .arguments
            .iter()
            .map(|arg| (arg.name.value.clone(), arg.value.to_json(self.variables)))
            .collect();
        arguments.sort_by(|a, b| a.0.cmp(&b.0));
        arguments
    }

    // ---- selection collection ----

    fn collect_root(
        &self,
        set: &'a SelectionSet,
        groups: &mut FieldGroups<'a>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<(), BridgeError> {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) if self.included(&field.directives) => {
                    groups
                        .entry(field.response_key().to_string())
                        .or_default()
                        .push(field);
                }
                Selection::FragmentSpread(spread) if self.included(&spread.directives) => {
                    let fragment = self.fragment(spread.name.as_str())?;
                    let name = spread.name.as_str();
                    if !visiting.contains(&name) {
                        visiting.push(name);
                        self.collect_root(&fragment.selection_set, groups, visiting)?;
                        visiting.pop();
                    }
                }
                Selection::InlineFragment(inline) if self.included(&inline.directives) => {
                    self.collect_root(&inline.selection_set, groups, visiting)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn collect(
        &self,
        set: &'a SelectionSet,
        node: &'a ResourceType,
        scope: Scope<'a>,
        out: &mut Collected<'a>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<(), BridgeError> {
        for selection in &set.selections {
            match selection {
                Selection::Field(field) if self.included(&field.directives) => {
                    let groups = match scope {
                        Scope::Base => &mut out.base,
                        Scope::Variant { discriminant, .. } => {
                            out.variants.entry(discriminant.to_string()).or_default()
                        }
                    };
                    groups
                        .entry(field.response_key().to_string())
                        .or_default()
                        .push(field);
                }
                Selection::FragmentSpread(spread) if self.included(&spread.directives) => {
                    let fragment = self.fragment(spread.name.as_str())?;
                    let name = spread.name.as_str();
                    if !visiting.contains(&name) {
                        visiting.push(name);
                        self.collect_conditional(
                            Some(fragment.type_condition.as_str()),
                            &fragment.selection_set,
                            node,
                            scope,
                            out,
                            visiting,
                        )?;
                        visiting.pop();
                    }
                }
                Selection::InlineFragment(inline) if self.included(&inline.directives) => {
                    self.collect_conditional(
                        inline.type_condition.as_ref().map(|name| name.as_str()),
                        &inline.selection_set,
                        node,
                        scope,
                        out,
                        visiting,
                    )?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Routes a fragment's selections to the base or to the variants its
    /// type condition covers.
    fn collect_conditional(
        &self,
        condition: Option<&'a str>,
        set: &'a SelectionSet,
        node: &'a ResourceType,
        scope: Scope<'a>,
        out: &mut Collected<'a>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<(), BridgeError> {
        let Some(condition) = condition else {
            return self.collect(set, node, scope, out, visiting);
        };
        match scope {
            Scope::Variant { resource, .. } => {
                if self.covers(condition, resource) {
                    self.collect(set, node, scope, out, visiting)?;
                }
            }
            Scope::Base => {
                if node.name == condition
                    || (!node.is_polymorphic() && self.covers(condition, &node.name))
                {
                    self.collect(set, node, scope, out, visiting)?;
                } else {
                    for (discriminant, variant) in self.registry.variants(node) {
                        if self.covers(condition, &variant.name) {
                            let scope = Scope::Variant {
                                discriminant,
                                resource: &variant.name,
                            };
                            self.collect(set, node, scope, out, visiting)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether a fragment on `condition` applies to entities of `resource`.
    fn covers(&self, condition: &str, resource: &str) -> bool {
        condition == resource
            || self
                .registry
                .get(condition)
                .is_some_and(|ty| ty.variants.values().any(|v| v == resource))
    }

    fn fragment(&self, name: &str) -> Result<&'a FragmentDefinition, BridgeError> {
        self.fragments
            .get(name)
            .copied()
            .ok_or_else(|| BridgeError::UnknownFragment(name.to_string()))
    }

    /// Applies `@skip(if:)` and `@include(if:)`.
    fn included(&self, directives: &[Directive]) -> bool {
        directives.iter().all(|directive| {
            let condition = directive
                .arguments
                .iter()
                .find(|arg| arg.name.as_str() == "if")
                .and_then(|arg| arg.value.to_json(self.variables).as_bool());
            !matches!(
                (directive.name.as_str(), condition),
                ("skip", Some(true)) | ("include", Some(false))
            )
        })
    }

    /// Relationship levels nested below a selection set.
    fn depth(&self, set: &'a SelectionSet, visiting: &mut Vec<&'a str>) -> usize {
        let mut deepest = 0;
        for selection in &set.selections {
            let nested = match selection {
                Selection::Field(field) if self.included(&field.directives) => field
                    .selection_set
                    .as_ref()
                    .map_or(0, |set| 1 + self.depth(set, visiting)),
                Selection::FragmentSpread(spread) if self.included(&spread.directives) => {
                    let name = spread.name.as_str();
                    match self.fragments.get(name) {
                        Some(fragment) if !visiting.contains(&name) => {
                            visiting.push(name);
                            let depth = self.depth(&fragment.selection_set, visiting);
                            visiting.pop();
                            depth
                        }
                        _ => 0,
                    }
                }
                Selection::InlineFragment(inline) if self.included(&inline.directives) => {
                    self.depth(&inline.selection_set, visiting)
                }
                _ => 0,
            };
            deepest = deepest.max(nested);
        }
        deepest
    }

    // ---- arguments ----

    fn list_arguments(
        &self,
        node: &mut PlanNode,
        resource: &ResourceType,
        field: &Field,
        root: bool,
    ) -> Result<(), BridgeError> {
        for arg in &field.arguments {
            let value = arg.value.to_json(self.variables);
            match arg.name.as_str() {
                "filter" => node.filters = self.filters(resource, &value, &node.path)?,
                "sort" => node.sorts = self.sorts(resource, &value, &node.path)?,
                "page" => node.page = self.page(&value, &node.path)?,
                other => {
                    return Err(invalid_argument(other, "is not accepted here", &node.path));
                }
            }
        }

        if root {
            for spec in resource.filters.values().filter(|spec| spec.required) {
                if !node.filters.iter().any(|f| f.attribute == spec.attribute) {
                    return Err(BridgeError::MissingRequiredFilter {
                        resource: resource.name.clone(),
                        attribute: spec.attribute.clone(),
                        path: node.path.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn filters(
        &self,
        resource: &ResourceType,
        value: &Value,
        path: &[String],
    ) -> Result<Vec<FilterParam>, BridgeError> {
        let attributes = match value {
            Value::Null => return Ok(Vec::new()),
            Value::Object(attributes) => attributes,
            _ => return Err(invalid_argument("filter", "expects an input object", path)),
        };

        let mut params = Vec::new();
        for (attribute, operators) in attributes {
            let (spec, kind) = resource
                .filter(attribute)
                .and_then(|spec| resource.attribute(attribute).map(|attr| (spec, &attr.kind)))
                .ok_or_else(|| BridgeError::UnknownFilter {
                    resource: resource.name.clone(),
                    attribute: attribute.clone(),
                    path: path.to_vec(),
                })?;
            self.guards
                .require(spec.guard(), Access::Filter, &resource.name, attribute, path)?;
            self.require_variants(resource, Access::Filter, attribute, path, |variant| {
                variant.filter(attribute).map(FilterSpec::guard)
            })?;

            let operators = match operators {
                Value::Null => continue,
                Value::Object(operators) => operators,
                _ => {
                    let argument = format!("filter.{attribute}");
                    return Err(invalid_argument(&argument, "expects an input object", path));
                }
            };
            for (name, value) in operators {
                let operator = FilterOperator::from_name(name)
                    .filter(|op| spec.supports(*op))
                    .ok_or_else(|| BridgeError::UnsupportedOperator {
                        resource: resource.name.clone(),
                        attribute: attribute.clone(),
                        operator: name.clone(),
                        path: path.to_vec(),
                    })?;
                if value.is_null() {
                    continue;
                }
                if let Err(message) = check_filter_value(spec, kind, value) {
                    let argument = format!("filter.{attribute}.{name}");
                    return Err(invalid_argument(&argument, &message, path));
                }
                params.push(FilterParam {
                    attribute: attribute.clone(),
                    operator,
                    value: value.clone(),
                });
            }
        }
        Ok(params)
    }

    fn sorts(
        &self,
        resource: &ResourceType,
        value: &Value,
        path: &[String],
    ) -> Result<Vec<SortParam>, BridgeError> {
        let entries: Vec<&Value> = match value {
            Value::Null => return Ok(Vec::new()),
            Value::Array(entries) => entries.iter().collect(),
            single => vec![single],
        };

        let mut params = Vec::with_capacity(entries.len());
        for entry in entries {
            let attribute = entry
                .get("att")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid_argument("sort", "each entry needs `att`", path))?;
            let direction = match entry.get("dir") {
                None | Some(Value::Null) => SortDirection::Asc,
                Some(dir) => dir
                    .as_str()
                    .and_then(SortDirection::from_name)
                    .ok_or_else(|| invalid_argument("sort.dir", "expects `asc` or `desc`", path))?,
            };
            let spec = resource
                .sort(attribute)
                .filter(|spec| resource.attribute(&spec.attribute).is_some())
                .ok_or_else(|| BridgeError::UnknownSort {
                    resource: resource.name.clone(),
                    attribute: attribute.to_string(),
                    path: path.to_vec(),
                })?;
            self.guards
                .require(spec.guard(), Access::Sort, &resource.name, attribute, path)?;
            self.require_variants(resource, Access::Sort, attribute, path, |variant| {
                variant.sort(attribute).map(SortSpec::guard)
            })?;
            if !spec.directions.contains(&direction) {
                let message = format!("`{attribute}` cannot be sorted {direction}");
                return Err(invalid_argument("sort.dir", &message, path));
            }
            params.push(SortParam {
                attribute: attribute.to_string(),
                direction,
            });
        }
        Ok(params)
    }

    fn page(&self, value: &Value, path: &[String]) -> Result<Option<PageParams>, BridgeError> {
        let page = match value {
            Value::Null => return Ok(None),
            Value::Object(page) => page,
            _ => return Err(invalid_argument("page", "expects an input object", path)),
        };
        let size = positive(page.get("size"), "page.size", path)?;
        let number = positive(page.get("number"), "page.number", path)?;

        if let (Some(size), Some(max)) = (size, self.config.max_page_size) {
            if size > max {
                return Err(BridgeError::PageSizeExceeded {
                    size,
                    max,
                    path: path.to_vec(),
                });
            }
        }
        Ok((size.is_some() || number.is_some()).then_some(PageParams { size, number }))
    }

    fn id_filter(&self, field: &Field, path: &[String]) -> Result<FilterParam, BridgeError> {
        if let Some(other) = field.arguments.iter().find(|arg| arg.name.as_str() != "id") {
            return Err(invalid_argument(other.name.as_str(), "is not accepted here", path));
        }
        let id = match field
            .argument("id")
            .map(|arg| arg.value.to_json(self.variables))
        {
            Some(Value::String(id)) => id,
            Some(Value::Number(id)) => id.to_string(),
            Some(Value::Null) | None => return Err(invalid_argument("id", "is required", path)),
            Some(_) => return Err(invalid_argument("id", "expects an ID", path)),
        };
        Ok(FilterParam {
            attribute: "id".to_string(),
            operator: FilterOperator::Eql,
            value: Value::String(id),
        })
    }
}

fn invalid_argument(argument: &str, message: &str, path: &[String]) -> BridgeError {
    BridgeError::InvalidArgument {
        argument: argument.to_string(),
        message: message.to_string(),
        path: path.to_vec(),
    }
}

fn positive(value: Option<&Value>, argument: &str, path: &[String]) -> Result<Option<u64>, BridgeError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .filter(|n| *n > 0)
            .map(Some)
            .ok_or_else(|| invalid_argument(argument, "must be a positive integer", path)),
    }
}

fn check_filter_value(spec: &FilterSpec, kind: &AttributeKind, value: &Value) -> Result<(), String> {
    let items: Vec<&Value> = match value {
        Value::Array(_) if spec.single => return Err("accepts a single value".to_string()),
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    let element = match kind.canonical() {
        AttributeKind::Array(inner) => inner.as_ref(),
        other => other,
    };
    for item in items {
        if !element.accepts(item) {
            return Err(format!("{item} is not a valid {element} value"));
        }
        if let Some(allowed) = &spec.allow {
            if !allowed.contains(item) {
                return Err(format!("{item} is not an allowed value"));
            }
        }
    }
    Ok(())
}
