//! Builds a [`SchemaDescriptor`] from a capability registry.
//!
//! Only capabilities whose guard is not statically denied become schema
//! surface. Runtime guards are checked while planning each request.

use crate::descriptor::{
    EnumDef, FieldDef, InputFieldDef, InputObjectDef, InterfaceDef, ObjectDef, ScalarDef,
    SchemaDescriptor, TypeDef, TypeRef, BUILTIN_SCALARS,
};
use indexmap::IndexMap;
use rgql_resource::{AttributeKind, AttributeSpec, Cardinality, Entrypoint, Registry, ResourceType};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use thiserror::Error;

pub const QUERY_TYPE: &str = "Query";
pub const PAGE_INPUT: &str = "Page";
pub const SORT_DIRECTION_ENUM: &str = "SortDir";

/// Errors raised while building a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("root field `{name}` is declared by both `{first}` and `{second}`")]
    EntrypointCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("filter on `{resource}` references unknown attribute `{attribute}`")]
    UnknownFilterAttribute { resource: String, attribute: String },

    #[error("sort on `{resource}` references unknown attribute `{attribute}`")]
    UnknownSortAttribute { resource: String, attribute: String },

    #[error("unknown entrypoint `{0}`")]
    UnknownEntrypoint(String),

    #[error("no entrypoints to expose")]
    NoEntrypoints,
}

/// Name of the filter input for a resource.
pub fn filter_input_name(resource: &str) -> String {
    format!("{resource}Filter")
}

/// Name of the per-attribute operator input.
pub fn filter_attribute_input_name(resource: &str, attribute: &str) -> String {
    format!("{resource}Filter{}", upper_first(attribute))
}

pub fn sort_input_name(resource: &str) -> String {
    format!("{resource}Sort")
}

pub fn sort_attribute_enum_name(resource: &str) -> String {
    format!("{resource}SortAtt")
}

fn upper_first(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}

/// Builds the schema for `entrypoints` (collection or singular field names,
/// or resource names), or for every entrypoint when `None`.
pub fn build(
    registry: &Registry,
    entrypoints: Option<&[&str]>,
) -> Result<SchemaDescriptor, SchemaError> {
    check_capabilities(registry)?;
    let roots = select_entrypoints(registry, entrypoints)?;

    let mut builder = Builder::new(registry);
    let mut query = ObjectDef {
        name: QUERY_TYPE.to_string(),
        description: None,
        fields: IndexMap::new(),
        implements: Vec::new(),
    };

    for (entrypoint, ty) in roots {
        builder.require(&ty.name);
        let collection = builder.many_field(&entrypoint.collection, ty);
        query.fields.insert(entrypoint.collection.clone(), collection);
        query.fields.insert(
            entrypoint.single.clone(),
            FieldDef::new(&entrypoint.single, TypeRef::named(&ty.name))
                .with_description(ty.description.clone())
                .with_argument(InputFieldDef::new(
                    "id",
                    TypeRef::non_null(TypeRef::named("ID")),
                )),
        );
    }

    builder.drain();
    builder.link_interfaces();

    let mut types = IndexMap::with_capacity(builder.types.len() + BUILTIN_SCALARS.len() + 1);
    for name in BUILTIN_SCALARS {
        types.insert(
            name.to_string(),
            TypeDef::Scalar(ScalarDef {
                name: name.to_string(),
                description: None,
            }),
        );
    }
    types.extend(builder.types);
    types.insert(QUERY_TYPE.to_string(), TypeDef::Object(query));

    tracing::debug!(types = types.len(), "schema descriptor built");
    Ok(SchemaDescriptor {
        query_type: QUERY_TYPE.to_string(),
        types,
    })
}

fn check_capabilities(registry: &Registry) -> Result<(), SchemaError> {
    let mut root_fields: FxHashMap<&str, &str> = FxHashMap::default();
    for ty in registry.types() {
        if let Some(attribute) = ty.filters.keys().find(|a| ty.attribute(a).is_none()) {
            return Err(SchemaError::UnknownFilterAttribute {
                resource: ty.name.clone(),
                attribute: attribute.clone(),
            });
        }
        if let Some(attribute) = ty.sorts.keys().find(|a| ty.attribute(a).is_none()) {
            return Err(SchemaError::UnknownSortAttribute {
                resource: ty.name.clone(),
                attribute: attribute.clone(),
            });
        }
        if let Some(ep) = &ty.entrypoint {
            for name in [ep.collection.as_str(), ep.single.as_str()] {
                if let Some(first) = root_fields.insert(name, &ty.name) {
                    return Err(SchemaError::EntrypointCollision {
                        name: name.to_string(),
                        first: first.to_string(),
                        second: ty.name.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn select_entrypoints<'a>(
    registry: &'a Registry,
    wanted: Option<&[&str]>,
) -> Result<Vec<(&'a Entrypoint, &'a ResourceType)>, SchemaError> {
    let selected: Vec<_> = match wanted {
        None => registry.entrypoints().collect(),
        Some(names) => names
            .iter()
            .map(|name| {
                registry
                    .entrypoints()
                    .find(|(ep, ty)| ep.collection == *name || ep.single == *name || ty.name == *name)
                    .ok_or_else(|| SchemaError::UnknownEntrypoint((*name).to_string()))
            })
            .collect::<Result<_, _>>()?,
    };
    if selected.is_empty() {
        return Err(SchemaError::NoEntrypoints);
    }
    Ok(selected)
}

struct Builder<'a> {
    registry: &'a Registry,
    types: IndexMap<String, TypeDef>,
    queue: VecDeque<String>,
    seen: FxHashSet<String>,
}

impl<'a> Builder<'a> {
    fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            types: IndexMap::new(),
            queue: VecDeque::new(),
            seen: FxHashSet::default(),
        }
    }

    /// Schedules a resource type for emission.
    fn require(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.queue.push_back(name.to_string());
        }
    }

    fn drain(&mut self) {
        let registry = self.registry;
        while let Some(name) = self.queue.pop_front() {
            let Some(ty) = registry.get(&name) else {
                continue;
            };
            let fields = self.output_fields(ty);
            let def = if ty.is_polymorphic() {
                for variant in ty.variants.values() {
                    self.require(variant);
                }
                TypeDef::Interface(InterfaceDef {
                    name: ty.name.clone(),
                    description: ty.description.clone(),
                    fields,
                })
            } else {
                TypeDef::Object(ObjectDef {
                    name: ty.name.clone(),
                    description: ty.description.clone(),
                    fields,
                    implements: Vec::new(),
                })
            };
            self.types.insert(ty.name.clone(), def);
        }
    }

    /// Declares every variant object as implementing its interfaces.
    fn link_interfaces(&mut self) {
        let mut links: Vec<(String, String)> = Vec::new();
        for ty in self.registry.types().filter(|ty| ty.is_polymorphic()) {
            if !self.types.contains_key(&ty.name) {
                continue;
            }
            for variant in ty.variants.values() {
                links.push((variant.clone(), ty.name.clone()));
            }
        }
        for (object, interface) in links {
            if let Some(TypeDef::Object(def)) = self.types.get_mut(&object) {
                if !def.implements.contains(&interface) {
                    def.implements.push(interface);
                }
            }
        }
    }

    /// An attribute is visible on an interface only when every variant
    /// exposes it too.
    fn attribute_visible(&self, ty: &ResourceType, attr: &AttributeSpec) -> bool {
        attr.readable.is_exposed()
            && self.registry.variants(ty).all(|(_, variant)| {
                variant
                    .attribute(&attr.name)
                    .is_some_and(|v| v.readable.is_exposed())
            })
    }

    fn output_fields(&mut self, ty: &ResourceType) -> IndexMap<String, FieldDef> {
        let registry = self.registry;
        let mut fields = IndexMap::new();
        for attr in ty.attributes.values() {
            if !self.attribute_visible(ty, attr) {
                continue;
            }
            let field = FieldDef::new(&attr.name, self.attribute_type(attr))
                .with_description(attr.description.clone());
            fields.insert(attr.name.clone(), field);
        }

        for rel in ty.relationships.values() {
            let visible = rel.guard.is_exposed()
                && registry.variants(ty).all(|(_, variant)| {
                    variant
                        .relationship(&rel.name)
                        .is_some_and(|v| v.guard.is_exposed())
                });
            let Some(target) = registry.get(&rel.target).filter(|_| visible) else {
                continue;
            };
            self.require(&target.name);
            let field = match rel.cardinality() {
                Cardinality::Many => self.many_field(&rel.name, target),
                Cardinality::One => FieldDef::new(&rel.name, TypeRef::named(&target.name)),
            };
            fields.insert(rel.name.clone(), field.with_description(rel.description.clone()));
        }
        fields
    }

    fn attribute_type(&mut self, attr: &AttributeSpec) -> TypeRef {
        let scalar = self.scalar(&attr.kind);
        match attr.kind.canonical() {
            AttributeKind::Array(_) => TypeRef::list(TypeRef::non_null(scalar)),
            _ if attr.name == "id" => TypeRef::non_null(scalar),
            _ => scalar,
        }
    }

    fn scalar(&mut self, kind: &AttributeKind) -> TypeRef {
        let name = kind.scalar_name();
        if !BUILTIN_SCALARS.contains(&name) {
            self.types.entry(name.to_string()).or_insert_with(|| {
                TypeDef::Scalar(ScalarDef {
                    name: name.to_string(),
                    description: Some(
                        match name {
                            "ISO8601DateTime" => "An ISO 8601-encoded datetime",
                            "ISO8601Date" => "An ISO 8601-encoded date",
                            _ => "Arbitrary JSON value",
                        }
                        .to_string(),
                    ),
                })
            });
        }
        TypeRef::named(name)
    }

    /// A list field with `filter`, `sort` and `page` arguments.
    fn many_field(&mut self, name: &str, target: &ResourceType) -> FieldDef {
        let ty = TypeRef::non_null(TypeRef::list(TypeRef::non_null(TypeRef::named(
            &target.name,
        ))));
        let mut field = FieldDef::new(name, ty).with_description(target.description.clone());
        if let Some(filter) = self.filter_input(target) {
            field = field.with_argument(InputFieldDef::new("filter", TypeRef::named(filter)));
        }
        if let Some(sort) = self.sort_input(target) {
            field = field.with_argument(InputFieldDef::new(
                "sort",
                TypeRef::list(TypeRef::non_null(TypeRef::named(sort))),
            ));
        }
        self.page_input();
        field.with_argument(InputFieldDef::new("page", TypeRef::named(PAGE_INPUT)))
    }

    fn filter_input(&mut self, ty: &ResourceType) -> Option<String> {
        let name = filter_input_name(&ty.name);
        if self.types.contains_key(&name) {
            return Some(name);
        }

        let mut fields = IndexMap::new();
        for filter in ty.filters.values() {
            let Some(attr) = ty.attribute(&filter.attribute) else {
                continue;
            };
            if !filter.guard().is_exposed() || filter.operators.is_empty() {
                continue;
            }
            let scalar = self.scalar(&attr.kind);
            let value_ty = if filter.single {
                scalar
            } else {
                TypeRef::list(TypeRef::non_null(scalar))
            };
            let operators_name = filter_attribute_input_name(&ty.name, &attr.name);
            let operators = filter
                .operators
                .iter()
                .map(|op| {
                    (
                        op.as_str().to_string(),
                        InputFieldDef::new(op.as_str(), value_ty.clone()),
                    )
                })
                .collect();
            self.types.insert(
                operators_name.clone(),
                TypeDef::InputObject(InputObjectDef {
                    name: operators_name.clone(),
                    description: None,
                    fields: operators,
                }),
            );
            fields.insert(
                attr.name.clone(),
                InputFieldDef::new(&attr.name, TypeRef::named(operators_name)),
            );
        }

        if fields.is_empty() {
            return None;
        }
        self.types.insert(
            name.clone(),
            TypeDef::InputObject(InputObjectDef {
                name: name.clone(),
                description: None,
                fields,
            }),
        );
        Some(name)
    }

    fn sort_input(&mut self, ty: &ResourceType) -> Option<String> {
        let name = sort_input_name(&ty.name);
        if self.types.contains_key(&name) {
            return Some(name);
        }

        let values: Vec<String> = ty
            .sorts
            .values()
            .filter(|sort| sort.guard().is_exposed() && ty.attribute(&sort.attribute).is_some())
            .map(|sort| sort.attribute.clone())
            .collect();
        if values.is_empty() {
            return None;
        }

        let attributes = sort_attribute_enum_name(&ty.name);
        self.types.insert(
            attributes.clone(),
            TypeDef::Enum(EnumDef {
                name: attributes.clone(),
                description: None,
                values,
            }),
        );
        self.types
            .entry(SORT_DIRECTION_ENUM.to_string())
            .or_insert_with(|| {
                TypeDef::Enum(EnumDef {
                    name: SORT_DIRECTION_ENUM.to_string(),
                    description: None,
                    values: vec!["asc".to_string(), "desc".to_string()],
                })
            });

        let mut fields = IndexMap::new();
        fields.insert(
            "att".to_string(),
            InputFieldDef::new("att", TypeRef::non_null(TypeRef::named(attributes))),
        );
        fields.insert(
            "dir".to_string(),
            InputFieldDef::new("dir", TypeRef::non_null(TypeRef::named(SORT_DIRECTION_ENUM))),
        );
        self.types.insert(
            name.clone(),
            TypeDef::InputObject(InputObjectDef {
                name: name.clone(),
                description: None,
                fields,
            }),
        );
        Some(name)
    }

    fn page_input(&mut self) {
        self.types.entry(PAGE_INPUT.to_string()).or_insert_with(|| {
            let mut fields = IndexMap::new();
            fields.insert(
                "size".to_string(),
                InputFieldDef::new("size", TypeRef::named("Int")),
            );
            fields.insert(
                "number".to_string(),
                InputFieldDef::new("number", TypeRef::named("Int")),
            );
            TypeDef::InputObject(InputObjectDef {
                name: PAGE_INPUT.to_string(),
                description: None,
                fields,
            })
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names() {
        assert_eq!(filter_input_name("Employee"), "EmployeeFilter");
        assert_eq!(
            filter_attribute_input_name("Employee", "firstName"),
            "EmployeeFilterFirstName"
        );
        assert_eq!(
            filter_attribute_input_name("Employee", "first_name"),
            "EmployeeFilterFirstName"
        );
        assert_eq!(sort_attribute_enum_name("Employee"), "EmployeeSortAtt");
    }
}
