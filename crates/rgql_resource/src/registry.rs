//! The capability registry.

use crate::filter::FilterSpec;
use crate::resource::{Entrypoint, ResourceType};
use crate::sort::SortSpec;
use indexmap::IndexMap;
use thiserror::Error;

/// Errors raised while building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("resource `{0}` is registered more than once")]
    DuplicateResource(String),

    #[error("resource `{resource}` extends unknown resource `{parent}`")]
    UnknownParent { resource: String, parent: String },

    #[error("resource `{resource}` extends `{parent}`, which is itself a variant")]
    NestedInheritance { resource: String, parent: String },

    #[error("discriminant `{discriminant}` is used by more than one variant of `{parent}`")]
    DuplicateDiscriminant {
        parent: String,
        discriminant: String,
    },

    #[error("relationship `{resource}.{relationship}` targets unknown resource `{target}`")]
    UnknownTarget {
        resource: String,
        relationship: String,
        target: String,
    },

    #[error("relationship `{resource}.{relationship}` has unknown candidate `{candidate}`")]
    UnknownCandidate {
        resource: String,
        relationship: String,
        candidate: String,
    },

    #[error("polymorphic relationship `{resource}.{relationship}` declares no candidates")]
    NoCandidates {
        resource: String,
        relationship: String,
    },
}

/// Immutable set of resource types.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    types: IndexMap<String, ResourceType>,
}

impl Registry {
    /// Creates a new registry builder.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&ResourceType> {
        self.types.get(name)
    }

    /// Iterates over types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &ResourceType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over the types that declare an entrypoint.
    pub fn entrypoints(&self) -> impl Iterator<Item = (&Entrypoint, &ResourceType)> {
        self.types
            .values()
            .filter_map(|ty| ty.entrypoint.as_ref().map(|ep| (ep, ty)))
    }

    /// Iterates over the variants of a polymorphic type with their discriminants.
    pub fn variants<'a>(
        &'a self,
        ty: &'a ResourceType,
    ) -> impl Iterator<Item = (&'a str, &'a ResourceType)> + 'a {
        ty.variants
            .iter()
            .filter_map(|(disc, name)| self.get(name).map(|variant| (disc.as_str(), variant)))
    }

    /// Finds the variant of `ty` whose type name is `name`.
    pub fn variant_named<'a>(
        &'a self,
        ty: &'a ResourceType,
        name: &str,
    ) -> Option<(&'a str, &'a ResourceType)> {
        self.variants(ty).find(|(_, variant)| variant.name == name)
    }
}

/// Collects resource declarations and validates them into a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    declared: Vec<ResourceType>,
}

impl RegistryBuilder {
    /// Creates a new, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource type.
    #[must_use]
    pub fn register(mut self, ty: ResourceType) -> Self {
        self.declared.push(ty);
        self
    }

    /// Validates the declarations and produces the registry.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut types: IndexMap<String, ResourceType> = IndexMap::with_capacity(self.declared.len());
        for ty in self.declared {
            if types.contains_key(&ty.name) {
                return Err(RegistryError::DuplicateResource(ty.name));
            }
            types.insert(ty.name.clone(), ty);
        }

        let synthesized = synthesize_polymorphic_targets(&mut types)?;
        resolve_inheritance(&mut types)?;
        resolve_common_attributes(&mut types, &synthesized);
        check_targets(&types)?;

        for ty in types.values_mut().filter(|ty| !ty.is_abstract) {
            resolve_filters(ty);
            resolve_sorts(ty);
        }

        tracing::debug!(resources = types.len(), "capability registry built");
        Ok(Registry { types })
    }
}

fn pascal_case(name: &str) -> String {
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

/// Creates an abstract `<Owner><Relationship>` type for each polymorphic
/// belongs-to relationship and points the relationship at it. Returns the
/// names of the synthesized types.
fn synthesize_polymorphic_targets(
    types: &mut IndexMap<String, ResourceType>,
) -> Result<Vec<String>, RegistryError> {
    let mut pending = Vec::new();
    for ty in types.values() {
        for rel in ty.relationships.values().filter(|rel| rel.is_polymorphic()) {
            pending.push((ty.name.clone(), rel.name.clone()));
        }
    }

    let mut synthesized = Vec::with_capacity(pending.len());
    for (owner, rel_name) in pending {
        let candidates = types[&owner].relationships[&rel_name].candidates.clone();
        if candidates.is_empty() {
            return Err(RegistryError::NoCandidates {
                resource: owner,
                relationship: rel_name,
            });
        }
        if let Some(candidate) = candidates.values().find(|c| !types.contains_key(*c)) {
            return Err(RegistryError::UnknownCandidate {
                resource: owner,
                relationship: rel_name,
                candidate: candidate.clone(),
            });
        }

        let abstract_name = format!("{owner}{}", pascal_case(&rel_name));
        if types.contains_key(&abstract_name) {
            return Err(RegistryError::DuplicateResource(abstract_name));
        }

        let mut abstract_ty = ResourceType::new(abstract_name.clone());
        abstract_ty.is_abstract = true;
        abstract_ty.variants = candidates;

        if let Some(rel) = types
            .get_mut(&owner)
            .and_then(|ty| ty.relationships.get_mut(&rel_name))
        {
            rel.target.clone_from(&abstract_name);
        }
        types.insert(abstract_name.clone(), abstract_ty);
        synthesized.push(abstract_name);
    }
    Ok(synthesized)
}

/// Gives each synthesized type the attributes its candidates share, by name
/// and canonical kind. Runs after inheritance so inherited attributes count.
fn resolve_common_attributes(types: &mut IndexMap<String, ResourceType>, synthesized: &[String]) {
    for name in synthesized {
        let Some(abstract_ty) = types.get(name) else {
            continue;
        };
        let members: Vec<&ResourceType> = abstract_ty
            .variants
            .values()
            .filter_map(|candidate| types.get(candidate))
            .collect();
        let Some((first, rest)) = members.split_first() else {
            continue;
        };
        let common: IndexMap<String, _> = first
            .attributes
            .values()
            .filter(|attr| {
                rest.iter().all(|other| {
                    other
                        .attribute(&attr.name)
                        .is_some_and(|o| o.kind.canonical() == attr.kind.canonical())
                })
            })
            .map(|attr| (attr.name.clone(), attr.clone()))
            .collect();

        if let Some(abstract_ty) = types.get_mut(name) {
            abstract_ty.attributes = common;
        }
    }
}

/// Copies parent capabilities into each variant and records the variant on
/// its parent.
fn resolve_inheritance(types: &mut IndexMap<String, ResourceType>) -> Result<(), RegistryError> {
    let children: Vec<(String, String, String)> = types
        .values()
        .filter_map(|ty| {
            let parent = ty.parent.clone()?;
            let disc = ty.discriminant.clone().unwrap_or_else(|| ty.name.clone());
            Some((ty.name.clone(), parent, disc))
        })
        .collect();

    for (child, parent, discriminant) in children {
        let Some(parent_ty) = types.get_mut(&parent) else {
            return Err(RegistryError::UnknownParent {
                resource: child,
                parent,
            });
        };
        if parent_ty.parent.is_some() {
            return Err(RegistryError::NestedInheritance {
                resource: child,
                parent,
            });
        }
        if parent_ty.variants.contains_key(&discriminant) {
            return Err(RegistryError::DuplicateDiscriminant {
                parent,
                discriminant,
            });
        }
        parent_ty
            .variants
            .insert(discriminant.clone(), child.clone());
        let inherited = parent_ty.clone();

        if let Some(child_ty) = types.get_mut(&child) {
            child_ty.discriminant = Some(discriminant);
            child_ty.attributes = merged(&inherited.attributes, &child_ty.attributes);
            child_ty.relationships = merged(&inherited.relationships, &child_ty.relationships);
            child_ty.filters = merged(&inherited.filters, &child_ty.filters);
            child_ty.sorts = merged(&inherited.sorts, &child_ty.sorts);
        }
    }
    Ok(())
}

/// Parent entries first, in parent order; the child's own entries override.
fn merged<V: Clone>(parent: &IndexMap<String, V>, child: &IndexMap<String, V>) -> IndexMap<String, V> {
    let mut out = parent.clone();
    for (name, value) in child {
        out.insert(name.clone(), value.clone());
    }
    out
}

fn check_targets(types: &IndexMap<String, ResourceType>) -> Result<(), RegistryError> {
    for ty in types.values() {
        for rel in ty.relationships.values() {
            if !types.contains_key(&rel.target) {
                return Err(RegistryError::UnknownTarget {
                    resource: ty.name.clone(),
                    relationship: rel.name.clone(),
                    target: rel.target.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Derives a filter per filterable attribute and fills in operator sets and
/// guards of declared filters. Filters on unknown attributes are kept as
/// declared so the schema builder can report them.
fn resolve_filters(ty: &mut ResourceType) {
    let declared = std::mem::take(&mut ty.filters);
    let mut resolved = IndexMap::with_capacity(declared.len());

    for attr in ty.attributes.values() {
        let defaults = attr.kind.default_operators();
        let spec = match declared.get(&attr.name) {
            Some(spec) => {
                let mut spec = spec.clone();
                if spec.operators.is_empty() {
                    spec.operators = defaults.to_vec();
                }
                let except = std::mem::take(&mut spec.except);
                spec.operators.retain(|op| !except.contains(op));
                if spec.guard.is_none() {
                    spec.guard = Some(attr.filterable.clone());
                }
                spec
            }
            None if attr.filterable.is_exposed() && !defaults.is_empty() => {
                FilterSpec::new(attr.name.clone())
                    .only(defaults.iter().copied())
                    .with_guard(attr.filterable.clone())
            }
            None => continue,
        };
        resolved.insert(attr.name.clone(), spec);
    }

    for (name, spec) in declared {
        resolved.entry(name).or_insert(spec);
    }
    ty.filters = resolved;
}

fn resolve_sorts(ty: &mut ResourceType) {
    let declared = std::mem::take(&mut ty.sorts);
    let mut resolved = IndexMap::with_capacity(declared.len());

    for attr in ty.attributes.values() {
        let spec = match declared.get(&attr.name) {
            Some(spec) => {
                let mut spec = spec.clone();
                if spec.guard.is_none() {
                    spec.guard = Some(attr.sortable.clone());
                }
                spec
            }
            None if attr.sortable.is_exposed() && !attr.kind.is_structured() => {
                SortSpec::new(attr.name.clone()).with_guard(attr.sortable.clone())
            }
            None => continue,
        };
        resolved.insert(attr.name.clone(), spec);
    }

    for (name, spec) in declared {
        resolved.entry(name).or_insert(spec);
    }
    ty.sorts = resolved;
}
