//! Resource capabilities and the resource-layer contract for rgql.
//!
//! This crate provides:
//! - `registry`: The capability registry and its builder
//! - `resource`, `attribute`, `relationship`, `filter`, `sort`: Declarations
//! - `guard`, `context`: Access predicates and the request context they read
//! - `plan`: Resource query plans produced by the planner
//! - `layer`: The trait a data store implements to execute plans
//! - `memory`: An in-memory implementation of that trait

pub mod attribute;
pub mod context;
pub mod filter;
pub mod guard;
pub mod kind;
pub mod layer;
pub mod memory;
pub mod plan;
pub mod registry;
pub mod relationship;
pub mod resource;
pub mod sort;

pub use attribute::AttributeSpec;
pub use context::RequestContext;
pub use filter::{FilterOperator, FilterSpec};
pub use guard::{Guard, GuardError, RuntimeGuard};
pub use kind::AttributeKind;
pub use layer::{Entity, Related, ResourceError, ResourceErrorKind, ResourceLayer};
pub use memory::MemoryLayer;
pub use plan::{FilterParam, OutputField, PageParams, PlanNode, SortParam, VariantPlan};
pub use registry::{Registry, RegistryBuilder, RegistryError};
pub use relationship::{Cardinality, RelationshipKind, RelationshipSpec};
pub use resource::{Entrypoint, ResourceType};
pub use sort::{SortDirection, SortSpec};
