//! An in-memory resource layer.
//!
//! Records live in named tables; relationships are explicit edges from a
//! parent record to target records. Used by the CLI demo and tests.

use crate::context::RequestContext;
use crate::filter::FilterOperator;
use crate::layer::{Entity, Related, ResourceError, ResourceLayer};
use crate::plan::{FilterParam, PlanNode, SortParam};
use crate::relationship::Cardinality;
use crate::sort::SortDirection;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

#[derive(Debug, Clone)]
struct EdgeTarget {
    table: String,
    id: String,
    discriminant: Option<String>,
}

/// A row together with the table it was loaded from.
type Row = (String, Entity);

/// Tables of entities plus relationship edges.
#[derive(Debug, Default)]
pub struct MemoryLayer {
    tables: FxHashMap<String, Vec<Entity>>,
    /// (table, relationship) -> parent id -> targets
    edges: FxHashMap<(String, String), FxHashMap<String, Vec<EdgeTarget>>>,
    fetches: AtomicUsize,
}

impl MemoryLayer {
    /// Creates a new, empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity to a table. Relationships on `entity` are ignored.
    pub fn insert(&mut self, table: impl Into<String>, entity: Entity) {
        self.tables.entry(table.into()).or_default().push(entity);
    }

    #[must_use]
    pub fn with_entity(mut self, table: impl Into<String>, entity: Entity) -> Self {
        self.insert(table, entity);
        self
    }

    /// Links a parent record to a target record through `relationship`.
    pub fn link(
        &mut self,
        table: impl Into<String>,
        parent_id: impl Into<String>,
        relationship: impl Into<String>,
        target_table: impl Into<String>,
        target_id: impl Into<String>,
    ) {
        self.push_edge(
            table.into(),
            parent_id.into(),
            relationship.into(),
            EdgeTarget {
                table: target_table.into(),
                id: target_id.into(),
                discriminant: None,
            },
        );
    }

    /// Links through a polymorphic relationship; the target is reported with
    /// `discriminant`.
    pub fn link_polymorphic(
        &mut self,
        table: impl Into<String>,
        parent_id: impl Into<String>,
        relationship: impl Into<String>,
        discriminant: impl Into<String>,
        target_table: impl Into<String>,
        target_id: impl Into<String>,
    ) {
        self.push_edge(
            table.into(),
            parent_id.into(),
            relationship.into(),
            EdgeTarget {
                table: target_table.into(),
                id: target_id.into(),
                discriminant: Some(discriminant.into()),
            },
        );
    }

    fn push_edge(&mut self, table: String, parent_id: String, relationship: String, target: EdgeTarget) {
        self.edges
            .entry((table, relationship))
            .or_default()
            .entry(parent_id)
            .or_default()
            .push(target);
    }

    /// Number of `fetch` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(AtomicOrdering::Relaxed)
    }

    fn find(&self, target: &EdgeTarget) -> Option<Row> {
        let entity = self
            .tables
            .get(&target.table)?
            .iter()
            .find(|entity| entity.id == target.id)?;
        let mut entity = entity.clone();
        if target.discriminant.is_some() {
            entity.discriminant.clone_from(&target.discriminant);
        }
        Some((target.table.clone(), entity))
    }

    fn related_rows(&self, table: &str, parent_id: &str, relationship: &str) -> Vec<Row> {
        self.edges
            .get(&(table.to_string(), relationship.to_string()))
            .and_then(|by_parent| by_parent.get(parent_id))
            .map(|targets| targets.iter().filter_map(|t| self.find(t)).collect())
            .unwrap_or_default()
    }

    /// Loads `rows` for `plan`, projecting fields and resolving children.
    fn load(&self, plan: &PlanNode, rows: Vec<Row>) -> Result<Vec<Entity>, ResourceError> {
        check_pagination(plan, &rows)?;

        let mut out = Vec::with_capacity(rows.len());
        for (table, record) in rows {
            let discriminant = record.discriminant.as_deref();
            let mut entity = Entity {
                id: record.id.clone(),
                discriminant: record.discriminant.clone(),
                ..Entity::default()
            };
            for field in plan.fields_for(discriminant) {
                if let Some(value) = record.attributes.get(field) {
                    entity.attributes.insert(field.to_string(), value.clone());
                }
            }

            for child in plan.children_for(discriminant) {
                let relationship = child.relationship.as_deref().unwrap_or_default();
                let candidates = self.related_rows(&table, &record.id, relationship);
                let selected = select(child, candidates);
                let loaded = self.load(child, selected)?;
                let related = match child.cardinality {
                    Cardinality::One => Related::One(loaded.into_iter().next().map(Box::new)),
                    Cardinality::Many => Related::Many(loaded),
                };
                entity
                    .relationships
                    .insert(child.response_key().to_string(), related);
            }
            out.push(entity);
        }
        Ok(out)
    }
}

#[async_trait]
impl ResourceLayer for MemoryLayer {
    async fn fetch(
        &self,
        plan: &PlanNode,
        _ctx: &RequestContext,
    ) -> Result<Vec<Entity>, ResourceError> {
        self.fetches.fetch_add(1, AtomicOrdering::Relaxed);

        let rows: Vec<Row> = self
            .tables
            .get(&plan.resource)
            .map(|entities| {
                entities
                    .iter()
                    .map(|e| (plan.resource.clone(), e.clone()))
                    .collect()
            })
            .unwrap_or_default();
        let total = rows.len();
        let selected = select(plan, rows);
        tracing::debug!(
            resource = %plan.resource,
            total,
            selected = selected.len(),
            "memory fetch"
        );
        self.load(plan, selected)
    }
}

/// Paging a child is only possible when a single parent asks for it.
fn check_pagination(plan: &PlanNode, rows: &[Row]) -> Result<(), ResourceError> {
    let mut requests: Vec<(&PlanNode, usize)> = Vec::new();
    for (_, record) in rows {
        for child in plan.children_for(record.discriminant.as_deref()) {
            match requests.iter_mut().find(|(c, _)| std::ptr::eq(*c, child)) {
                Some((_, count)) => *count += 1,
                None => requests.push((child, 1)),
            }
        }
    }

    for (child, parents) in requests {
        if child.page.is_some() && parents > 1 {
            return Err(ResourceError::unsupported_pagination(
                child,
                format!(
                    "relationship `{}` cannot be paginated independently across {parents} parents",
                    child.relationship.as_deref().unwrap_or_default()
                ),
            ));
        }
    }
    Ok(())
}

/// Applies filters, sorts and paging.
fn select(plan: &PlanNode, rows: Vec<Row>) -> Vec<Row> {
    let mut rows: Vec<Row> = rows
        .into_iter()
        .filter(|(_, entity)| plan.filters.iter().all(|f| filter_matches(entity, f)))
        .collect();

    if !plan.sorts.is_empty() {
        rows.sort_by(|(_, a), (_, b)| compare_by(&plan.sorts, a, b));
    }

    match plan.page {
        Some(page) => match page.size {
            Some(size) => {
                let size = usize::try_from(size).unwrap_or(usize::MAX);
                let number = usize::try_from(page.number.unwrap_or(1)).unwrap_or(usize::MAX);
                rows.into_iter()
                    .skip(number.saturating_sub(1).saturating_mul(size))
                    .take(size)
                    .collect()
            }
            None => rows,
        },
        None => rows,
    }
}

fn compare_by(sorts: &[SortParam], a: &Entity, b: &Entity) -> Ordering {
    for sort in sorts {
        let ordering = match (a.attribute(&sort.attribute), b.attribute(&sort.attribute)) {
            (Some(x), Some(y)) => ordering(&x, &y).unwrap_or(Ordering::Equal),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ordering = match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn filter_matches(entity: &Entity, filter: &FilterParam) -> bool {
    let actual = entity.attribute(&filter.attribute).filter(|v| !v.is_null());
    let (operator, negated) = filter.operator.positive();
    let hit = match &filter.value {
        Value::Array(expected) => expected.iter().any(|e| compare(actual.as_ref(), operator, e)),
        expected => compare(actual.as_ref(), operator, expected),
    };
    hit != negated
}

fn compare(actual: Option<&Value>, operator: FilterOperator, expected: &Value) -> bool {
    let Some(actual) = actual else {
        return expected.is_null() && matches!(operator, FilterOperator::Eq | FilterOperator::Eql);
    };
    match operator {
        FilterOperator::Eq => match (actual, expected) {
            (Value::String(a), Value::String(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => ordering(actual, expected) == Some(Ordering::Equal),
        },
        FilterOperator::Eql => ordering(actual, expected) == Some(Ordering::Equal),
        FilterOperator::Prefix => text_test(actual, expected, |a, b| a.starts_with(b)),
        FilterOperator::Suffix => text_test(actual, expected, |a, b| a.ends_with(b)),
        FilterOperator::Match => text_test(actual, expected, |a, b| a.contains(b)),
        FilterOperator::Gt => ordering(actual, expected) == Some(Ordering::Greater),
        FilterOperator::Gte => matches!(
            ordering(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOperator::Lt => ordering(actual, expected) == Some(Ordering::Less),
        FilterOperator::Lte => matches!(
            ordering(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        // Negated operators are folded into their positive form by the caller.
        FilterOperator::NotEq
        | FilterOperator::NotEql
        | FilterOperator::NotPrefix
        | FilterOperator::NotSuffix
        | FilterOperator::NotMatch => false,
    }
}

fn text_test(actual: &Value, expected: &Value, test: impl Fn(&str, &str) -> bool) -> bool {
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => test(&a.to_lowercase(), &b.to_lowercase()),
        _ => false,
    }
}

/// Orders two scalars. Ids stored as strings compare equal to numeric filter
/// values with the same text.
fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::Number(y)) => Some(x.as_str().cmp(y.to_string().as_str())),
        (Value::Number(x), Value::String(y)) => Some(x.to_string().as_str().cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PageParams;
    use serde_json::json;

    fn employees() -> MemoryLayer {
        MemoryLayer::new()
            .with_entity("Employee", Entity::new("1").with("firstName", "Stephen").with("age", 40))
            .with_entity("Employee", Entity::new("2").with("firstName", "Agatha").with("age", 31))
            .with_entity("Employee", Entity::new("3").with("firstName", "agnes").with("age", 55))
    }

    fn root(filters: Vec<FilterParam>) -> PlanNode {
        let mut plan = PlanNode::new("Employee", Cardinality::Many);
        plan.path = vec!["employees".into()];
        plan.fields = vec!["firstName".into()];
        plan.filters = filters;
        plan
    }

    fn filter(attribute: &str, operator: FilterOperator, value: Value) -> FilterParam {
        FilterParam {
            attribute: attribute.into(),
            operator,
            value,
        }
    }

    fn ids(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_string_operators() {
        let layer = employees();
        let ctx = RequestContext::new();

        let plan = root(vec![filter("firstName", FilterOperator::Eq, json!("AGATHA"))]);
        assert_eq!(ids(&layer.fetch(&plan, &ctx).await.unwrap()), vec!["2"]);

        let plan = root(vec![filter("firstName", FilterOperator::Eql, json!("AGATHA"))]);
        assert!(layer.fetch(&plan, &ctx).await.unwrap().is_empty());

        let plan = root(vec![filter("firstName", FilterOperator::Prefix, json!("ag"))]);
        assert_eq!(ids(&layer.fetch(&plan, &ctx).await.unwrap()), vec!["2", "3"]);

        let plan = root(vec![filter("firstName", FilterOperator::NotMatch, json!("ph"))]);
        assert_eq!(ids(&layer.fetch(&plan, &ctx).await.unwrap()), vec!["2", "3"]);

        let plan = root(vec![filter("id", FilterOperator::Eq, json!(["1", "3"]))]);
        assert_eq!(ids(&layer.fetch(&plan, &ctx).await.unwrap()), vec!["1", "3"]);
        assert_eq!(layer.fetch_count(), 5);
    }

    #[tokio::test]
    async fn test_sort_and_page() {
        let layer = employees();
        let mut plan = root(vec![filter("age", FilterOperator::Gte, json!(31))]);
        plan.sorts = vec![SortParam {
            attribute: "age".into(),
            direction: SortDirection::Desc,
        }];
        plan.page = Some(PageParams {
            size: Some(2),
            number: Some(2),
        });

        let found = layer.fetch(&plan, &RequestContext::new()).await.unwrap();
        assert_eq!(ids(&found), vec!["2"]);
        assert_eq!(found[0].attributes.get("firstName"), Some(&json!("Agatha")));
        assert!(found[0].attributes.get("age").is_none());
    }

    #[tokio::test]
    async fn test_nested_page_across_parents_is_rejected() {
        let mut layer = employees();
        layer.insert("Position", Entity::new("10").with("title", "Engineer"));
        layer.link("Employee", "1", "positions", "Position", "10");
        layer.link("Employee", "2", "positions", "Position", "10");

        let mut positions = PlanNode::new("Position", Cardinality::Many);
        positions.relationship = Some("positions".into());
        positions.path = vec!["employees".into(), "positions".into()];
        positions.page = Some(PageParams {
            size: Some(1),
            number: None,
        });
        let mut plan = root(Vec::new());
        plan.children.insert("positions".into(), positions);

        let err = layer.fetch(&plan, &RequestContext::new()).await.unwrap_err();
        assert_eq!(err.kind, crate::layer::ResourceErrorKind::UnsupportedPagination);
        assert_eq!(err.path, vec!["employees", "positions"]);

        plan.filters = vec![filter("id", FilterOperator::Eq, json!("1"))];
        let found = layer.fetch(&plan, &RequestContext::new()).await.unwrap();
        assert!(matches!(&found[0].relationships["positions"], Related::Many(p) if p.len() == 1));
    }
}
