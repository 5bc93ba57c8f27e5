//! Result assembly.
//!
//! Folds the entities returned by the resource layer back into the shape of
//! the original selection. The assembler never re-sorts or re-filters; list
//! order is the order the resource layer returned.

use crate::error::BridgeError;
use rgql_resource::{Cardinality, Entity, OutputField, PlanNode, Registry, Related};
use serde_json::{Map, Value};

/// Builds response values from plans and loaded entities.
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'a> {
    registry: &'a Registry,
}

impl<'a> Assembler<'a> {
    /// Creates a new assembler.
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Assembles a root field: a list for `many`, an object or `null` for `one`.
    pub fn assemble(&self, plan: &PlanNode, entities: &[Entity]) -> Result<Value, BridgeError> {
        match plan.cardinality {
            Cardinality::Many => entities
                .iter()
                .map(|entity| self.entity(plan, entity))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Cardinality::One => match entities.first() {
                Some(entity) => self.entity(plan, entity),
                None => Ok(Value::Null),
            },
        }
    }

    /// Projects one entity onto the output of its plan.
    pub fn entity(&self, plan: &PlanNode, entity: &Entity) -> Result<Value, BridgeError> {
        let (discriminant, typename) = self.resolve_type(plan, entity)?;

        let mut object = Map::new();
        for field in plan.output_for(discriminant) {
            let value = match field {
                OutputField::Attribute { attribute, .. } => {
                    entity.attribute(attribute).unwrap_or(Value::Null)
                }
                OutputField::Typename { .. } => Value::String(typename.to_string()),
                OutputField::Relationship { key } => {
                    let Some(child) = child_plan(plan, discriminant, key) else {
                        continue;
                    };
                    self.related(child, entity.relationships.get(key))?
                }
            };
            object.insert(field.key().to_string(), value);
        }
        Ok(Value::Object(object))
    }

    fn related(&self, plan: &PlanNode, related: Option<&Related>) -> Result<Value, BridgeError> {
        match (plan.cardinality, related) {
            (Cardinality::Many, Some(Related::Many(entities))) => entities
                .iter()
                .map(|entity| self.entity(plan, entity))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            (Cardinality::Many, None) => Ok(Value::Array(Vec::new())),
            (Cardinality::One, Some(Related::One(Some(entity)))) => self.entity(plan, entity),
            (Cardinality::One, Some(Related::One(None)) | None) => Ok(Value::Null),
            (Cardinality::Many, Some(Related::One(_))) => Err(BridgeError::ResultShape {
                expected: "a list",
                found: "a single entity",
                path: plan.path.clone(),
            }),
            (Cardinality::One, Some(Related::Many(_))) => Err(BridgeError::ResultShape {
                expected: "a single entity",
                found: "a list",
                path: plan.path.clone(),
            }),
        }
    }

    /// Resolves the discriminant and `__typename` of an entity.
    fn resolve_type<'e>(
        &self,
        plan: &PlanNode,
        entity: &'e Entity,
    ) -> Result<(Option<&'e str>, &'a str), BridgeError> {
        let resource = self
            .registry
            .get(&plan.resource)
            .ok_or_else(|| BridgeError::UnknownResource(plan.resource.clone()))?;
        if !resource.is_polymorphic() {
            return Ok((entity.discriminant.as_deref(), &resource.name));
        }

        let discriminant = entity.discriminant.as_deref();
        match discriminant.and_then(|d| resource.variant(d)) {
            Some(variant) => Ok((discriminant, variant)),
            None => Err(BridgeError::UnknownDiscriminant {
                resource: resource.name.clone(),
                id: entity.id.clone(),
                discriminant: entity.discriminant.clone(),
                path: plan.path.clone(),
            }),
        }
    }
}

/// The child plan that produced `key` for an entity with `discriminant`.
fn child_plan<'p>(plan: &'p PlanNode, discriminant: Option<&str>, key: &str) -> Option<&'p PlanNode> {
    discriminant
        .and_then(|d| plan.variants.get(d))
        .and_then(|variant| variant.children.get(key))
        .or_else(|| plan.children.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgql_resource::{AttributeSpec, RelationshipSpec, ResourceType, VariantPlan};
    use serde_json::json;

    fn registry() -> Registry {
        Registry::builder()
            .register(
                ResourceType::new("CreditCard")
                    .with_entrypoint("creditCards", "creditCard")
                    .with_attribute(AttributeSpec::string("number")),
            )
            .register(
                ResourceType::new("Visa")
                    .extends("CreditCard", "visa")
                    .with_relationship(RelationshipSpec::has_many("transactions", "Transaction")),
            )
            .register(ResourceType::new("Mastercard").extends("CreditCard", "mastercard"))
            .register(ResourceType::new("Transaction").with_attribute(AttributeSpec::integer("amount")))
            .build()
            .unwrap()
    }

    fn attribute(name: &str) -> OutputField {
        OutputField::Attribute {
            key: name.to_string(),
            attribute: name.to_string(),
        }
    }

    fn card_plan() -> PlanNode {
        let mut transactions = PlanNode::new("Transaction", Cardinality::Many);
        transactions.relationship = Some("transactions".into());
        transactions.path = vec!["creditCards".into(), "transactions".into()];
        transactions.fields = vec!["amount".into()];
        transactions.output = vec![attribute("amount")];

        let mut plan = PlanNode::new("CreditCard", Cardinality::Many);
        plan.path = vec!["creditCards".into()];
        plan.fields = vec!["number".into()];
        plan.output = vec![
            attribute("number"),
            OutputField::Typename {
                key: "__typename".into(),
            },
        ];
        plan.variants.insert(
            "visa".into(),
            VariantPlan {
                resource: "Visa".into(),
                fields: Vec::new(),
                output: vec![OutputField::Relationship {
                    key: "transactions".into(),
                }],
                children: [("transactions".to_string(), transactions)]
                    .into_iter()
                    .collect(),
            },
        );
        plan
    }

    #[test]
    fn test_variant_fields_only_appear_for_their_discriminant() {
        let registry = registry();
        let mut visa = Entity::new("1")
            .with_discriminant("visa")
            .with("number", "4111");
        visa.relationships.insert(
            "transactions".into(),
            Related::Many(vec![Entity::new("t1").with("amount", 25)]),
        );
        let mastercard = Entity::new("2")
            .with_discriminant("mastercard")
            .with("number", "5500");

        let value = Assembler::new(&registry)
            .assemble(&card_plan(), &[visa, mastercard])
            .unwrap();
        assert_eq!(
            value,
            json!([
                {
                    "number": "4111",
                    "__typename": "Visa",
                    "transactions": [{ "amount": 25 }]
                },
                { "number": "5500", "__typename": "Mastercard" }
            ])
        );
    }

    #[test]
    fn test_missing_many_is_an_empty_list() {
        let registry = registry();
        let visa = Entity::new("1").with_discriminant("visa").with("number", "4111");
        let value = Assembler::new(&registry)
            .assemble(&card_plan(), &[visa])
            .unwrap();
        assert_eq!(value[0]["transactions"], json!([]));
    }

    #[test]
    fn test_one_root_without_entity_is_null() {
        let registry = registry();
        let mut plan = card_plan();
        plan.cardinality = Cardinality::One;
        assert_eq!(
            Assembler::new(&registry).assemble(&plan, &[]).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_unknown_discriminant_is_an_error() {
        let registry = registry();
        let amex = Entity::new("3").with_discriminant("amex");
        let err = Assembler::new(&registry)
            .assemble(&card_plan(), &[amex])
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::UnknownDiscriminant { discriminant: Some(ref d), .. } if d == "amex"
        ));
    }

    #[test]
    fn test_cardinality_mismatch_is_an_error() {
        let registry = registry();
        let mut visa = Entity::new("1").with_discriminant("visa");
        visa.relationships
            .insert("transactions".into(), Related::One(None));
        let err = Assembler::new(&registry)
            .assemble(&card_plan(), &[visa])
            .unwrap_err();
        assert!(matches!(err, BridgeError::ResultShape { .. }));
    }
}
