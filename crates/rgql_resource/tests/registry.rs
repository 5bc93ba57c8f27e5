use rgql_resource::*;

fn credit_cards() -> RegistryBuilder {
    Registry::builder()
        .register(
            ResourceType::new("CreditCard")
                .with_entrypoint("creditCards", "creditCard")
                .with_attribute(AttributeSpec::string("number"))
                .with_attribute(AttributeSpec::new("expiresOn", AttributeKind::Date)),
        )
        .register(
            ResourceType::new("Visa")
                .extends("CreditCard", "Visa")
                .with_attribute(AttributeSpec::integer("visaPoints"))
                .with_relationship(RelationshipSpec::has_many("transactions", "Transaction")),
        )
        .register(ResourceType::new("Mastercard").extends("CreditCard", "Mastercard"))
        .register(
            ResourceType::new("Transaction").with_attribute(AttributeSpec::new(
                "amount",
                AttributeKind::custom("money", AttributeKind::Float),
            )),
        )
}

#[test]
fn test_variants_inherit_parent_capabilities() {
    let registry = credit_cards().build().unwrap();

    let card = registry.get("CreditCard").unwrap();
    assert!(card.is_polymorphic());
    assert_eq!(card.variant("Visa"), Some("Visa"));

    let visa = registry.get("Visa").unwrap();
    let names: Vec<_> = visa.attributes.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["id", "number", "expiresOn", "visaPoints"]);
    assert!(visa.relationship("transactions").is_some());
    assert!(visa.filter("number").is_some());

    let mastercard = registry.get("Mastercard").unwrap();
    assert!(mastercard.relationship("transactions").is_none());
    assert_eq!(mastercard.discriminant.as_deref(), Some("Mastercard"));

    let variants: Vec<_> = registry.variants(card).map(|(d, _)| d).collect();
    assert_eq!(variants, vec!["Visa", "Mastercard"]);
}

#[test]
fn test_filters_and_sorts_are_derived() {
    let registry = Registry::builder()
        .register(
            ResourceType::new("Employee")
                .with_attribute(AttributeSpec::string("firstName"))
                .with_attribute(AttributeSpec::new("tags", AttributeKind::Object))
                .with_attribute(
                    AttributeSpec::integer("salary").with_sortable(Guard::Deny),
                )
                .with_filter(
                    FilterSpec::new("firstName")
                        .only([FilterOperator::Eq, FilterOperator::Prefix])
                        .except([FilterOperator::Prefix]),
                ),
        )
        .build()
        .unwrap();

    let employee = registry.get("Employee").unwrap();
    assert_eq!(
        employee.filter("firstName").unwrap().operators,
        vec![FilterOperator::Eq]
    );
    assert_eq!(employee.filter("id").unwrap().operators.len(), 2);
    assert!(employee.filter("tags").is_none());
    assert!(employee.sort("tags").is_none());
    assert!(employee.sort("salary").is_none());
    assert!(employee.filter("salary").is_some());

    let keys: Vec<_> = employee.filters.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["id", "firstName", "salary"]);
}

#[test]
fn test_polymorphic_belongs_to_synthesizes_abstract_type() {
    let registry = Registry::builder()
        .register(
            ResourceType::new("Employee")
                .with_attribute(AttributeSpec::string("name"))
                .with_attribute(AttributeSpec::integer("age")),
        )
        .register(
            ResourceType::new("Team")
                .with_attribute(AttributeSpec::string("name"))
                .with_attribute(AttributeSpec::string("age")),
        )
        .register(
            ResourceType::new("Note")
                .with_entrypoint("notes", "note")
                .with_relationship(RelationshipSpec::polymorphic_belongs_to(
                    "notable",
                    [("Employee", "Employee"), ("Team", "Team")],
                )),
        )
        .build()
        .unwrap();

    let notable = registry.get("NoteNotable").unwrap();
    assert!(notable.is_abstract);
    let common: Vec<_> = notable.attributes.keys().map(String::as_str).collect();
    assert_eq!(common, vec!["id", "name"]);
    assert_eq!(notable.variant("Team"), Some("Team"));

    let rel = registry.get("Note").unwrap().relationship("notable").unwrap();
    assert_eq!(rel.target, "NoteNotable");
    assert_eq!(rel.cardinality(), Cardinality::One);
    assert!(!rel.accepts_arguments());
}

#[test]
fn test_polymorphic_candidates_share_inherited_attributes() {
    let registry = credit_cards()
        .register(
            ResourceType::new("Note")
                .with_entrypoint("notes", "note")
                .with_relationship(RelationshipSpec::polymorphic_belongs_to(
                    "card",
                    [("Visa", "Visa"), ("Mastercard", "Mastercard")],
                )),
        )
        .build()
        .unwrap();

    let card = registry.get("NoteCard").unwrap();
    let common: Vec<_> = card.attributes.keys().map(String::as_str).collect();
    assert_eq!(common, vec!["id", "number", "expiresOn"]);
    assert_eq!(
        card.attribute("expiresOn").map(|attr| &attr.kind),
        Some(&AttributeKind::Date)
    );
}

#[test]
fn test_build_errors() {
    let err = Registry::builder()
        .register(ResourceType::new("A"))
        .register(ResourceType::new("A"))
        .build()
        .unwrap_err();
    assert_eq!(err, RegistryError::DuplicateResource("A".into()));

    let err = Registry::builder()
        .register(ResourceType::new("Visa").extends("CreditCard", "Visa"))
        .build()
        .unwrap_err();
    assert!(matches!(err, RegistryError::UnknownParent { .. }));

    let err = credit_cards()
        .register(ResourceType::new("Gold").extends("Visa", "Gold"))
        .build()
        .unwrap_err();
    assert!(matches!(err, RegistryError::NestedInheritance { .. }));

    let err = credit_cards()
        .register(ResourceType::new("Other").extends("CreditCard", "Visa"))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateDiscriminant {
            parent: "CreditCard".into(),
            discriminant: "Visa".into(),
        }
    );

    let err = Registry::builder()
        .register(
            ResourceType::new("Employee")
                .with_relationship(RelationshipSpec::has_many("positions", "Position")),
        )
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "relationship `Employee.positions` targets unknown resource `Position`");

    let err = Registry::builder()
        .register(ResourceType::new("Note").with_relationship(
            RelationshipSpec::polymorphic_belongs_to("notable", [("Ghost", "Ghost")]),
        ))
        .build()
        .unwrap_err();
    assert!(matches!(err, RegistryError::UnknownCandidate { .. }));
}
