//! The demo resource set served by the CLI.
//!
//! Staff records with a guarded salary, credit cards split into Visa and
//! Mastercard variants, and notes that point at either a Visa card or a
//! department.

use rgql_resource::{
    AttributeKind, AttributeSpec, Entity, FilterOperator, FilterSpec, Guard, MemoryLayer,
    Registry, RegistryError, RelationshipSpec, ResourceType,
};

/// Header carrying the caller's role.
pub const ROLE_HEADER: &str = "x-role";

/// Builds the demo registry.
pub fn registry() -> Result<Registry, RegistryError> {
    let hr_only = || Guard::when(|ctx| ctx.header(ROLE_HEADER) == Some("hr"));

    Registry::builder()
        .register(
            ResourceType::new("Employee")
                .with_description("A person on payroll")
                .with_entrypoint("employees", "employee")
                .with_attribute(AttributeSpec::string("firstName"))
                .with_attribute(AttributeSpec::string("lastName"))
                .with_attribute(AttributeSpec::new("hiredOn", AttributeKind::Date))
                .with_attribute(
                    AttributeSpec::integer("salary")
                        .with_readable(hr_only())
                        .with_filterable(hr_only())
                        .with_sortable(hr_only()),
                )
                .with_filter(
                    FilterSpec::new("firstName")
                        .except([FilterOperator::Match, FilterOperator::NotMatch]),
                )
                .with_relationship(RelationshipSpec::has_many("positions", "Position")),
        )
        .register(
            ResourceType::new("Position")
                .with_attribute(AttributeSpec::string("title"))
                .with_relationship(RelationshipSpec::belongs_to("department", "Department")),
        )
        .register(
            ResourceType::new("Department")
                .with_attribute(AttributeSpec::string("name"))
                .with_relationship(RelationshipSpec::has_many("positions", "Position")),
        )
        .register(
            ResourceType::new("CreditCard")
                .with_entrypoint("creditCards", "creditCard")
                .with_attribute(AttributeSpec::string("number")),
        )
        .register(
            ResourceType::new("Visa")
                .extends("CreditCard", "Visa")
                .with_attribute(AttributeSpec::integer("visaPoints"))
                .with_relationship(RelationshipSpec::has_many("transactions", "Transaction")),
        )
        .register(
            ResourceType::new("Mastercard")
                .extends("CreditCard", "Mastercard")
                .with_attribute(AttributeSpec::new(
                    "cashback",
                    AttributeKind::custom("Percent", AttributeKind::Float),
                )),
        )
        .register(
            ResourceType::new("Transaction")
                .with_attribute(AttributeSpec::integer("amount"))
                .with_attribute(AttributeSpec::new("bookedAt", AttributeKind::Datetime)),
        )
        .register(
            ResourceType::new("Note")
                .with_entrypoint("notes", "note")
                .with_attribute(AttributeSpec::string("body"))
                .with_relationship(RelationshipSpec::polymorphic_belongs_to(
                    "notable",
                    [("Visa", "Visa"), ("Department", "Department")],
                )),
        )
        .build()
}

/// Builds the demo data set.
pub fn layer() -> MemoryLayer {
    let employees = [
        ("e1", "Stephen", "King", "2019-04-01", 5200),
        ("e2", "Agatha", "Christie", "2016-09-15", 6100),
        ("e3", "Grace", "Hopper", "2021-01-11", 7300),
    ];
    let positions = [
        ("p1", "Engineer", "d1"),
        ("p2", "Manager", "d2"),
        ("p3", "Architect", "d1"),
    ];

    let mut layer = MemoryLayer::new();
    for (id, first, last, hired, salary) in employees {
        layer.insert(
            "Employee",
            Entity::new(id)
                .with("firstName", first)
                .with("lastName", last)
                .with("hiredOn", hired)
                .with("salary", salary),
        );
    }
    for (id, title, department) in positions {
        layer.insert("Position", Entity::new(id).with("title", title));
        layer.link("Position", id, "department", "Department", department);
        layer.link("Department", department, "positions", "Position", id);
    }
    layer.insert("Department", Entity::new("d1").with("name", "Research"));
    layer.insert("Department", Entity::new("d2").with("name", "Sales"));
    layer.link("Employee", "e1", "positions", "Position", "p1");
    layer.link("Employee", "e2", "positions", "Position", "p2");
    layer.link("Employee", "e2", "positions", "Position", "p3");

    layer.insert(
        "CreditCard",
        Entity::new("c1")
            .with_discriminant("Visa")
            .with("number", "4111 1111 1111 1111")
            .with("visaPoints", 120),
    );
    layer.insert(
        "CreditCard",
        Entity::new("c2")
            .with_discriminant("Mastercard")
            .with("number", "5500 0000 0000 0004")
            .with("cashback", 1.5),
    );
    for (id, amount, booked_at) in [
        ("t1", 25, "2024-03-01T09:30:00Z"),
        ("t2", 140, "2024-03-04T17:05:00Z"),
    ] {
        layer.insert(
            "Transaction",
            Entity::new(id).with("amount", amount).with("bookedAt", booked_at),
        );
        layer.link("CreditCard", "c1", "transactions", "Transaction", id);
    }

    layer.insert("Note", Entity::new("n1").with("body", "Card renewed"));
    layer.insert("Note", Entity::new("n2").with("body", "Quarterly plan"));
    layer.link_polymorphic("Note", "n1", "notable", "Visa", "CreditCard", "c1");
    layer.link_polymorphic("Note", "n2", "notable", "Department", "Department", "d1");
    layer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builds() {
        let registry = registry().unwrap();
        assert_eq!(registry.entrypoints().count(), 3);
        assert!(registry.get("NoteNotable").is_some_and(|ty| ty.is_polymorphic()));
        assert_eq!(
            registry.get("Visa").and_then(|ty| ty.attribute("number")).map(|a| &a.kind),
            Some(&AttributeKind::String)
        );
    }
}
