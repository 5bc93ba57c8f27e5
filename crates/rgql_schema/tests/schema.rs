use rgql_resource::*;
use rgql_schema::{build, SchemaError, TypeDef};

fn hidden(name: &str, kind: AttributeKind) -> AttributeSpec {
    AttributeSpec::new(name, kind)
        .with_filterable(Guard::Deny)
        .with_sortable(Guard::Deny)
}

fn staff() -> Registry {
    Registry::builder()
        .register(
            ResourceType::new("Employee")
                .with_description("A person on payroll")
                .with_entrypoint("employees", "employee")
                .with_attribute(hidden("id", AttributeKind::Id))
                .with_attribute(AttributeSpec::string("firstName"))
                .with_attribute(hidden("hiredOn", AttributeKind::Date))
                .with_attribute(hidden("salary", AttributeKind::Integer).with_readable(Guard::Deny))
                .with_filter(FilterSpec::new("firstName").only([FilterOperator::Eq]))
                .with_relationship(RelationshipSpec::has_many("positions", "Position")),
        )
        .register(
            ResourceType::new("Position")
                .with_attribute(hidden("id", AttributeKind::Id))
                .with_attribute(AttributeSpec::string("title").with_filterable(Guard::Deny))
                .with_relationship(RelationshipSpec::belongs_to("department", "Department")),
        )
        .register(
            ResourceType::new("Department")
                .with_attribute(hidden("id", AttributeKind::Id))
                .with_attribute(hidden("name", AttributeKind::String)),
        )
        .build()
        .unwrap()
}

#[test]
fn test_sdl_mirrors_declared_capabilities() {
    let schema = build(&staff(), None).unwrap();
    insta::assert_snapshot!(schema.to_sdl(), @r###"
    input EmployeeFilterFirstName {
      eq: [String!]
    }

    input EmployeeFilter {
      firstName: EmployeeFilterFirstName
    }

    enum EmployeeSortAtt {
      firstName
    }

    enum SortDir {
      asc
      desc
    }

    input EmployeeSort {
      att: EmployeeSortAtt!
      dir: SortDir!
    }

    input Page {
      size: Int
      number: Int
    }

    "An ISO 8601-encoded date"
    scalar ISO8601Date

    enum PositionSortAtt {
      title
    }

    input PositionSort {
      att: PositionSortAtt!
      dir: SortDir!
    }

    "A person on payroll"
    type Employee {
      id: ID!
      firstName: String
      hiredOn: ISO8601Date
      positions(sort: [PositionSort!], page: Page): [Position!]!
    }

    type Position {
      id: ID!
      title: String
      department: Department
    }

    type Department {
      id: ID!
      name: String
    }

    type Query {
      "A person on payroll"
      employees(filter: EmployeeFilter, sort: [EmployeeSort!], page: Page): [Employee!]!
      "A person on payroll"
      employee(id: ID!): Employee
    }
    "###);
}

#[test]
fn test_polymorphic_types_become_interfaces() {
    let registry = Registry::builder()
        .register(
            ResourceType::new("CreditCard")
                .with_entrypoint("creditCards", "creditCard")
                .with_attribute(AttributeSpec::string("number")),
        )
        .register(
            ResourceType::new("Visa")
                .extends("CreditCard", "Visa")
                .with_relationship(RelationshipSpec::has_many("transactions", "Transaction")),
        )
        .register(ResourceType::new("Mastercard").extends("CreditCard", "Mastercard"))
        .register(ResourceType::new("Transaction").with_attribute(AttributeSpec::integer("amount")))
        .register(ResourceType::new("Team").with_attribute(AttributeSpec::string("name")))
        .register(
            ResourceType::new("Note")
                .with_entrypoint("notes", "note")
                .with_relationship(RelationshipSpec::polymorphic_belongs_to(
                    "notable",
                    [("Visa", "Visa"), ("Team", "Team")],
                )),
        )
        .build()
        .unwrap();

    let schema = build(&registry, None).unwrap();
    assert!(matches!(schema.get_type("CreditCard"), Some(TypeDef::Interface(_))));
    assert!(schema.field("CreditCard", "transactions").is_none());
    assert!(schema.field("Visa", "transactions").is_some());
    assert!(schema.field("Mastercard", "transactions").is_none());
    assert_eq!(schema.possible_types("CreditCard"), vec!["Visa", "Mastercard"]);

    let Some(TypeDef::Object(visa)) = schema.get_type("Visa") else {
        panic!("Visa should be an object type");
    };
    assert_eq!(visa.implements, vec!["CreditCard", "NoteNotable"]);

    assert!(matches!(schema.get_type("NoteNotable"), Some(TypeDef::Interface(_))));
    assert_eq!(schema.field("Note", "notable").unwrap().ty.to_string(), "NoteNotable");
    assert_eq!(
        schema.field("Query", "creditCards").unwrap().ty.to_string(),
        "[CreditCard!]!"
    );

    let notes_only = build(&registry, Some(&["notes"])).unwrap();
    assert!(notes_only.field("Query", "creditCards").is_none());
    assert!(notes_only.get_type("Team").is_some());
    assert!(notes_only.get_type("Mastercard").is_none());
}

#[test]
fn test_polymorphic_interface_keeps_inherited_fields() {
    let registry = Registry::builder()
        .register(
            ResourceType::new("CreditCard")
                .with_entrypoint("creditCards", "creditCard")
                .with_attribute(AttributeSpec::string("number")),
        )
        .register(ResourceType::new("Visa").extends("CreditCard", "Visa"))
        .register(ResourceType::new("Mastercard").extends("CreditCard", "Mastercard"))
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

    let schema = build(&registry, Some(&["notes"])).unwrap();
    assert!(matches!(schema.get_type("NoteCard"), Some(TypeDef::Interface(_))));
    assert_eq!(schema.field("NoteCard", "number").unwrap().ty.to_string(), "String");
}

#[test]
fn test_build_errors() {
    let colliding = Registry::builder()
        .register(ResourceType::new("Employee").with_entrypoint("people", "person"))
        .register(ResourceType::new("Contractor").with_entrypoint("people", "contractor"))
        .build()
        .unwrap();
    assert_eq!(
        build(&colliding, None).unwrap_err(),
        SchemaError::EntrypointCollision {
            name: "people".into(),
            first: "Employee".into(),
            second: "Contractor".into(),
        }
    );

    let unknown_filter = Registry::builder()
        .register(
            ResourceType::new("Employee")
                .with_entrypoint("employees", "employee")
                .with_filter(FilterSpec::new("nickname")),
        )
        .build()
        .unwrap();
    assert_eq!(
        build(&unknown_filter, None).unwrap_err(),
        SchemaError::UnknownFilterAttribute {
            resource: "Employee".into(),
            attribute: "nickname".into(),
        }
    );

    assert_eq!(
        build(&staff(), Some(&["nobody"])).unwrap_err(),
        SchemaError::UnknownEntrypoint("nobody".into())
    );
}
