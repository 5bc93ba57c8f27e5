use rgql_resource::*;
use rgql_runtime::{BridgeConfig, Executor, Request, RootPlan};
use rgql_schema::SchemaStore;
use serde_json::{json, Value};
use std::sync::Arc;

fn registry() -> Registry {
    let hr_only = || Guard::when(|ctx| ctx.header("x-role") == Some("hr"));
    Registry::builder()
        .register(
            ResourceType::new("Employee")
                .with_entrypoint("employees", "employee")
                .with_attribute(AttributeSpec::string("firstName"))
                .with_attribute(AttributeSpec::integer("salary").with_readable(hr_only()))
                .with_filter(FilterSpec::new("firstName").only([FilterOperator::Eq]))
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
                .with_relationship(RelationshipSpec::has_many("employees", "Employee")),
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
        .register(ResourceType::new("Mastercard").extends("CreditCard", "Mastercard"))
        .register(ResourceType::new("Transaction").with_attribute(AttributeSpec::integer("amount")))
        .build()
        .unwrap()
}

fn layer() -> MemoryLayer {
    let mut layer = MemoryLayer::new()
        .with_entity(
            "Employee",
            Entity::new("e1").with("firstName", "Stephen").with("salary", 100),
        )
        .with_entity(
            "Employee",
            Entity::new("e2").with("firstName", "Agatha").with("salary", 200),
        )
        .with_entity("Position", Entity::new("p1").with("title", "Engineer"))
        .with_entity("Position", Entity::new("p2").with("title", "Manager"))
        .with_entity("Position", Entity::new("p3").with("title", "Architect"))
        .with_entity(
            "CreditCard",
            Entity::new("c1")
                .with_discriminant("Visa")
                .with("number", "4111")
                .with("visaPoints", 12),
        )
        .with_entity(
            "CreditCard",
            Entity::new("c2")
                .with_discriminant("Mastercard")
                .with("number", "5500"),
        )
        .with_entity("Transaction", Entity::new("t1").with("amount", 25))
        .with_entity("Transaction", Entity::new("t2").with("amount", 40))
        .with_entity("Transaction", Entity::new("t3").with("amount", 99));
    layer.link("Employee", "e1", "positions", "Position", "p1");
    layer.link("Employee", "e1", "positions", "Position", "p3");
    layer.link("Employee", "e2", "positions", "Position", "p2");
    layer.link("CreditCard", "c1", "transactions", "Transaction", "t1");
    layer.link("CreditCard", "c1", "transactions", "Transaction", "t2");
    // Present in storage but never requested: the relationship is Visa-only.
    layer.link("CreditCard", "c2", "transactions", "Transaction", "t3");
    layer
}

struct Fixture {
    layer: Arc<MemoryLayer>,
    executor: Executor,
}

fn fixture(config: BridgeConfig) -> Fixture {
    let layer = Arc::new(layer());
    let store = Arc::new(SchemaStore::new(registry()).unwrap());
    let executor = Executor::new(store, layer.clone()).with_config(config);
    Fixture { layer, executor }
}

async fn run(fixture: &Fixture, query: &str, ctx: &RequestContext) -> Value {
    let response = fixture.executor.execute(&Request::new(query), ctx).await;
    serde_json::to_value(response).unwrap()
}

#[tokio::test]
async fn test_filter_selects_matching_employee() {
    let fixture = fixture(BridgeConfig::default());
    let query = r#"{ employees(filter: { firstName: { eq: "Agatha" } }) { id firstName } }"#;

    let plans = fixture
        .executor
        .plan(&Request::new(query), &RequestContext::new())
        .unwrap();
    let RootPlan::Collection(plan) = &plans[0] else {
        panic!("expected collection plan");
    };
    assert_eq!(
        plan.filters,
        vec![FilterParam {
            attribute: "firstName".into(),
            operator: FilterOperator::Eq,
            value: json!("Agatha"),
        }]
    );

    let response = run(&fixture, query, &RequestContext::new()).await;
    assert_eq!(
        response,
        json!({ "data": { "employees": [{ "id": "e2", "firstName": "Agatha" }] } })
    );
}

#[tokio::test]
async fn test_guarded_attribute_denies_whole_operation() {
    let fixture = fixture(BridgeConfig::default());
    let query = "{ employees { firstName salary } }";

    let response = run(&fixture, query, &RequestContext::new()).await;
    assert_eq!(response["data"], Value::Null);
    assert_eq!(response["errors"].as_array().unwrap().len(), 1);
    assert_eq!(response["errors"][0]["extensions"]["code"], "ACCESS_DENIED");
    assert_eq!(response["errors"][0]["extensions"]["field"], "salary");
    assert_eq!(fixture.layer.fetch_count(), 0);

    let hr = RequestContext::new().with_header("x-role", "hr");
    let response = run(&fixture, query, &hr).await;
    assert_eq!(
        response["data"]["employees"],
        json!([
            { "firstName": "Stephen", "salary": 100 },
            { "firstName": "Agatha", "salary": 200 }
        ])
    );
}

#[tokio::test]
async fn test_empty_many_relationship_is_empty_list() {
    let fixture = fixture(BridgeConfig::default());
    let response = run(
        &fixture,
        "{ employees { firstName positions { title department { name } } } }",
        &RequestContext::new(),
    )
    .await;
    assert_eq!(
        response["data"]["employees"][1],
        json!({ "firstName": "Agatha", "positions": [{ "title": "Manager", "department": null }] })
    );

    let response = run(
        &fixture,
        "{ creditCards { ... on Visa { transactions(filter: { amount: { gt: 1000 } }) { amount } } } }",
        &RequestContext::new(),
    )
    .await;
    assert_eq!(response["data"]["creditCards"][0], json!({ "transactions": [] }));
}

#[tokio::test]
async fn test_fragment_relationship_only_for_its_variant() {
    let fixture = fixture(BridgeConfig::default());
    let response = run(
        &fixture,
        "{ creditCards { number __typename ... on Visa { visaPoints transactions { amount } } } }",
        &RequestContext::new(),
    )
    .await;
    assert_eq!(
        response,
        json!({
            "data": {
                "creditCards": [
                    {
                        "number": "4111",
                        "__typename": "Visa",
                        "visaPoints": 12,
                        "transactions": [{ "amount": 25 }, { "amount": 40 }]
                    },
                    { "number": "5500", "__typename": "Mastercard" }
                ]
            }
        })
    );
}

#[tokio::test]
async fn test_fragments_on_the_same_relationship_plan_per_discriminant() {
    let fixture = fixture(BridgeConfig::default());
    let query = r#"
        query {
            creditCards {
                ... on Visa { transactions(sort: [{ att: amount, dir: desc }]) { amount } }
                ...Mine
            }
        }
        fragment Mine on Visa { transactions(sort: [{ att: amount, dir: desc }]) { id } }
    "#;
    let plans = fixture
        .executor
        .plan(&Request::new(query), &RequestContext::new())
        .unwrap();
    let plan = plans[0].plan().unwrap();
    assert!(plan.children.is_empty());
    assert!(!plan.variants.contains_key("Mastercard"));
    let transactions = &plan.variants["Visa"].children["transactions"];
    assert_eq!(transactions.fields, vec!["amount", "id"]);
    assert_eq!(transactions.sorts[0].direction, SortDirection::Desc);

    let response = run(&fixture, query, &RequestContext::new()).await;
    assert_eq!(
        response["data"]["creditCards"][0]["transactions"],
        json!([{ "amount": 40, "id": "t2" }, { "amount": 25, "id": "t1" }])
    );
}

#[tokio::test]
async fn test_depth_limit_aborts_before_any_fetch() {
    let fixture = fixture(BridgeConfig::new().with_max_depth(2));
    let response = run(
        &fixture,
        "{ employees { positions { department { employees { id } } } } }",
        &RequestContext::new(),
    )
    .await;

    assert_eq!(response["data"], Value::Null);
    let extensions = &response["errors"][0]["extensions"];
    assert_eq!(extensions["code"], "DEPTH_EXCEEDED");
    assert_eq!(extensions["depth"], 4);
    assert_eq!(extensions["maxDepth"], 2);
    assert_eq!(fixture.layer.fetch_count(), 0);
}

#[tokio::test]
async fn test_planning_is_idempotent() {
    let fixture = fixture(BridgeConfig::default());
    let request = Request::new(
        r#"query($name: String) {
            employees(filter: { firstName: { eq: [$name] } }) { firstName positions { title } }
            creditCards { ... on Visa { transactions { amount } } }
        }"#,
    )
    .with_variables(json!({ "name": "Stephen" }).as_object().cloned().unwrap());
    let ctx = RequestContext::new();

    let first = fixture.executor.plan(&request, &ctx).unwrap();
    let second = fixture.executor.plan(&request, &ctx).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_nested_pagination_across_parents_is_fatal() {
    let fixture = fixture(BridgeConfig::default());
    let response = run(
        &fixture,
        "{ employees { firstName positions(page: { size: 1 }) { title } } }",
        &RequestContext::new(),
    )
    .await;

    assert_eq!(response["data"], Value::Null);
    assert_eq!(response["errors"][0]["extensions"]["code"], "UNSUPPORTED_PAGINATION");
    assert_eq!(response["errors"][0]["path"], json!(["employees", "positions"]));

    // A single parent can page its own relationship.
    let response = run(
        &fixture,
        r#"{ employee(id: "e1") { positions(page: { size: 1, number: 2 }) { title } } }"#,
        &RequestContext::new(),
    )
    .await;
    assert_eq!(
        response["data"]["employee"],
        json!({ "positions": [{ "title": "Architect" }] })
    );
}

#[tokio::test]
async fn test_missing_single_entity_is_null() {
    let fixture = fixture(BridgeConfig::default());
    let response = run(
        &fixture,
        r#"{ __typename employee(id: "e9") { firstName } }"#,
        &RequestContext::new(),
    )
    .await;
    assert_eq!(
        response,
        json!({ "data": { "__typename": "Query", "employee": null } })
    );
}

#[tokio::test]
async fn test_schema_errors_abort_before_planning() {
    let fixture = fixture(BridgeConfig::default());
    let ctx = RequestContext::new();

    let response = run(&fixture, "{ employees { nickname } }", &ctx).await;
    assert_eq!(response["errors"][0]["extensions"]["code"], "VALIDATION_ERROR");
    assert_eq!(response["errors"][0]["path"], json!(["employees"]));

    let response = run(&fixture, "{ employees { id ", &ctx).await;
    assert_eq!(response["errors"][0]["extensions"]["code"], "PARSE_ERROR");

    let response = run(&fixture, "query A { employees { id } } query B { creditCards { id } }", &ctx).await;
    assert_eq!(response["errors"][0]["extensions"]["code"], "NO_OPERATION");

    assert_eq!(fixture.layer.fetch_count(), 0);
}

#[tokio::test]
async fn test_operation_name_selects_operation() {
    let fixture = fixture(BridgeConfig::default());
    let request = Request::new("query A { employees { id } } query B { creditCards { id } }")
        .with_operation_name("B");
    let response = fixture
        .executor
        .execute(&request, &RequestContext::new())
        .await;
    assert!(!response.has_errors());
    assert_eq!(
        response.data,
        Some(json!({ "creditCards": [{ "id": "c1" }, { "id": "c2" }] }))
    );
}

#[tokio::test]
async fn test_rebuild_is_picked_up_by_later_requests() {
    let fixture = fixture(BridgeConfig::default());
    let ctx = RequestContext::new();
    let before = fixture.executor.store().load();

    let narrowed = Registry::builder()
        .register(
            ResourceType::new("Employee")
                .with_entrypoint("employees", "employee")
                .with_attribute(AttributeSpec::string("firstName")),
        )
        .build()
        .unwrap();
    fixture.executor.store().rebuild(narrowed).unwrap();

    let response = run(&fixture, "{ creditCards { id } }", &ctx).await;
    assert_eq!(response["errors"][0]["extensions"]["code"], "VALIDATION_ERROR");
    assert_eq!(before.generation, 0);
    assert!(before.descriptor.query().is_some_and(|q| q.fields.contains_key("creditCards")));
}

fn hr_only() -> Guard {
    Guard::when(|ctx| ctx.header("x-role") == Some("hr"))
}

fn guarded_registry() -> Registry {
    Registry::builder()
        .register(ResourceType::new("Team").with_attribute(AttributeSpec::string("name")))
        .register(
            ResourceType::new("Employee")
                .with_entrypoint("employees", "employee")
                .with_attribute(AttributeSpec::string("name").with_readable(hr_only()))
                .with_attribute(AttributeSpec::integer("level").with_sortable(hr_only()))
                .with_attribute(AttributeSpec::string("badge").with_readable(Guard::try_when(
                    |_| Err(GuardError::new("badge service unavailable")),
                )))
                .with_attribute(
                    AttributeSpec::string("nickname")
                        .with_readable(
                            Guard::try_when(|_| Err(GuardError::new("no profile"))).non_fatal(),
                        ),
                )
                .with_relationship(
                    RelationshipSpec::has_many("reports", "Employee").with_guard(hr_only()),
                ),
        )
        .register(
            ResourceType::new("Note")
                .with_entrypoint("notes", "note")
                .with_relationship(RelationshipSpec::polymorphic_belongs_to(
                    "notable",
                    [("Team", "Team"), ("Employee", "Employee")],
                )),
        )
        .register(
            ResourceType::new("CreditCard")
                .with_entrypoint("creditCards", "creditCard")
                .with_attribute(AttributeSpec::string("number")),
        )
        .register(
            ResourceType::new("Visa")
                .extends("CreditCard", "Visa")
                .with_attribute(AttributeSpec::string("number").with_readable(hr_only())),
        )
        .register(ResourceType::new("Mastercard").extends("CreditCard", "Mastercard"))
        .build()
        .unwrap()
}

fn guarded_fixture() -> Fixture {
    let mut layer = MemoryLayer::new()
        .with_entity("Team", Entity::new("t1").with("name", "Platform"))
        .with_entity(
            "Employee",
            Entity::new("e1")
                .with("name", "SECRET")
                .with("level", 3)
                .with("badge", "B-1")
                .with("nickname", "Steve"),
        )
        .with_entity("Note", Entity::new("n1"))
        .with_entity("Note", Entity::new("n2"))
        .with_entity(
            "CreditCard",
            Entity::new("c1").with_discriminant("Visa").with("number", "4111"),
        )
        .with_entity(
            "CreditCard",
            Entity::new("c2").with_discriminant("Mastercard").with("number", "5500"),
        );
    layer.link_polymorphic("Note", "n1", "notable", "Team", "Team", "t1");
    layer.link_polymorphic("Note", "n2", "notable", "Employee", "Employee", "e1");

    let layer = Arc::new(layer);
    let store = Arc::new(SchemaStore::new(guarded_registry()).unwrap());
    let executor = Executor::new(store, layer.clone());
    Fixture { layer, executor }
}

#[tokio::test]
async fn test_polymorphic_target_checks_every_candidate_guard() {
    let fixture = guarded_fixture();
    let query = "{ notes { notable { name } } }";

    let response = run(&fixture, query, &RequestContext::new()).await;
    assert_eq!(response["data"], Value::Null);
    assert_eq!(response["errors"][0]["extensions"]["code"], "ACCESS_DENIED");
    assert_eq!(response["errors"][0]["extensions"]["type"], "Employee");
    assert_eq!(response["errors"][0]["path"], json!(["notes", "notable", "name"]));
    assert_eq!(fixture.layer.fetch_count(), 0);

    let hr = RequestContext::new().with_header("x-role", "hr");
    let response = run(&fixture, query, &hr).await;
    assert_eq!(
        response["data"]["notes"],
        json!([
            { "notable": { "name": "Platform" } },
            { "notable": { "name": "SECRET" } }
        ])
    );
}

#[tokio::test]
async fn test_base_selection_checks_variant_overrides() {
    let fixture = guarded_fixture();
    let query = "{ creditCards { number } }";

    let response = run(&fixture, query, &RequestContext::new()).await;
    assert_eq!(response["data"], Value::Null);
    assert_eq!(response["errors"][0]["extensions"]["code"], "ACCESS_DENIED");
    assert_eq!(response["errors"][0]["extensions"]["type"], "Visa");
    assert_eq!(fixture.layer.fetch_count(), 0);

    let hr = RequestContext::new().with_header("x-role", "hr");
    let response = run(&fixture, query, &hr).await;
    assert_eq!(
        response["data"]["creditCards"],
        json!([{ "number": "4111" }, { "number": "5500" }])
    );
}

#[tokio::test]
async fn test_relationship_traversal_guard() {
    let fixture = guarded_fixture();
    let query = "{ employees { level reports { level } } }";

    let response = run(&fixture, query, &RequestContext::new()).await;
    assert_eq!(response["data"], Value::Null);
    assert_eq!(response["errors"][0]["extensions"]["code"], "ACCESS_DENIED");
    assert_eq!(response["errors"][0]["extensions"]["access"], "traverse");
    assert_eq!(response["errors"][0]["path"], json!(["employees", "reports"]));

    let hr = RequestContext::new().with_header("x-role", "hr");
    let response = run(&fixture, query, &hr).await;
    assert_eq!(
        response["data"]["employees"],
        json!([{ "level": 3, "reports": [] }])
    );
}

#[tokio::test]
async fn test_sort_guard() {
    let fixture = guarded_fixture();
    let query = "{ employees(sort: [{ att: level, dir: desc }]) { level } }";

    let response = run(&fixture, query, &RequestContext::new()).await;
    assert_eq!(response["data"], Value::Null);
    assert_eq!(response["errors"][0]["extensions"]["code"], "ACCESS_DENIED");
    assert_eq!(response["errors"][0]["extensions"]["access"], "sort");
    assert_eq!(response["errors"][0]["extensions"]["field"], "level");
    assert_eq!(fixture.layer.fetch_count(), 0);

    let hr = RequestContext::new().with_header("x-role", "hr");
    let response = run(&fixture, query, &hr).await;
    assert_eq!(response["data"]["employees"], json!([{ "level": 3 }]));
}

#[tokio::test]
async fn test_failing_guards() {
    let fixture = guarded_fixture();

    let response = run(&fixture, "{ employees { badge } }", &RequestContext::new()).await;
    assert_eq!(response["data"], Value::Null);
    assert_eq!(response["errors"][0]["extensions"]["code"], "GUARD_FAILED");
    assert_eq!(response["errors"][0]["extensions"]["field"], "badge");

    // A non-fatal failure reads as a denial.
    let response = run(&fixture, "{ employees { nickname } }", &RequestContext::new()).await;
    assert_eq!(response["data"], Value::Null);
    assert_eq!(response["errors"][0]["extensions"]["code"], "ACCESS_DENIED");
    assert_eq!(response["errors"][0]["extensions"]["field"], "nickname");
    assert_eq!(fixture.layer.fetch_count(), 0);
}
