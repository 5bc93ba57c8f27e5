//! Request execution.

use crate::assembler::Assembler;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, FieldError};
use crate::planner::{Planner, RootPlan};
use rgql_resource::{Cardinality, RequestContext, ResourceLayer};
use rgql_schema::{validate, SchemaSnapshot, SchemaStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// An incoming GraphQL request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

impl Request {
    /// Creates a new request.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Selects the operation to run.
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Sets the variables.
    #[must_use]
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }
}

/// A GraphQL response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// `null` whenever the operation failed.
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl Response {
    /// Creates a successful response with data.
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// Creates an error response.
    pub fn error(error: FieldError) -> Self {
        Self {
            data: None,
            errors: Some(vec![error]),
        }
    }

    /// Returns true if the response has errors.
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// The first error code, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.errors
            .as_ref()
            .and_then(|errors| errors.first())
            .and_then(FieldError::code)
    }
}

/// Runs requests against the current schema snapshot and a resource layer.
pub struct Executor {
    store: Arc<SchemaStore>,
    layer: Arc<dyn ResourceLayer>,
    config: BridgeConfig,
}

impl Executor {
    /// Creates a new executor.
    pub fn new(store: Arc<SchemaStore>, layer: Arc<dyn ResourceLayer>) -> Self {
        Self {
            store,
            layer,
            config: BridgeConfig::default(),
        }
    }

    /// Sets the planning limits.
    #[must_use]
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SchemaStore> {
        &self.store
    }

    /// Executes a request. Failures produce `data: null` and one error.
    #[tracing::instrument(skip_all, fields(operation = request.operation_name.as_deref()))]
    pub async fn execute(&self, request: &Request, ctx: &RequestContext) -> Response {
        match self.run(request, ctx).await {
            Ok(data) => Response::data(data),
            Err(err) => {
                warn!(code = %err.code(), error = %err, "request failed");
                Response::error(err.to_field_error())
            }
        }
    }

    /// Executes a request, returning the `data` object.
    pub async fn run(&self, request: &Request, ctx: &RequestContext) -> Result<Value, BridgeError> {
        let snapshot = self.store.load();
        let plans = self.plan_with(&snapshot, request, ctx)?;
        let assembler = Assembler::new(&snapshot.registry);

        let mut data = Map::new();
        for root in &plans {
            let value = match root {
                RootPlan::Typename { .. } => Value::String(snapshot.descriptor.query_type.clone()),
                RootPlan::Collection(plan) | RootPlan::Single(plan) => {
                    let entities = match self.layer.fetch(plan, ctx).await {
                        Ok(entities) => entities,
                        Err(err) if err.is_not_found() => Vec::new(),
                        Err(err) => return Err(err.into()),
                    };
                    debug!(
                        field = root.key(),
                        entities = entities.len(),
                        single = plan.cardinality == Cardinality::One,
                        "fetched root field"
                    );
                    assembler.assemble(plan, &entities)?
                }
            };
            data.insert(root.key().to_string(), value);
        }
        Ok(Value::Object(data))
    }

    /// Parses, validates and plans a request without touching the resource
    /// layer.
    pub fn plan(&self, request: &Request, ctx: &RequestContext) -> Result<Vec<RootPlan>, BridgeError> {
        self.plan_with(&self.store.load(), request, ctx)
    }

    fn plan_with(
        &self,
        snapshot: &SchemaSnapshot,
        request: &Request,
        ctx: &RequestContext,
    ) -> Result<Vec<RootPlan>, BridgeError> {
        let document = rgql_syntax::parse(&request.query).into_result()?;
        let operation = document.operation(request.operation_name.as_deref())?;
        let variables = operation.coerce_variables(&request.variables);
        validate(&snapshot.descriptor, &document, operation, &variables)?;

        let plans = Planner::new(&snapshot.registry, &document, &variables, ctx)
            .with_config(self.config.clone())
            .plan_operation(operation)?;
        debug!(
            generation = snapshot.generation,
            roots = plans.len(),
            "planned request"
        );
        Ok(plans)
    }
}
