//! Command-line interface for rgql.
//!
//! # Usage
//!
//! ```bash
//! # Print the schema generated for the demo resources
//! rgql sdl
//!
//! # Print the schema for a subset of entrypoints
//! rgql sdl --entrypoints employees,creditCards
//!
//! # Run a query against the demo data
//! rgql query '{ employees { firstName positions { title } } }'
//!
//! # Read the query from a file and act as an HR user
//! rgql query @staff.graphql --role hr
//!
//! # Show the resource plans without loading anything
//! rgql plan '{ creditCards { number ... on Visa { visaPoints } } }'
//! ```

pub mod demo;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rgql_resource::RequestContext;
use rgql_runtime::{BridgeConfig, Executor, Request};
use rgql_schema::SchemaStore;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "rgql")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the generated schema as SDL
    Sdl {
        /// Only expose these entrypoints (collection, single or resource names)
        #[arg(long, value_delimiter = ',')]
        entrypoints: Vec<String>,
    },

    /// Execute a query against the demo resources
    Query(QueryArgs),

    /// Print the resource plans for a query
    Plan(QueryArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Query text, or `@path` to read it from a file
    pub query: String,

    /// Variables as a JSON object
    #[arg(long)]
    pub variables: Option<String>,

    /// Operation to run when the document has several
    #[arg(long)]
    pub operation: Option<String>,

    /// Caller role, sent as the `x-role` header
    #[arg(long)]
    pub role: Option<String>,

    /// Maximum relationship depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Maximum page size
    #[arg(long)]
    pub max_page_size: Option<u64>,
}

impl QueryArgs {
    fn query_text(&self) -> std::io::Result<String> {
        match self.query.strip_prefix('@') {
            Some(path) => std::fs::read_to_string(path),
            None => Ok(self.query.clone()),
        }
    }

    fn request(&self, query: String) -> Result<Request, Box<dyn std::error::Error>> {
        let mut request = Request::new(query);
        if let Some(name) = &self.operation {
            request = request.with_operation_name(name);
        }
        if let Some(raw) = &self.variables {
            match serde_json::from_str(raw)? {
                Value::Object(variables) => request = request.with_variables(variables),
                Value::Null => request = request.with_variables(Map::new()),
                _ => return Err("--variables must be a JSON object".into()),
            }
        }
        Ok(request)
    }

    fn context(&self) -> RequestContext {
        match &self.role {
            Some(role) => RequestContext::new().with_header(demo::ROLE_HEADER, role.as_str()),
            None => RequestContext::new(),
        }
    }

    fn config(&self) -> BridgeConfig {
        let mut config = BridgeConfig::new();
        if let Some(depth) = self.max_depth {
            config = config.with_max_depth(depth);
        }
        if let Some(size) = self.max_page_size {
            config = config.with_max_page_size(size);
        }
        config
    }
}

pub async fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Sdl { entrypoints } => print_sdl(&entrypoints),
        Commands::Query(args) => query(&args).await,
        Commands::Plan(args) => plan(&args),
        Commands::Version => {
            println!("rgql {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

/// Renders the generated schema for the demo registry.
pub fn sdl(entrypoints: &[String]) -> Result<String, Box<dyn std::error::Error>> {
    let registry = demo::registry()?;
    let names: Vec<&str> = entrypoints.iter().map(String::as_str).collect();
    let selected = (!names.is_empty()).then_some(names.as_slice());
    Ok(rgql_schema::build(&registry, selected)?.to_sdl())
}

fn print_sdl(entrypoints: &[String]) -> Result<i32, Box<dyn std::error::Error>> {
    print!("{}", sdl(entrypoints)?);
    Ok(0)
}

fn executor(args: &QueryArgs) -> Result<Executor, Box<dyn std::error::Error>> {
    let store = SchemaStore::new(demo::registry()?)?;
    let config = args.config();
    tracing::debug!(
        max_depth = ?config.max_depth,
        max_page_size = ?config.max_page_size,
        role = args.role.as_deref(),
        "demo executor ready"
    );
    Ok(Executor::new(Arc::new(store), Arc::new(demo::layer())).with_config(config))
}

/// Renders syntax errors against the query source. Returns false if the
/// query does not parse.
fn check_syntax(query: &str) -> bool {
    match rgql_syntax::parse(query).into_result() {
        Ok(_) => true,
        Err(errors) => {
            let report = miette::Report::new(errors).with_source_code(query.to_string());
            eprintln!("{report:?}");
            false
        }
    }
}

async fn query(args: &QueryArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let text = args.query_text()?;
    if !check_syntax(&text) {
        return Ok(1);
    }
    let executor = executor(args)?;
    let response = executor.execute(&args.request(text)?, &args.context()).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    if let Some(code) = response.error_code() {
        eprintln!("{} {code}", "Failed".red().bold());
        return Ok(1);
    }
    Ok(0)
}

fn plan(args: &QueryArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let text = args.query_text()?;
    if !check_syntax(&text) {
        return Ok(1);
    }
    let executor = executor(args)?;
    match executor.plan(&args.request(text)?, &args.context()) {
        Ok(plans) => {
            println!("{}", serde_json::to_string_pretty(&plans)?);
            Ok(0)
        }
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            println!("{}", serde_json::to_string_pretty(&err.to_field_error())?);
            Ok(1)
        }
    }
}
