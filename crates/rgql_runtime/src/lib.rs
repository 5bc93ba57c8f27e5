//! Request-time query resolution for rgql.
//!
//! This crate provides:
//! - `planner`: Turns validated selections into resource query plans
//! - `guard`: Evaluates access guards against a request context
//! - `assembler`: Folds loaded entities back into the response shape
//! - `executor`: Runs the whole pipeline against a schema store and resource layer
//! - `config`, `error`: Planning limits and the error taxonomy

pub mod assembler;
pub mod config;
pub mod error;
pub mod executor;
pub mod guard;
pub mod planner;

pub use assembler::Assembler;
pub use config::BridgeConfig;
pub use error::{Access, BridgeError, ErrorCode, FieldError};
pub use executor::{Executor, Request, Response};
pub use guard::{allowed, GuardEvaluator};
pub use planner::{Planner, RootPlan};
