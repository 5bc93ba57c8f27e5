//! Atomically published schema snapshots.
//!
//! Readers load the current snapshot without locking and keep it for the
//! whole request. A rebuild constructs the new registry and descriptor off to
//! the side and publishes them with a single swap; in-flight requests finish
//! against the snapshot they loaded.

use crate::builder::{build, SchemaError};
use crate::descriptor::SchemaDescriptor;
use arc_swap::ArcSwap;
use rgql_resource::Registry;
use std::sync::{Arc, Mutex, PoisonError};

/// A registry together with the schema generated from it.
#[derive(Debug)]
pub struct SchemaSnapshot {
    /// Incremented on every successful rebuild.
    pub generation: u64,
    pub registry: Arc<Registry>,
    pub descriptor: SchemaDescriptor,
}

/// Holds the current [`SchemaSnapshot`].
#[derive(Debug)]
pub struct SchemaStore {
    current: ArcSwap<SchemaSnapshot>,
    entrypoints: Option<Vec<String>>,
    /// Serializes rebuilds.
    writer: Mutex<()>,
}

impl SchemaStore {
    /// Builds the initial snapshot exposing every entrypoint.
    pub fn new(registry: Registry) -> Result<Self, SchemaError> {
        Self::build_store(registry, None)
    }

    /// Builds the initial snapshot exposing only `entrypoints`.
    pub fn with_entrypoints(registry: Registry, entrypoints: &[&str]) -> Result<Self, SchemaError> {
        let entrypoints = entrypoints.iter().map(|s| (*s).to_string()).collect();
        Self::build_store(registry, Some(entrypoints))
    }

    fn build_store(registry: Registry, entrypoints: Option<Vec<String>>) -> Result<Self, SchemaError> {
        let snapshot = snapshot(0, registry, entrypoints.as_deref())?;
        Ok(Self {
            current: ArcSwap::from_pointee(snapshot),
            entrypoints,
            writer: Mutex::new(()),
        })
    }

    /// Returns the current snapshot.
    pub fn load(&self) -> Arc<SchemaSnapshot> {
        self.current.load_full()
    }

    /// Replaces the registry. On error the previous snapshot stays current.
    #[tracing::instrument(skip_all)]
    pub fn rebuild(&self, registry: Registry) -> Result<Arc<SchemaSnapshot>, SchemaError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = self.current.load().generation + 1;
        let next = Arc::new(snapshot(generation, registry, self.entrypoints.as_deref())?);
        self.current.store(Arc::clone(&next));
        tracing::info!(generation, "schema snapshot published");
        Ok(next)
    }
}

fn snapshot(
    generation: u64,
    registry: Registry,
    entrypoints: Option<&[String]>,
) -> Result<SchemaSnapshot, SchemaError> {
    let names: Option<Vec<&str>> = entrypoints.map(|e| e.iter().map(String::as_str).collect());
    let descriptor = build(&registry, names.as_deref())?;
    Ok(SchemaSnapshot {
        generation,
        registry: Arc::new(registry),
        descriptor,
    })
}
