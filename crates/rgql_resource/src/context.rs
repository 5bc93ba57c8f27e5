//! Request-scoped context handed to guards.
//!
//! Values are keyed by `TypeId`, so guards look up exactly the type they
//! expect instead of parsing string-keyed maps.

use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Caller-supplied data for one operation.
///
/// # Example
///
/// ```
/// use rgql_resource::RequestContext;
///
/// struct Role(&'static str);
///
/// let ctx = RequestContext::new().with(Role("admin"));
/// assert_eq!(ctx.get::<Role>().map(|r| r.0), Some("admin"));
/// ```
#[derive(Default)]
pub struct RequestContext {
    data: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
    headers: HashMap<String, String>,
}

impl RequestContext {
    /// Creates a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.data
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|boxed| boxed.downcast().ok().map(|b| *b))
    }

    /// Adds a value and returns self.
    #[must_use]
    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Gets a reference to a value by type.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.data
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.data.contains_key(&TypeId::of::<T>())
    }

    /// Adds a header and returns self.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Gets a header value.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("data_count", &self.data.len())
            .field("headers", &self.headers)
            .finish()
    }
}
