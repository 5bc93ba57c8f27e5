//! Access predicates over a request context.

use crate::context::RequestContext;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A failure raised from inside a guard predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GuardError {
    pub message: String,
}

impl GuardError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

type Predicate = dyn Fn(&RequestContext) -> Result<bool, GuardError> + Send + Sync;

/// Gates read, filter, sort or traversal access.
///
/// `Allow` and `Deny` are decided when the schema is built; `Runtime`
/// predicates are evaluated once per reference while planning a request.
#[derive(Clone, Default)]
pub enum Guard {
    #[default]
    Allow,
    Deny,
    Runtime(RuntimeGuard),
}

/// A predicate evaluated against each request.
#[derive(Clone)]
pub struct RuntimeGuard {
    predicate: Arc<Predicate>,
    non_fatal: bool,
}

impl RuntimeGuard {
    /// Runs the predicate.
    pub fn check(&self, ctx: &RequestContext) -> Result<bool, GuardError> {
        (self.predicate)(ctx)
    }

    /// Whether a predicate failure counts as "not allowed" instead of aborting.
    pub fn is_non_fatal(&self) -> bool {
        self.non_fatal
    }
}

impl Guard {
    /// A predicate that cannot fail.
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
    {
        Self::try_when(move |ctx| Ok(predicate(ctx)))
    }

    /// A fallible predicate. Failures abort planning unless the guard is
    /// marked [`non_fatal`](Self::non_fatal).
    pub fn try_when<F>(predicate: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<bool, GuardError> + Send + Sync + 'static,
    {
        Self::Runtime(RuntimeGuard {
            predicate: Arc::new(predicate),
            non_fatal: false,
        })
    }

    /// Treats predicate failures as "not allowed".
    #[must_use]
    pub fn non_fatal(self) -> Self {
        match self {
            Self::Runtime(guard) => Self::Runtime(RuntimeGuard {
                non_fatal: true,
                ..guard
            }),
            other => other,
        }
    }

    /// Whether the capability appears in the generated schema at all.
    pub fn is_exposed(&self) -> bool {
        !matches!(self, Self::Deny)
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::Runtime(_))
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("Allow"),
            Self::Deny => f.write_str("Deny"),
            Self::Runtime(guard) => f
                .debug_struct("Runtime")
                .field("non_fatal", &guard.non_fatal)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Admin;

    #[test]
    fn test_runtime_guard_reads_context() {
        let guard = Guard::when(|ctx| ctx.contains::<Admin>());
        let Guard::Runtime(runtime) = &guard else {
            panic!("expected runtime guard");
        };
        assert_eq!(runtime.check(&RequestContext::new()), Ok(false));
        assert_eq!(runtime.check(&RequestContext::new().with(Admin)), Ok(true));
        assert!(!runtime.is_non_fatal());
    }

    #[test]
    fn test_non_fatal_only_affects_runtime_guards() {
        let guard = Guard::try_when(|_| Err(GuardError::new("boom"))).non_fatal();
        let Guard::Runtime(runtime) = guard else {
            panic!("expected runtime guard");
        };
        assert!(runtime.is_non_fatal());
        assert!(!Guard::Deny.non_fatal().is_exposed());
    }
}
