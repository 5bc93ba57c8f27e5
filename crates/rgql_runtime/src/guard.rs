//! Guard evaluation.

use crate::error::{Access, BridgeError};
use rgql_resource::{Guard, GuardError, RequestContext};

/// Evaluates a guard against a context.
///
/// A failing predicate counts as "not allowed" only when the guard is
/// non-fatal; otherwise the failure is returned.
pub fn allowed(guard: &Guard, ctx: &RequestContext) -> Result<bool, GuardError> {
    match guard {
        Guard::Allow => Ok(true),
        Guard::Deny => Ok(false),
        Guard::Runtime(runtime) => match runtime.check(ctx) {
            Ok(allowed) => Ok(allowed),
            Err(_) if runtime.is_non_fatal() => Ok(false),
            Err(err) => Err(err),
        },
    }
}

/// Checks guards for one request.
///
/// Guards are evaluated on every reference and never cached.
#[derive(Debug, Clone, Copy)]
pub struct GuardEvaluator<'a> {
    ctx: &'a RequestContext,
}

impl<'a> GuardEvaluator<'a> {
    /// Creates a new evaluator.
    pub fn new(ctx: &'a RequestContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &'a RequestContext {
        self.ctx
    }

    /// Fails with `AccessDenied` unless `guard` allows the access.
    pub fn require(
        &self,
        guard: &Guard,
        access: Access,
        resource: &str,
        name: &str,
        path: &[String],
    ) -> Result<(), BridgeError> {
        match allowed(guard, self.ctx) {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::debug!(resource, name, %access, "access denied");
                Err(BridgeError::AccessDenied {
                    resource: resource.to_string(),
                    name: name.to_string(),
                    access,
                    path: path.to_vec(),
                })
            }
            Err(source) => Err(BridgeError::GuardFailed {
                resource: resource.to_string(),
                name: name.to_string(),
                path: path.to_vec(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Admin;

    #[test]
    fn test_static_guards() {
        let ctx = RequestContext::new();
        assert_eq!(allowed(&Guard::Allow, &ctx), Ok(true));
        assert_eq!(allowed(&Guard::Deny, &ctx), Ok(false));
    }

    #[test]
    fn test_failures_are_fatal_unless_marked() {
        let ctx = RequestContext::new();
        let failing = Guard::try_when(|_| Err(GuardError::new("no session")));
        assert_eq!(allowed(&failing, &ctx), Err(GuardError::new("no session")));
        assert_eq!(allowed(&failing.non_fatal(), &ctx), Ok(false));
    }

    #[test]
    fn test_require_reports_access_and_path() {
        let ctx = RequestContext::new();
        let evaluator = GuardEvaluator::new(&ctx);
        let guard = Guard::when(|ctx| ctx.contains::<Admin>());

        let err = evaluator
            .require(&guard, Access::Read, "Employee", "salary", &["employees".into()])
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::AccessDenied { ref name, access: Access::Read, .. } if name == "salary"
        ));

        let admin = RequestContext::new().with(Admin);
        assert!(GuardEvaluator::new(&admin)
            .require(&guard, Access::Read, "Employee", "salary", &[])
            .is_ok());
    }

    #[test]
    fn test_guards_run_on_every_reference() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let guard = Guard::when(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        let ctx = RequestContext::new();
        let evaluator = GuardEvaluator::new(&ctx);
        for _ in 0..3 {
            evaluator
                .require(&guard, Access::Filter, "Employee", "firstName", &[])
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
