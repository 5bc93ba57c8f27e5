//! Attribute declarations.

use crate::guard::Guard;
use crate::kind::AttributeKind;

/// A typed attribute of a resource.
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    pub name: String,
    pub kind: AttributeKind,
    pub description: Option<String>,
    pub readable: Guard,
    pub writable: Guard,
    pub filterable: Guard,
    pub sortable: Guard,
}

impl AttributeSpec {
    /// Creates a new attribute. Structured kinds start out neither
    /// filterable nor sortable.
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        let structured = kind.is_structured();
        Self {
            name: name.into(),
            kind,
            description: None,
            readable: Guard::Allow,
            writable: Guard::Allow,
            filterable: if structured { Guard::Deny } else { Guard::Allow },
            sortable: if structured { Guard::Deny } else { Guard::Allow },
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the read guard.
    #[must_use]
    pub fn with_readable(mut self, guard: Guard) -> Self {
        self.readable = guard;
        self
    }

    /// Sets the write guard.
    #[must_use]
    pub fn with_writable(mut self, guard: Guard) -> Self {
        self.writable = guard;
        self
    }

    /// Sets the guard applied to derived filters.
    #[must_use]
    pub fn with_filterable(mut self, guard: Guard) -> Self {
        self.filterable = guard;
        self
    }

    /// Sets the guard applied to derived sorts.
    #[must_use]
    pub fn with_sortable(mut self, guard: Guard) -> Self {
        self.sortable = guard;
        self
    }

    /// Shorthand for a string attribute.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::String)
    }

    /// Shorthand for an integer attribute.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Integer)
    }
}
