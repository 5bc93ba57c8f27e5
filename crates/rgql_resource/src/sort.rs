//! Sort declarations.

use crate::guard::Guard;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sort over one attribute.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub attribute: String,
    /// `None` inherits the attribute's `sortable` guard.
    pub guard: Option<Guard>,
    pub directions: Vec<SortDirection>,
}

impl SortSpec {
    /// Creates a sort allowing both directions.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            guard: None,
            directions: vec![SortDirection::Asc, SortDirection::Desc],
        }
    }

    /// Restricts the sort to one direction.
    #[must_use]
    pub fn only_direction(mut self, direction: SortDirection) -> Self {
        self.directions = vec![direction];
        self
    }

    #[must_use]
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// The effective guard.
    pub fn guard(&self) -> &Guard {
        static ALLOW: Guard = Guard::Allow;
        self.guard.as_ref().unwrap_or(&ALLOW)
    }
}
