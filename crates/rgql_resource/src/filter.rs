//! Filter declarations.

use crate::guard::Guard;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A comparison a filter may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    NotEq,
    /// Case-sensitive equality.
    Eql,
    NotEql,
    Prefix,
    NotPrefix,
    Suffix,
    NotSuffix,
    /// Case-insensitive substring match.
    Match,
    NotMatch,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 14] = [
        Self::Eq,
        Self::NotEq,
        Self::Eql,
        Self::NotEql,
        Self::Prefix,
        Self::NotPrefix,
        Self::Suffix,
        Self::NotSuffix,
        Self::Match,
        Self::NotMatch,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::NotEq => "not_eq",
            Self::Eql => "eql",
            Self::NotEql => "not_eql",
            Self::Prefix => "prefix",
            Self::NotPrefix => "not_prefix",
            Self::Suffix => "suffix",
            Self::NotSuffix => "not_suffix",
            Self::Match => "match",
            Self::NotMatch => "not_match",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }

    /// Looks up an operator by its argument name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// The positive form of a negated operator.
    pub const fn positive(self) -> (Self, bool) {
        match self {
            Self::NotEq => (Self::Eq, true),
            Self::NotEql => (Self::Eql, true),
            Self::NotPrefix => (Self::Prefix, true),
            Self::NotSuffix => (Self::Suffix, true),
            Self::NotMatch => (Self::Match, true),
            other => (other, false),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter over one attribute.
///
/// Unless restricted with [`only`](Self::only), the operator set is derived
/// from the attribute's kind when the registry is built.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub attribute: String,
    pub operators: Vec<FilterOperator>,
    pub except: Vec<FilterOperator>,
    /// `None` inherits the attribute's `filterable` guard.
    pub guard: Option<Guard>,
    /// Root collection queries must supply this filter.
    pub required: bool,
    /// List values are rejected.
    pub single: bool,
    /// Values outside this list are rejected.
    pub allow: Option<Vec<serde_json::Value>>,
}

impl FilterSpec {
    /// Creates a new filter for the given attribute.
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            operators: Vec::new(),
            except: Vec::new(),
            guard: None,
            required: false,
            single: false,
            allow: None,
        }
    }

    /// Restricts the operator set.
    #[must_use]
    pub fn only(mut self, operators: impl IntoIterator<Item = FilterOperator>) -> Self {
        self.operators = operators.into_iter().collect();
        self
    }

    /// Removes operators from the derived set.
    #[must_use]
    pub fn except(mut self, operators: impl IntoIterator<Item = FilterOperator>) -> Self {
        self.except = operators.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Restricts accepted values.
    #[must_use]
    pub fn allow(mut self, values: impl IntoIterator<Item = serde_json::Value>) -> Self {
        self.allow = Some(values.into_iter().collect());
        self
    }

    /// The effective guard.
    pub fn guard(&self) -> &Guard {
        static ALLOW: Guard = Guard::Allow;
        self.guard.as_ref().unwrap_or(&ALLOW)
    }

    pub fn supports(&self, operator: FilterOperator) -> bool {
        self.operators.contains(&operator)
    }
}
