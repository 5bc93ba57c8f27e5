//! Bridge configuration.

use serde::{Deserialize, Serialize};

/// Limits applied while planning a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Maximum plan nesting depth, counting the root field as 1.
    pub max_depth: Option<usize>,
    /// Maximum `page.size` accepted on any list field.
    pub max_page_size: Option<u64>,
}

impl BridgeConfig {
    /// Creates a new configuration without limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the maximum page size.
    #[must_use]
    pub fn with_max_page_size(mut self, max_page_size: u64) -> Self {
        self.max_page_size = Some(max_page_size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: BridgeConfig = serde_json::from_str(r#"{ "max_depth": 3 }"#).unwrap();
        assert_eq!(config, BridgeConfig::new().with_max_depth(3));
        assert_eq!(config.max_page_size, None);
    }
}
