use crate::constants;
use crate::entity::Product;
use crate::validate::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contents of `pdp.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProjectConfig {
    #[serde(default = "default_timeout_secs_value")]
    pub timeout_secs: u64,
    /// Page size requested when listing entities
    #[serde(default = "default_page_size_value")]
    pub page_size: u32,
    /// Per-product overrides
    #[serde(default)]
    pub products: BTreeMap<Product, ProductConfig>,
    #[serde(default)]
    pub policy: PolicyConfig,
}

const fn default_timeout_secs_value() -> u64 {
    constants::DEFAULT_TIMEOUT_SECS
}

const fn default_page_size_value() -> u32 {
    constants::DEFAULT_PAGE_SIZE
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs_value(),
            page_size: default_page_size_value(),
            products: BTreeMap::new(),
            policy: PolicyConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Configured URL for `product`, if any.
    #[must_use]
    pub fn product_url(&self, product: Product) -> Option<&str> {
        self.products.get(&product).and_then(|p| p.url.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProductConfig {
    /// Base URL of the product's admin API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// How diagnostics are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Duplicate `id`/`name` within one type's file
    #[serde(default = "default_duplicates")]
    pub duplicates: Severity,
    /// Foreign-key IDs with no known name on export
    #[serde(default = "default_missing_mappings")]
    pub missing_mappings: Severity,
}

const fn default_duplicates() -> Severity {
    Severity::Error
}

const fn default_missing_mappings() -> Severity {
    Severity::Warning
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            duplicates: default_duplicates(),
            missing_mappings: default_missing_mappings(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: ProjectConfig = toml::from_str("").unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.policy.duplicates, Severity::Error);
        assert_eq!(config.policy.missing_mappings, Severity::Warning);
    }

    #[test]
    fn test_product_urls_are_read_by_name() {
        let config: ProjectConfig = toml::from_str(
            r#"
            page_size = 50

            [products.discovery]
            url = "http://search:9000"

            [policy]
            duplicates = "warning"
            "#,
        )
        .unwrap();

        assert_eq!(config.page_size, 50);
        assert_eq!(
            config.product_url(Product::Discovery),
            Some("http://search:9000")
        );
        assert_eq!(config.product_url(Product::Ingestion), None);
        assert_eq!(config.policy.duplicates, Severity::Warning);
        assert_eq!(config.policy.missing_mappings, Severity::Warning);
    }

    #[test]
    fn test_unknown_product_is_rejected() {
        let result = toml::from_str::<ProjectConfig>("[products.search]\nurl = \"x\"\n");
        assert!(result.is_err());
    }
}
