//! Configuration settings management
//!
//! Type-safe access to the settings in `pdp.toml`, addressed with
//! dot-notation keys such as `policy.duplicates` or `products.core.url`.

use super::models::ProjectConfig;
use crate::entity::Product;
use crate::error::Error;
use crate::suggestions;
use crate::validate::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A valid configuration setting key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Request timeout in seconds (`timeout_secs`)
    TimeoutSecs,
    /// Page size for list requests (`page_size`)
    PageSize,
    /// Base URL of a product (`products.<product>.url`)
    ProductUrl(Product),
    /// Severity of duplicate ids or names (`policy.duplicates`)
    PolicyDuplicates,
    /// Severity of missing ID mappings on export (`policy.missing_mappings`)
    PolicyMissingMappings,
}

impl SettingKey {
    /// All available setting keys for enumeration.
    pub const ALL: &'static [Self] = &[
        Self::TimeoutSecs,
        Self::PageSize,
        Self::ProductUrl(Product::Ingestion),
        Self::ProductUrl(Product::Discovery),
        Self::ProductUrl(Product::Core),
        Self::ProductUrl(Product::Staging),
        Self::PolicyDuplicates,
        Self::PolicyMissingMappings,
    ];

    /// Returns the dot-notation key string for this setting.
    #[must_use]
    pub fn as_str(&self) -> String {
        match self {
            Self::TimeoutSecs => "timeout_secs".to_string(),
            Self::PageSize => "page_size".to_string(),
            Self::ProductUrl(product) => format!("products.{product}.url"),
            Self::PolicyDuplicates => "policy.duplicates".to_string(),
            Self::PolicyMissingMappings => "policy.missing_mappings".to_string(),
        }
    }

    /// Returns the expected type name for this setting.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::TimeoutSecs | Self::PageSize => "integer",
            Self::ProductUrl(_) => "url",
            Self::PolicyDuplicates | Self::PolicyMissingMappings => "severity",
        }
    }

    /// Returns a human-readable description of this setting.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::TimeoutSecs => "Timeout for API requests in seconds",
            Self::PageSize => "Number of entities requested per page when exporting",
            Self::ProductUrl(_) => "Base URL of the product's admin API",
            Self::PolicyDuplicates => "How duplicate ids or names in one file are treated",
            Self::PolicyMissingMappings => "How IDs without a known name are treated on export",
        }
    }

    /// Returns the default value for this setting as a string.
    #[must_use]
    pub const fn default_value_str(&self) -> &'static str {
        match self {
            Self::TimeoutSecs => "30",
            Self::PageSize => "100",
            Self::ProductUrl(product) => super::url_resolver::default_url(*product),
            Self::PolicyDuplicates => "error",
            Self::PolicyMissingMappings => "warning",
        }
    }

    /// Extracts the current value for this setting from a `ProjectConfig`.
    #[must_use]
    pub fn value_from_config(&self, config: &ProjectConfig) -> SettingValue {
        match self {
            Self::TimeoutSecs => SettingValue::U64(config.timeout_secs),
            Self::PageSize => SettingValue::U64(u64::from(config.page_size)),
            Self::ProductUrl(product) => SettingValue::Text(
                config
                    .product_url(*product)
                    .unwrap_or_else(|| super::url_resolver::default_url(*product))
                    .to_string(),
            ),
            Self::PolicyDuplicates => SettingValue::Severity(config.policy.duplicates),
            Self::PolicyMissingMappings => SettingValue::Severity(config.policy.missing_mappings),
        }
    }

    /// Writes `value` into `config`. The value must have been parsed for
    /// this key.
    pub fn apply(&self, config: &mut ProjectConfig, value: &SettingValue) {
        match (self, value) {
            (Self::TimeoutSecs, SettingValue::U64(v)) => config.timeout_secs = *v,
            (Self::PageSize, SettingValue::U64(v)) => {
                config.page_size = u32::try_from(*v).unwrap_or(u32::MAX);
            }
            (Self::ProductUrl(product), SettingValue::Text(url)) => {
                config.products.entry(*product).or_default().url = Some(url.clone());
            }
            (Self::PolicyDuplicates, SettingValue::Severity(s)) => config.policy.duplicates = *s,
            (Self::PolicyMissingMappings, SettingValue::Severity(s)) => {
                config.policy.missing_mappings = *s;
            }
            _ => {}
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timeout_secs" => Ok(Self::TimeoutSecs),
            "page_size" => Ok(Self::PageSize),
            "policy.duplicates" => Ok(Self::PolicyDuplicates),
            "policy.missing_mappings" => Ok(Self::PolicyMissingMappings),
            _ => s
                .strip_prefix("products.")
                .and_then(|rest| rest.strip_suffix(".url"))
                .and_then(|product| product.parse::<Product>().ok())
                .map(Self::ProductUrl)
                .ok_or_else(|| Error::unknown_setting_key(s)),
        }
    }
}

/// Type-safe representation of a configuration setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    U64(u64),
    Text(String),
    Severity(Severity),
}

/// Maximum allowed timeout value (1 day in seconds).
const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Maximum page size the platform APIs accept.
const MAX_PAGE_SIZE: u64 = 10_000;

impl SettingValue {
    /// Parse a string value into the appropriate type for the given key.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be parsed as the expected type,
    /// or if the value is outside the allowed range for the setting.
    pub fn parse_for_key(key: SettingKey, value: &str) -> Result<Self, Error> {
        match key {
            SettingKey::TimeoutSecs => parse_bounded(key, value, MAX_TIMEOUT_SECS),
            SettingKey::PageSize => parse_bounded(key, value, MAX_PAGE_SIZE),
            SettingKey::ProductUrl(_) => {
                let trimmed = value.trim().trim_end_matches('/');
                if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
                    Ok(Self::Text(trimmed.to_string()))
                } else {
                    Err(Error::invalid_setting_value(
                        key,
                        value,
                        "an http:// or https:// URL",
                    ))
                }
            }
            SettingKey::PolicyDuplicates | SettingKey::PolicyMissingMappings => value
                .parse::<Severity>()
                .map(Self::Severity)
                .map_err(|()| {
                    Error::invalid_setting_value(
                        key,
                        value,
                        &suggestions::suggest_valid_values(&key.as_str(), Severity::VALUES),
                    )
                }),
        }
    }

    /// Returns the value as a u64, if it is one.
    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(v) => Some(*v),
            _ => None,
        }
    }
}

fn parse_bounded(key: SettingKey, value: &str, max: u64) -> Result<SettingValue, Error> {
    let parsed = value
        .parse::<u64>()
        .map_err(|_| Error::invalid_setting_value(key, value, "a positive integer"))?;
    if parsed == 0 {
        return Err(Error::setting_value_out_of_range(
            key,
            value,
            "must be greater than 0",
        ));
    }
    if parsed > max {
        return Err(Error::setting_value_out_of_range(
            key,
            value,
            &format!("cannot exceed {max}"),
        ));
    }
    Ok(SettingValue::U64(parsed))
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U64(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Severity(v) => write!(f, "{v}"),
        }
    }
}

/// Information about a configuration setting for display purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingInfo {
    /// The setting key in dot-notation
    pub key: String,
    /// Current value as a string
    pub value: String,
    /// Expected type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Human-readable description
    pub description: String,
    /// Default value as a string
    pub default: String,
}

impl SettingInfo {
    /// Create a new `SettingInfo` from a key and current value.
    #[must_use]
    pub fn new(key: SettingKey, current_value: &SettingValue) -> Self {
        Self {
            key: key.as_str(),
            value: current_value.to_string(),
            type_name: key.type_name().to_string(),
            description: key.description().to_string(),
            default: key.default_value_str().to_string(),
        }
    }
}
