use crate::config::models::ProjectConfig;
use crate::constants;
use crate::entity::Product;

/// Built-in base URL of a product.
#[must_use]
pub const fn default_url(product: Product) -> &'static str {
    match product {
        Product::Ingestion => constants::DEFAULT_INGESTION_URL,
        Product::Discovery => constants::DEFAULT_DISCOVERY_URL,
        Product::Core => constants::DEFAULT_CORE_URL,
        Product::Staging => constants::DEFAULT_STAGING_URL,
    }
}

/// Name of the environment variable overriding a product's URL, e.g.
/// `PDP_DISCOVERY_URL`.
#[must_use]
pub fn env_var_name(product: Product) -> String {
    format!("PDP_{}_URL", product.as_str().to_ascii_uppercase())
}

/// Resolves the base URL for a product based on a priority hierarchy
pub struct ProductUrlResolver<'a> {
    product: Product,
    /// Project configuration containing per-product overrides
    config: Option<&'a ProjectConfig>,
    /// Value of the product's environment variable
    env_url: Option<String>,
}

impl<'a> ProductUrlResolver<'a> {
    /// Creates a resolver for `product`, reading its environment variable.
    #[must_use]
    pub fn new(product: Product) -> Self {
        Self {
            product,
            config: None,
            env_url: std::env::var(env_var_name(product))
                .ok()
                .filter(|v| !v.trim().is_empty()),
        }
    }

    /// Sets the project configuration for per-product overrides
    #[must_use]
    pub const fn with_config(mut self, config: &'a ProjectConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Resolves the base URL according to the priority hierarchy:
    /// 1. Explicit parameter (`--url PRODUCT=URL`)
    /// 2. Environment variable: `PDP_<PRODUCT>_URL`
    /// 3. `[products.<product>]` in `pdp.toml`
    /// 4. Built-in default
    ///
    /// Trailing slashes are removed.
    #[must_use]
    pub fn resolve(&self, explicit_url: Option<&str>) -> String {
        let url = explicit_url
            .or(self.env_url.as_deref())
            .or_else(|| self.config.and_then(|c| c.product_url(self.product)))
            .unwrap_or_else(|| default_url(self.product));
        url.trim_end_matches('/').to_string()
    }
}
