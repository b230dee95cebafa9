//! Entity CRUD against the product admin APIs.

use crate::client::HttpClient;
use crate::config::models::ProjectConfig;
use crate::config::url_resolver::ProductUrlResolver;
use crate::constants::{self, HTTP_METHOD_GET, HTTP_METHOD_POST, HTTP_METHOD_PUT};
use crate::entity::{Entity, EntityType, Product};
use crate::error::Error;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Upper bound on pages fetched for one type, in case a server never
/// reports its last page.
const MAX_PAGES: u32 = 10_000;

/// Remote operations export and deploy need.
#[allow(async_fn_in_trait)]
pub trait EntityApi {
    /// Every entity of `entity_type` on the server.
    async fn list(&self, entity_type: &EntityType) -> Result<Vec<Entity>, Error>;

    /// Creates `entity`; returns the server's representation when it sends one.
    async fn create(&self, entity_type: &EntityType, entity: &Entity)
        -> Result<Option<Entity>, Error>;

    /// Replaces the entity `id`; returns the server's representation when it
    /// sends one.
    async fn update(
        &self,
        entity_type: &EntityType,
        id: &str,
        entity: &Entity,
    ) -> Result<Option<Entity>, Error>;
}

/// [`EntityApi`] over HTTP, one base URL per product.
#[derive(Debug, Clone)]
pub struct HttpEntityApi {
    client: HttpClient,
    base_urls: HashMap<Product, String>,
    page_size: u32,
}

impl HttpEntityApi {
    #[must_use]
    pub fn new(client: HttpClient, page_size: u32) -> Self {
        Self {
            client,
            base_urls: HashMap::new(),
            page_size: page_size.max(1),
        }
    }

    /// Builds a client with every product URL resolved from `overrides`,
    /// the environment and `config`. Later overrides of a product win.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(
        config: &ProjectConfig,
        overrides: &[(Product, String)],
    ) -> Result<Self, Error> {
        let client = HttpClient::new(Duration::from_secs(config.timeout_secs))?;
        let mut api = Self::new(client, config.page_size);
        for product in Product::ALL {
            let explicit = overrides
                .iter()
                .rev()
                .find(|(p, _)| p == product)
                .map(|(_, url)| url.as_str());
            let url = ProductUrlResolver::new(*product)
                .with_config(config)
                .resolve(explicit);
            api = api.with_base_url(*product, url);
        }
        Ok(api)
    }

    #[must_use]
    pub fn with_base_url(mut self, product: Product, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_urls
            .insert(product, url.trim_end_matches('/').to_string());
        self
    }

    #[must_use]
    pub fn base_url(&self, product: Product) -> &str {
        self.base_urls
            .get(&product)
            .map_or_else(|| crate::config::url_resolver::default_url(product), String::as_str)
    }

    /// `{base}/{apiPath}`
    #[must_use]
    pub fn collection_url(&self, entity_type: &EntityType) -> String {
        format!("{}/{}", self.base_url(entity_type.product), entity_type.api_path)
    }

    /// `{base}/{apiPath}/{id}` with the ID percent-encoded.
    #[must_use]
    pub fn entity_url(&self, entity_type: &EntityType, id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(entity_type),
            urlencoding::encode(id)
        )
    }
}

impl EntityApi for HttpEntityApi {
    async fn list(&self, entity_type: &EntityType) -> Result<Vec<Entity>, Error> {
        let url = self.collection_url(entity_type);
        let mut all = Vec::new();

        for page in 0..MAX_PAGES {
            let params = [
                ("page", page.to_string()),
                ("size", self.page_size.to_string()),
            ];
            let Some(value) = self.client.get(&url, &params).await?.json::<Value>()? else {
                break;
            };

            match value {
                // Unpaged endpoints return everything at once
                Value::Array(items) => {
                    all.extend(into_entities(items, &url)?);
                    break;
                }
                Value::Object(mut page_object) => {
                    let Some(Value::Array(items)) = page_object.remove(constants::PAGE_CONTENT_FIELD)
                    else {
                        return Err(Error::unexpected_response(
                            HTTP_METHOD_GET,
                            &url,
                            "page object without a 'content' list",
                        ));
                    };
                    let count = items.len();
                    all.extend(into_entities(items, &url)?);
                    if count == 0 || is_last_page(&page_object, page, count, self.page_size) {
                        break;
                    }
                }
                _ => {
                    return Err(Error::unexpected_response(
                        HTTP_METHOD_GET,
                        &url,
                        "expected a list of entities",
                    ))
                }
            }
        }

        debug!(entity_type = %entity_type, count = all.len(), "entities listed");
        Ok(all)
    }

    async fn create(
        &self,
        entity_type: &EntityType,
        entity: &Entity,
    ) -> Result<Option<Entity>, Error> {
        let url = self.collection_url(entity_type);
        let response = self
            .client
            .post(&url, &Value::Object(entity.clone()), &[])
            .await?;
        returned_entity(response.json::<Value>()?, HTTP_METHOD_POST, &url)
    }

    async fn update(
        &self,
        entity_type: &EntityType,
        id: &str,
        entity: &Entity,
    ) -> Result<Option<Entity>, Error> {
        let url = self.entity_url(entity_type, id);
        let response = self
            .client
            .put(&url, &Value::Object(entity.clone()), &[])
            .await?;
        returned_entity(response.json::<Value>()?, HTTP_METHOD_PUT, &url)
    }
}

fn is_last_page(page_object: &Entity, page: u32, count: usize, page_size: u32) -> bool {
    if let Some(last) = page_object.get("last").and_then(Value::as_bool) {
        return last;
    }
    if let Some(total) = page_object.get("totalPages").and_then(Value::as_u64) {
        return u64::from(page) + 1 >= total;
    }
    count < page_size as usize
}

fn into_entities(items: Vec<Value>, url: &str) -> Result<Vec<Entity>, Error> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(entity) => Ok(entity),
            _ => Err(Error::unexpected_response(
                HTTP_METHOD_GET,
                url,
                "list contains a non-object element",
            )),
        })
        .collect()
}

fn returned_entity(value: Option<Value>, method: &str, url: &str) -> Result<Option<Entity>, Error> {
    match value {
        None => Ok(None),
        Some(Value::Object(entity)) => Ok(Some(entity)),
        // Some endpoints answer a create with the bare new ID
        Some(id @ (Value::String(_) | Value::Number(_))) => {
            let mut entity = Entity::new();
            entity.insert(constants::FIELD_ID.to_string(), id);
            Ok(Some(entity))
        }
        Some(_) => Err(Error::unexpected_response(method, url, "expected an entity")),
    }
}
