//! Static catalog of the entity types the platform exposes.
//!
//! The table below is the single source of truth for which product owns a
//! type, where it lives in a project, which field other entities use to point
//! at it, and which types it may point at in turn.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// A product of the platform, each with its own admin API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Ingestion,
    Discovery,
    Core,
    Staging,
}

impl Product {
    pub const ALL: &'static [Self] = &[Self::Ingestion, Self::Discovery, Self::Core, Self::Staging];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ingestion => "ingestion",
            Self::Discovery => "discovery",
            Self::Core => "core",
            Self::Staging => "staging",
        }
    }

    /// Name of the product's directory inside a project.
    #[must_use]
    pub const fn title_case(&self) -> &'static str {
        match self {
            Self::Ingestion => "Ingestion",
            Self::Discovery => "Discovery",
            Self::Core => "Core",
            Self::Staging => "Staging",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Product {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_config(format!("unknown product '{s}'")))
    }
}

/// Registry key of an entity type. Wire type names are not unique across
/// products (both ingestion and discovery have a `processor`), so lookups
/// that need a single key use this instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Credential,
    IngestionProcessor,
    Pipeline,
    Seed,
    Scheduler,
    DiscoveryProcessor,
    Endpoint,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::IngestionProcessor => "ingestion processor",
            Self::Pipeline => "pipeline",
            Self::Seed => "seed",
            Self::Scheduler => "scheduler",
            Self::DiscoveryProcessor => "discovery processor",
            Self::Endpoint => "endpoint",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable descriptor of one entity type.
#[derive(Debug, PartialEq, Eq)]
pub struct EntityType {
    pub kind: EntityKind,
    pub product: Product,
    /// Type name used by the remote API
    pub wire_type: &'static str,
    /// File holding this type's entities inside the product directory
    pub file_name: &'static str,
    /// Set only where the API does not follow the `{wireType}Id` convention
    reference_field_override: Option<&'static str>,
    /// Types this one may reference
    pub references: &'static [EntityKind],
    /// REST collection path relative to the product base URL
    pub api_path: &'static str,
}

impl EntityType {
    /// Field name other entities use to point at this type.
    #[must_use]
    pub fn reference_field(&self) -> Cow<'static, str> {
        self.reference_field_override.map_or_else(
            || Cow::Owned(format!("{}Id", self.wire_type)),
            Cow::Borrowed,
        )
    }

    /// `<ProductTitleCase>/<fileName>`, relative to the project root.
    #[must_use]
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.product.title_case(), self.file_name)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())
    }
}

// Listed so that every type comes after everything it references.
static ENTITY_TYPES: [EntityType; 7] = [
    EntityType {
        kind: EntityKind::Credential,
        product: Product::Core,
        wire_type: "credential",
        file_name: "credentials.json",
        reference_field_override: None,
        references: &[],
        api_path: "v1/credential",
    },
    EntityType {
        kind: EntityKind::IngestionProcessor,
        product: Product::Ingestion,
        wire_type: "processor",
        file_name: "processors.json",
        reference_field_override: None,
        references: &[EntityKind::Credential],
        api_path: "v1/processor",
    },
    EntityType {
        kind: EntityKind::Pipeline,
        product: Product::Ingestion,
        wire_type: "pipeline",
        file_name: "pipelines.json",
        reference_field_override: None,
        references: &[EntityKind::IngestionProcessor],
        api_path: "v1/pipeline",
    },
    EntityType {
        kind: EntityKind::Seed,
        product: Product::Ingestion,
        wire_type: "seed",
        file_name: "seeds.json",
        reference_field_override: None,
        references: &[EntityKind::Pipeline, EntityKind::Credential],
        api_path: "v1/seed",
    },
    EntityType {
        kind: EntityKind::Scheduler,
        product: Product::Ingestion,
        wire_type: "scheduler",
        file_name: "schedulers.json",
        reference_field_override: None,
        references: &[EntityKind::Seed],
        api_path: "v1/scheduler",
    },
    EntityType {
        kind: EntityKind::DiscoveryProcessor,
        product: Product::Discovery,
        wire_type: "processor",
        file_name: "processors.json",
        reference_field_override: Some("processors"),
        references: &[EntityKind::Credential],
        api_path: "v1/processor",
    },
    EntityType {
        kind: EntityKind::Endpoint,
        product: Product::Discovery,
        wire_type: "endpoint",
        file_name: "endpoints.json",
        reference_field_override: None,
        references: &[EntityKind::DiscoveryProcessor],
        api_path: "v1/endpoint",
    },
];

/// Every registered type, in table order.
#[must_use]
pub fn all_types() -> &'static [EntityType] {
    &ENTITY_TYPES
}

/// Every registered type in dependency order: each type appears after all the
/// types it references.
///
/// # Errors
///
/// Returns an error if the registry's references form a cycle.
pub fn all_types_in_dependency_order() -> Result<Vec<&'static EntityType>, Error> {
    crate::plan::plan_order(Product::ALL)
}

/// Returns the descriptor for `kind`.
#[must_use]
pub fn get(kind: EntityKind) -> &'static EntityType {
    ENTITY_TYPES
        .iter()
        .find(|t| t.kind == kind)
        .unwrap_or_else(|| unreachable!("every EntityKind has a registry entry"))
}

/// Looks up a type by product and wire type name.
///
/// # Errors
///
/// Returns `UnknownEntityType` if no such type is registered.
pub fn lookup(product: Product, wire_type: &str) -> Result<&'static EntityType, Error> {
    ENTITY_TYPES
        .iter()
        .find(|t| t.product == product && t.wire_type.eq_ignore_ascii_case(wire_type))
        .ok_or_else(|| Error::unknown_entity_type(product.as_str(), wire_type))
}

/// Types owned by `product`, in table order.
pub fn product_types(product: Product) -> impl Iterator<Item = &'static EntityType> {
    ENTITY_TYPES.iter().filter(move |t| t.product == product)
}

/// Kinds whose reference field is `field`.
#[must_use]
pub fn kinds_for_reference_field(field: &str) -> Vec<EntityKind> {
    ENTITY_TYPES
        .iter()
        .filter(|t| t.reference_field() == field)
        .map(|t| t.kind)
        .collect()
}

/// Whether `field` is the reference field of any registered type.
#[must_use]
pub fn is_reference_field(field: &str) -> bool {
    ENTITY_TYPES.iter().any(|t| t.reference_field() == field)
}
