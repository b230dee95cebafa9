//! Centralized string constants for the pdp CLI
//!
//! This module contains commonly used string literals to:
//! - Reduce string duplication
//! - Keep on-disk and wire formats in one place

// Entity fields
pub const FIELD_ID: &str = "id";
pub const FIELD_NAME: &str = "name";

/// Fields the platform manages itself; stripped on export.
pub const VOLATILE_FIELDS: &[&str] = &["creationTimestamp", "lastUpdatedTimestamp"];

// Reference tokens
pub const TOKEN_OPEN: &str = "{{";
pub const TOKEN_CLOSE: &str = "}}";
pub const TOKEN_FUNCTION: &str = "fromName";

// Project layout
pub const PROJECT_CONFIG_FILE: &str = "pdp.toml";
pub const DEFAULT_PROJECT_DIR: &str = ".";

// Environment Variables
pub const ENV_PDP_PROJECT: &str = "PDP_PROJECT";
pub const ENV_PDP_LOG: &str = "PDP_LOG";
pub const ENV_PDP_LOG_FORMAT: &str = "PDP_LOG_FORMAT";
pub const ENV_PDP_LOG_FILE: &str = "PDP_LOG_FILE";
pub const ENV_PDP_LOG_MAX_BODY: &str = "PDP_LOG_MAX_BODY";

// Default product endpoints
pub const DEFAULT_INGESTION_URL: &str = "http://localhost:8080";
pub const DEFAULT_DISCOVERY_URL: &str = "http://localhost:8088";
pub const DEFAULT_CORE_URL: &str = "http://localhost:8081";
pub const DEFAULT_STAGING_URL: &str = "http://localhost:8081";

// HTTP
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const HTTP_METHOD_GET: &str = "GET";
pub const HTTP_METHOD_POST: &str = "POST";
pub const HTTP_METHOD_PUT: &str = "PUT";
pub const PAGE_CONTENT_FIELD: &str = "content";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

// Common Response Messages
pub const EMPTY_RESPONSE: &str = "(empty response)";

// Error Context Messages
pub const ERR_ENDPOINT_NOT_FOUND: &str = "Check that the product URL and entity ID are correct.";
pub const ERR_CONFLICT: &str = "An entity with the same name may already exist on the server.";
pub const ERR_SERVER_ERROR: &str = "The API server is experiencing issues. Try again later.";
pub const ERR_CONNECTION: &str = "Check that the API server is running and accessible.";
pub const ERR_TIMEOUT: &str = "The API server may be slow or unresponsive. Try again later.";
pub const ERR_FILE_NOT_FOUND: &str = "Check that the file path is correct and the file exists.";
pub const ERR_PERMISSION: &str = "Check file permissions or run with appropriate privileges.";
pub const ERR_JSON_SYNTAX: &str = "Check that the entity file contains valid JSON.";
pub const ERR_TOML_SYNTAX: &str = "Check that pdp.toml is valid TOML syntax.";
