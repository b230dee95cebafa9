use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("{kind}: {message}")]
    Internal {
        kind: ErrorKind,
        message: Cow<'static, str>,
        context: Option<ErrorContext>,
    },
}

/// Classification of domain errors carried by [`Error::Internal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    UnknownEntityType,
    MissingIdMapping,
    UnresolvedNameReference,
    TemplateSyntax,
    DataInconsistency,
    HttpRequest,
    Project,
    Configuration,
    Validation,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownEntityType => "UnknownEntityType",
            Self::MissingIdMapping => "MissingIdMapping",
            Self::UnresolvedNameReference => "UnresolvedNameReference",
            Self::TemplateSyntax => "TemplateSyntax",
            Self::DataInconsistency => "DataInconsistency",
            Self::HttpRequest => "HttpRequest",
            Self::Project => "Project",
            Self::Configuration => "Configuration",
            Self::Validation => "Validation",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured context attached to domain errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Machine-readable details (file, field, status, ...)
    pub details: Option<Value>,
    /// Hint shown to the operator
    pub suggestion: Option<Cow<'static, str>>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(details: Option<Value>, suggestion: Option<Cow<'static, str>>) -> Self {
        Self {
            details,
            suggestion,
        }
    }

    #[must_use]
    pub const fn with_details(details: Value) -> Self {
        Self {
            details: Some(details),
            suggestion: None,
        }
    }
}

/// JSON representation of an error for structured output
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    pub error_type: String,
    pub message: String,
    pub context: Option<String>,
    pub details: Option<Value>,
}

impl Error {
    #[must_use]
    pub fn new(
        kind: ErrorKind,
        message: impl Into<Cow<'static, str>>,
        context: Option<ErrorContext>,
    ) -> Self {
        Self::Internal {
            kind,
            message: message.into(),
            context,
        }
    }

    #[must_use]
    pub fn unknown_entity_type(product: &str, wire_type: &str) -> Self {
        Self::new(
            ErrorKind::UnknownEntityType,
            format!("No entity type '{wire_type}' is registered for product '{product}'"),
            Some(ErrorContext::with_details(json!({
                "product": product,
                "wire_type": wire_type,
            }))),
        )
    }

    /// A foreign-key value with no known name at export time.
    #[must_use]
    pub fn missing_id_mapping(entity: &str, field: &str, value: &str) -> Self {
        Self::new(
            ErrorKind::MissingIdMapping,
            format!("No name is known for {field} '{value}' referenced by {entity}"),
            Some(ErrorContext::new(
                Some(json!({ "entity": entity, "field": field, "value": value })),
                Some(Cow::Borrowed(
                    "Export the product that owns this entity in the same run, or fix the reference.",
                )),
            )),
        )
    }

    #[must_use]
    pub fn unresolved_name_reference(
        source: &str,
        entity: &str,
        name: &str,
        similar: &[String],
    ) -> Self {
        let suggestion = if similar.is_empty() {
            Cow::Borrowed("Deploy the referenced entity first, or select its product for this run.")
        } else {
            let names = similar
                .iter()
                .map(|s| format!("'{s}'"))
                .collect::<Vec<_>>()
                .join(", ");
            Cow::Owned(format!("Did you mean {names}?"))
        };
        Self::new(
            ErrorKind::UnresolvedNameReference,
            format!("{source}: {entity} references unknown name '{name}'"),
            Some(ErrorContext::new(
                Some(json!({ "file": source, "entity": entity, "name": name })),
                Some(suggestion),
            )),
        )
    }

    #[must_use]
    pub fn template_syntax(source: &str, path: &str, detail: &str) -> Self {
        Self::new(
            ErrorKind::TemplateSyntax,
            format!("{source}: malformed reference at {path}: {detail}"),
            Some(ErrorContext::new(
                Some(json!({ "file": source, "path": path, "detail": detail })),
                Some(Cow::Borrowed(
                    "References must look like {{ fromName('entity name') }}.",
                )),
            )),
        )
    }

    #[must_use]
    pub fn data_inconsistency(entity_type: &str, field: &str, value: &str) -> Self {
        Self::new(
            ErrorKind::DataInconsistency,
            format!("Duplicate {field} '{value}' in {entity_type}"),
            Some(ErrorContext::with_details(json!({
                "entity_type": entity_type,
                "field": field,
                "value": value,
            }))),
        )
    }

    #[must_use]
    pub fn http_request(method: &str, url: &str, status: u16, errors: Vec<String>) -> Self {
        let summary = if errors.is_empty() {
            String::new()
        } else {
            format!(": {}", errors.join("; "))
        };
        let suggestion = match status {
            404 => Some(Cow::Borrowed(crate::constants::ERR_ENDPOINT_NOT_FOUND)),
            409 => Some(Cow::Borrowed(crate::constants::ERR_CONFLICT)),
            500..=599 => Some(Cow::Borrowed(crate::constants::ERR_SERVER_ERROR)),
            _ => None,
        };
        Self::new(
            ErrorKind::HttpRequest,
            format!("{method} {url} failed with status {status}{summary}"),
            Some(ErrorContext::new(
                Some(json!({
                    "method": method,
                    "url": url,
                    "status": status,
                    "errors": errors,
                })),
                suggestion,
            )),
        )
    }

    /// A 2xx response whose body does not have the expected shape.
    #[must_use]
    pub fn unexpected_response(method: &str, url: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::HttpRequest,
            format!("{method} {url} returned an unexpected response: {detail}"),
            Some(ErrorContext::with_details(json!({ "method": method, "url": url }))),
        )
    }

    #[must_use]
    pub fn invalid_project_file(path: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::Project,
            format!("Invalid entity file '{path}': {reason}"),
            Some(ErrorContext::with_details(json!({ "file": path }))),
        )
    }

    #[must_use]
    pub fn project_not_found(path: &str) -> Self {
        Self::new(
            ErrorKind::Project,
            format!("No project found at '{path}'"),
            Some(ErrorContext::new(
                Some(json!({ "project": path })),
                Some(Cow::Borrowed("Run 'pdp init' to create a project here.")),
            )),
        )
    }

    #[must_use]
    pub fn project_exists(path: &str) -> Self {
        Self::new(
            ErrorKind::Project,
            format!("A project already exists at '{path}'"),
            Some(ErrorContext::new(
                None,
                Some(Cow::Borrowed("Use --force to overwrite it.")),
            )),
        )
    }

    #[must_use]
    pub fn invalid_config(message: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::Configuration,
            format!("Invalid configuration: {message}"),
            None,
        )
    }

    #[must_use]
    pub fn unknown_setting_key(key: &str) -> Self {
        Self::new(
            ErrorKind::Configuration,
            format!("Unknown setting '{key}'"),
            Some(ErrorContext::new(
                None,
                Some(Cow::Borrowed("Run 'pdp config list' to see available settings.")),
            )),
        )
    }

    #[must_use]
    pub fn invalid_setting_value(key: impl fmt::Display, value: &str, expected: &str) -> Self {
        Self::new(
            ErrorKind::Configuration,
            format!("Invalid value '{value}' for '{key}': expected {expected}"),
            None,
        )
    }

    #[must_use]
    pub fn setting_value_out_of_range(key: impl fmt::Display, value: &str, range: &str) -> Self {
        Self::new(
            ErrorKind::Configuration,
            format!("Value '{value}' for '{key}' is out of range ({range})"),
            None,
        )
    }

    #[must_use]
    pub fn validation_error(message: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::Validation,
            format!("Validation error: {message}"),
            None,
        )
    }

    #[must_use]
    pub fn dependency_cycle(kinds: &[String]) -> Self {
        Self::new(
            ErrorKind::Internal,
            format!(
                "Entity type references form a cycle: {}",
                kinds.join(" → ")
            ),
            None,
        )
    }

    /// Returns the domain error kind, if this is a domain error.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Internal { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns the HTTP status of a failed request, if any.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Internal {
                kind: ErrorKind::HttpRequest,
                context: Some(ctx),
                ..
            } => ctx
                .details
                .as_ref()
                .and_then(|d| d.get("status"))
                .and_then(Value::as_u64)
                .and_then(|s| u16::try_from(s).ok()),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Add context to an error for better user messaging
    #[must_use]
    pub fn with_context(self, context: &str) -> Self {
        match self {
            Self::Network(e) => Self::new(
                ErrorKind::HttpRequest,
                format!("{context}: {e}"),
                None,
            ),
            Self::Io(e) => Self::new(ErrorKind::Project, format!("{context}: {e}"), None),
            _ => self,
        }
    }

    /// Convert error to JSON representation for structured output
    #[must_use]
    pub fn to_json(&self) -> JsonError {
        let (error_type, message, context, details) = match self {
            Self::Internal {
                kind,
                message,
                context,
            } => (
                kind.as_str(),
                message.to_string(),
                context
                    .as_ref()
                    .and_then(|c| c.suggestion.as_ref())
                    .map(ToString::to_string),
                context.as_ref().and_then(|c| c.details.clone()),
            ),
            Self::Io(io_err) => {
                let context = match io_err.kind() {
                    std::io::ErrorKind::NotFound => Some(crate::constants::ERR_FILE_NOT_FOUND),
                    std::io::ErrorKind::PermissionDenied => Some(crate::constants::ERR_PERMISSION),
                    _ => None,
                };
                (
                    "FileSystem",
                    io_err.to_string(),
                    context.map(str::to_string),
                    None,
                )
            }
            Self::Network(req_err) => {
                let context = if req_err.is_connect() {
                    Some(crate::constants::ERR_CONNECTION)
                } else if req_err.is_timeout() {
                    Some(crate::constants::ERR_TIMEOUT)
                } else {
                    None
                };
                (
                    "Network",
                    req_err.to_string(),
                    context.map(str::to_string),
                    None,
                )
            }
            Self::Json(json_err) => (
                "JSONParsing",
                json_err.to_string(),
                Some(crate::constants::ERR_JSON_SYNTAX.to_string()),
                None,
            ),
            Self::Toml(toml_err) => (
                "TOMLParsing",
                toml_err.to_string(),
                Some(crate::constants::ERR_TOML_SYNTAX.to_string()),
                None,
            ),
            Self::TomlSer(toml_err) => ("TOMLSerialization", toml_err.to_string(), None, None),
        };

        JsonError {
            error_type: error_type.to_string(),
            message,
            context,
            details,
        }
    }
}
