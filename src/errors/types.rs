//! # Error Types
//!
//! Error types for the secret mirror using `thiserror`.

/// Custom result type for secret mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Main error type for the secret mirror
#[derive(thiserror::Error, Debug)]
pub enum MirrorError {
    /// Invalid construction arguments or configuration sources
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Listing or fetching from the remote store failed
    #[error("Secret store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A secret disappeared between listing and fetching
    #[error("Secret not found: {id}")]
    NotFound { id: String },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl MirrorError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store { message: message.into(), source: None }
    }

    /// Create a store error wrapping the client's own error
    pub fn store_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Store { message: message.into(), source: Some(source) }
    }

    /// Create a not found error
    pub fn not_found<I: Into<String>>(id: I) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Whether a later refresh cycle may succeed where this one failed
    pub fn is_transient(&self) -> bool {
        matches!(self, MirrorError::Store { .. } | MirrorError::NotFound { .. })
    }
}

impl From<config::ConfigError> for MirrorError {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for MirrorError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_validation_messages("", &errors, &mut messages);
        Self::config(format!("Validation failed: {}", messages.join("; ")))
    }
}

/// Flatten nested validation errors into `path: message` entries
fn collect_validation_messages(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<String>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path =
            if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                out.push(format!("{}: {}", path, error_messages.join(", ")));
            }
            ValidationErrorsKind::Struct(nested) => collect_validation_messages(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_messages(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}
