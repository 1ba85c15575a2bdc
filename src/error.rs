use thiserror::Error;

/// Structured error context for configuration and interceptor failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "retry.base_delay_ms")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected range, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "client_builder", "request_interceptor")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that escape the client as `Err`.
///
/// Expected request failures (4xx, 5xx, transport, cancellation) are never reported here;
/// they come back as [`crate::ApiResult::Failure`]. This type covers programmer errors
/// (bad configuration, failing interceptors), offline-queue rejections and session
/// provider failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Interceptor error: {message}{}", format_context(.context))]
    Interceptor {
        message: String,
        context: ErrorContext,
    },

    #[error("Queue is full (max {capacity}). Request rejected.")]
    QueueFull { capacity: usize },

    #[error("Queue cleared")]
    QueueCleared,

    #[error("Auth provider error: {0}")]
    Auth(String),

    /// A request failure lifted into `Err` by convenience helpers that return plain values.
    #[error("Request failed: {0}")]
    Api(crate::types::ApiError),

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create an interceptor error; `source` names the failing interceptor
    pub fn interceptor(msg: impl Into<String>, source: impl Into<String>) -> Self {
        Error::Interceptor {
            message: msg.into(),
            context: ErrorContext::new().with_source(source),
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Interceptor { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// True for the two offline-queue rejections.
    pub fn is_queue_rejection(&self) -> bool {
        matches!(self, Error::QueueFull { .. } | Error::QueueCleared)
    }
}
