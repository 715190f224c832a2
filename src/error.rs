//! Error types for dependency injection

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error type returned by teardown hooks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during dependency injection operations
#[derive(Error, Debug, Clone)]
pub enum DiError {
    /// Invalid registration (lifecycle/provider mismatch, missing target)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A token alias chain loops back on itself
    #[error("Token registration cycle detected! {}", .chain.join(" -> "))]
    RegistrationCycle { chain: Vec<String> },

    /// Plain named token with no registration anywhere in the container chain
    #[error("Attempted to resolve unregistered dependency token: \"{token}\"")]
    UnresolvedToken { token: String },

    /// Constructor takes arguments but no parameter descriptors were supplied
    #[error("TypeInfo not known for \"{class}\"")]
    MissingTypeInfo { class: &'static str },

    /// Resolving one constructor parameter failed
    #[error("{}", format_parameter_error(class, *index, source))]
    ParameterResolution {
        class: &'static str,
        index: usize,
        source: Box<DiError>,
    },

    /// Any operation on a container after `dispose()`
    #[error("This container has been disposed, you cannot interact with a disposed container")]
    DisposedContainer,

    /// Resolved value is not of the requested type
    #[error("Type mismatch for \"{token}\": expected {expected}")]
    TypeMismatch {
        token: String,
        expected: &'static str,
    },

    /// Constructor or factory failed to create the service
    #[error("Failed to create service {type_name}: {reason}")]
    CreationFailed {
        type_name: &'static str,
        reason: String,
    },

    /// One or more teardown hooks failed during disposal
    #[error("{} disposable(s) failed to tear down: {}", .failures.len(), DisplayFailures(.failures))]
    Disposal {
        failures: Vec<Arc<dyn std::error::Error + Send + Sync>>,
    },
}

impl DiError {
    /// Create a Configuration error
    #[inline]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Create a CreationFailed error for a type
    #[inline]
    pub fn creation_failed<T: 'static>(reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// Create a TypeMismatch error
    #[inline]
    pub fn type_mismatch<T: 'static>(token: impl fmt::Display) -> Self {
        Self::TypeMismatch {
            token: token.to_string(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// Wrap a failure raised while resolving parameter `index` of `class`
    #[inline]
    pub fn parameter(class: &'static str, index: usize, source: DiError) -> Self {
        Self::ParameterResolution {
            class,
            index,
            source: Box::new(source),
        }
    }

    /// Innermost error, unwrapping every parameter-resolution layer
    pub fn root_cause(&self) -> &DiError {
        match self {
            Self::ParameterResolution { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn format_parameter_error(class: &str, index: usize, source: &DiError) -> String {
    let mut message = format!(
        "Cannot inject the dependency at position #{index} of \"{class}\" constructor. Reason:"
    );
    for line in source.to_string().lines() {
        message.push_str("\n    ");
        message.push_str(line);
    }
    message
}

struct DisplayFailures<'a>(&'a [Arc<dyn std::error::Error + Send + Sync>]);

impl fmt::Display for DisplayFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// Result type alias for DI operations
pub type Result<T> = std::result::Result<T, DiError>;
