use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured join-core error with a stable classification.
/// Every error is fatal for the call that produced it: no partial output
/// written before the failure may be treated as valid.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct an integrity violation for a specific origin.
    pub(crate) fn integrity(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Integrity, origin, message)
    }

    /// Construct a capacity violation for a specific origin.
    pub(crate) fn capacity(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Capacity, origin, message)
    }

    /// Construct a checked-precondition failure for a specific origin.
    pub(crate) fn precondition(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Precondition, origin, message)
    }

    /// Construct a corruption error for a specific origin.
    pub(crate) fn corruption(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, origin, message)
    }

    /// Construct a codec-origin unsupported error.
    pub(crate) fn codec_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Codec, message)
    }

    /// Construct a serialize-origin internal error.
    pub(crate) fn serialize_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Serialize, message)
    }

    /// Construct a serialize-origin corruption error.
    pub(crate) fn serialize_corruption(message: impl Into<String>) -> Self {
        Self::corruption(ErrorOrigin::Serialize, message)
    }

    /// Construct a config-origin precondition failure.
    pub(crate) fn config_invalid(message: impl Into<String>) -> Self {
        Self::precondition(ErrorOrigin::Config, message)
    }

    /// Re-home an error under a different origin, keeping class and message.
    #[must_use]
    pub(crate) fn with_origin(mut self, origin: ErrorOrigin) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub const fn is_integrity(&self) -> bool {
        matches!(self.class, ErrorClass::Integrity)
    }

    #[must_use]
    pub const fn is_capacity(&self) -> bool {
        matches!(self.class, ErrorClass::Capacity)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Capacity,
    Corruption,
    Integrity,
    Internal,
    Precondition,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Capacity => "capacity",
            Self::Corruption => "corruption",
            Self::Integrity => "integrity",
            Self::Internal => "internal",
            Self::Precondition => "precondition",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Boundary,
    Codec,
    Config,
    Merge,
    Orchestrate,
    Preprocess,
    Serialize,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Boundary => "boundary",
            Self::Codec => "codec",
            Self::Config => "config",
            Self::Merge => "merge",
            Self::Orchestrate => "orchestrate",
            Self::Preprocess => "preprocess",
            Self::Serialize => "serialize",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
