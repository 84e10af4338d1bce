//! Error types for the MFKDF core
//!
//! Unified error type for the setup/derive pipeline. Errors that could leak
//! information about which cryptographic primitive failed carry a uniform
//! message; callers that need the detail for logging can still match on the
//! variant.

use thiserror::Error;

/// Result type alias for MFKDF operations
pub type Result<T> = std::result::Result<T, MfkdfError>;

/// Unified error type for all MFKDF operations
#[derive(Debug, Error)]
pub enum MfkdfError {
    /// Policy failed schema validation or is structurally inconsistent
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    /// A supplied option was out of range or malformed
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Fewer than `threshold` valid factor materials were supplied
    #[error("insufficient shares: need {threshold}, have {supplied}")]
    InsufficientShares {
        /// Required threshold
        threshold: usize,
        /// Number of non-null shares actually supplied
        supplied: usize,
    },

    /// The supplied factor's type does not match the policy slot's type
    #[error("factor type mismatch for id {id}: expected {expected}, got {actual}")]
    FactorTypeMismatch {
        /// Factor id at which the mismatch occurred
        id: String,
        /// Type recorded in the policy
        expected: String,
        /// Type supplied by the caller
        actual: String,
    },

    /// The underlying KDF primitive failed
    #[error("key derivation failed")]
    KdfFailure,

    /// Cooperative cancellation was observed between factor iterations
    #[error("operation cancelled")]
    Cancelled,
}

impl MfkdfError {
    /// Returns true if this error could leak information about a failed
    /// cryptographic primitive and should be logged with minimal detail.
    pub fn is_security_sensitive(&self) -> bool {
        matches!(self, Self::KdfFailure)
    }

    /// A safe message suitable for surfacing to a caller that should not
    /// see primitive-level detail.
    pub fn safe_message(&self) -> &'static str {
        match self {
            Self::InvalidPolicy(_) => "invalid policy",
            Self::InvalidArgument(_) => "invalid argument",
            Self::InsufficientShares { .. } => "insufficient shares",
            Self::FactorTypeMismatch { .. } => "factor type mismatch",
            Self::KdfFailure => "operation failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<serde_json::Error> for MfkdfError {
    fn from(e: serde_json::Error) -> Self {
        MfkdfError::InvalidPolicy(e.to_string())
    }
}

impl From<base64::DecodeError> for MfkdfError {
    fn from(e: base64::DecodeError) -> Self {
        MfkdfError::InvalidPolicy(format!("bad base64: {e}"))
    }
}

impl From<argon2::Error> for MfkdfError {
    fn from(_: argon2::Error) -> Self {
        MfkdfError::KdfFailure
    }
}

impl From<scrypt::errors::InvalidParams> for MfkdfError {
    fn from(_: scrypt::errors::InvalidParams) -> Self {
        MfkdfError::KdfFailure
    }
}

impl From<scrypt::errors::InvalidOutputLen> for MfkdfError {
    fn from(_: scrypt::errors::InvalidOutputLen) -> Self {
        MfkdfError::KdfFailure
    }
}

impl From<bcrypt::BcryptError> for MfkdfError {
    fn from(_: bcrypt::BcryptError) -> Self {
        MfkdfError::KdfFailure
    }
}
