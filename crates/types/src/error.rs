//! Error types for the result registry using snafu.
//!
//! Defines the unified taxonomy shared by the SDK and the server:
//! - Caller errors (`MalformedArguments`)
//! - Ledger errors (`LedgerUnavailable`, `LedgerRejected`, `SignerError`)
//! - Mirror errors (`StoreUnavailable`)
//! - Read misses (`NotFound`)
//!
//! Each variant maps to an [`ErrorKind`] with a stable machine-readable name
//! and a retryability classification.

use snafu::Snafu;

/// Unified result type for registry operations.
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

/// Machine-readable error kinds for programmatic handling.
///
/// Kinds are stable across releases; the HTTP layer maps each kind to a
/// status code and transmits the name in error payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required argument is missing or of the wrong shape.
    MalformedArguments,
    /// The ledger RPC endpoint is unreachable, timed out, or returned a
    /// malformed response.
    LedgerUnavailable,
    /// The call was delivered but the registry contract aborted it
    /// (duplicate key, missing record, missing capability, stale clock).
    LedgerRejected,
    /// The signing capability is invalid or unusable.
    SignerError,
    /// The mirror's storage engine is unreachable.
    StoreUnavailable,
    /// No data satisfies the read.
    NotFound,
}

impl ErrorKind {
    /// Returns the stable string name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedArguments => "malformed_arguments",
            Self::LedgerUnavailable => "ledger_unavailable",
            Self::LedgerRejected => "ledger_rejected",
            Self::SignerError => "signer_error",
            Self::StoreUnavailable => "store_unavailable",
            Self::NotFound => "not_found",
        }
    }
}

/// Unified error type for the registry client and server.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RegistryError {
    /// A required argument is missing or malformed. Caller error; never
    /// produced by the ledger or the mirror.
    #[snafu(display("malformed arguments: {message}"))]
    MalformedArguments {
        /// Description of the violated constraint.
        message: String,
    },

    /// The ledger could not be reached or did not answer in time.
    #[snafu(display("ledger unavailable: {message}"))]
    LedgerUnavailable {
        /// Transport-level failure description.
        message: String,
    },

    /// The registry contract refused the call. Permanent for the given call.
    #[snafu(display("ledger rejected call: {message}"))]
    LedgerRejected {
        /// Abort reason reported by the contract.
        message: String,
    },

    /// The signing capability failed to produce a usable signature.
    #[snafu(display("signer error: {message}"))]
    SignerError {
        /// Key or signing failure description.
        message: String,
    },

    /// The mirror's document store is unreachable.
    #[snafu(display("mirror store unavailable: {message}"))]
    StoreUnavailable {
        /// Storage engine failure description.
        message: String,
    },

    /// No record satisfies the requested read.
    #[snafu(display("not found: {message}"))]
    NotFound {
        /// What was looked up.
        message: String,
    },
}

impl RegistryError {
    /// Returns the stable kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedArguments { .. } => ErrorKind::MalformedArguments,
            Self::LedgerUnavailable { .. } => ErrorKind::LedgerUnavailable,
            Self::LedgerRejected { .. } => ErrorKind::LedgerRejected,
            Self::SignerError { .. } => ErrorKind::SignerError,
            Self::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            Self::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    /// Returns true if the error is transient and a side-effect-free
    /// operation may be retried.
    ///
    /// Retryable: `LedgerUnavailable`, `StoreUnavailable`. State-changing
    /// calls are never retried automatically regardless of this
    /// classification, since retrying without confirmation of the original
    /// submission's fate risks a duplicate effect.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::LedgerUnavailable { .. } | Self::StoreUnavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable_per_variant() {
        let err = RegistryError::LedgerRejected { message: "duplicate key".to_owned() };
        assert_eq!(err.kind(), ErrorKind::LedgerRejected);
        assert_eq!(err.kind().as_str(), "ledger_rejected");
    }

    #[test]
    fn transient_errors_are_retryable() {
        let err = RegistryError::LedgerUnavailable { message: "connection refused".to_owned() };
        assert!(err.is_retryable());

        let err = RegistryError::StoreUnavailable { message: "engine down".to_owned() };
        assert!(err.is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        let rejected = RegistryError::LedgerRejected { message: "stale clock".to_owned() };
        assert!(!rejected.is_retryable());

        let malformed = RegistryError::MalformedArguments { message: "empty studentId".to_owned() };
        assert!(!malformed.is_retryable());

        let signer = RegistryError::SignerError { message: "bad key".to_owned() };
        assert!(!signer.is_retryable());

        let missing = RegistryError::NotFound { message: "no record".to_owned() };
        assert!(!missing.is_retryable());
    }

    #[test]
    fn display_carries_the_message() {
        let err = RegistryError::NotFound { message: "S100/CS201/Fall2024".to_owned() };
        assert_eq!(err.to_string(), "not found: S100/CS201/Fall2024");
    }
}
