//! Error types for pinkit operations.

/// Comprehensive error type for pin composition and orchestration.
#[derive(Debug, thiserror::Error)]
pub enum PinkitError {
    /// No signer is bound to the session.
    #[error("wallet is not connected")]
    NotConnected,

    /// Malformed record, address or output value.
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        /// Field or parameter name.
        field: String,
        /// Reason for invalidity.
        reason: String,
    },

    /// No spendable funding output could be resolved for the address.
    #[error("no funding output available for {address}")]
    NoFundingAvailable {
        /// The owner address that was queried.
        address: String,
    },

    /// The assist service reported an error.
    #[error("assist service error: {message}")]
    AssistService {
        /// Service-reported message.
        message: String,
    },

    /// A broadcaster reported a transaction id that does not match the
    /// id computed from the signed bytes.
    #[error("broadcast returned txid {reported}, expected {computed}")]
    BroadcastMismatch {
        /// Locally computed transaction id.
        computed: String,
        /// Id reported by the broadcaster.
        reported: String,
    },

    /// Transport failure on a collaborator call.
    #[error("{operation} failed: {reason}")]
    Network {
        /// Operation that failed (e.g. "fetch raw transaction").
        operation: String,
        /// Underlying error message.
        reason: String,
    },

    /// Feature not compiled in.
    #[error("{0} is not available - enable the 'http-executor' feature")]
    Unimplemented(&'static str),
}

impl PinkitError {
    /// Create an invalid input error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a network error for a named operation.
    pub fn network(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create an assist service error from a service-reported message.
    pub fn assist(message: impl Into<String>) -> Self {
        Self::AssistService {
            message: message.into(),
        }
    }

    /// Returns true if this error is potentially recoverable by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::NoFundingAvailable { .. })
    }
}

/// Common result alias for pinkit operations.
pub type Result<T> = std::result::Result<T, PinkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = PinkitError::invalid_input("path", "must start with '/'");
        assert_eq!(err.to_string(), "invalid path: must start with '/'");

        let err = PinkitError::BroadcastMismatch {
            computed: "aa".into(),
            reported: "bb".into(),
        };
        assert!(err.to_string().contains("aa"));
        assert!(err.to_string().contains("bb"));
    }

    #[test]
    fn retryable_classification() {
        assert!(PinkitError::network("broadcast", "timeout").is_retryable());
        assert!(!PinkitError::NotConnected.is_retryable());
        assert!(!PinkitError::assist("order expired").is_retryable());
    }
}
