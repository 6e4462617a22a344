//! Error types for the CloudFormation resource.
//!
//! No `anyhow` leakage. Explicit, typed errors.

/// The control plane signals throttling with either of these codes depending
/// on the API in question.
const RATE_LIMIT_CODES: [&str; 2] = ["RequestLimitExceeded", "Throttling"];

/// The exact message CloudFormation returns for an update that would change
/// nothing. It arrives as a `ValidationError`, so the message is the only
/// discriminator.
const NO_OP_UPDATE_MESSAGE: &str = "No updates are to be performed.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CfnError {
    /// The control plane answered with an error code and message.
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    /// The request never got a usable answer (connectivity, credentials, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The control plane answered, but the payload made no sense.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Changeset execution requires exactly one changeset on the stack.
    #[error("stack has {0} changesets, exactly one is required to execute")]
    ChangeSetCount(usize),

    /// Local input (resource configuration, parameter/tag files) was invalid.
    #[error("invalid input: {0}")]
    Input(String),
}

impl CfnError {
    /// Whether this error is a rate-limit signal that the retrier should
    /// absorb. Everything else passes through untouched.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            CfnError::Api { code, .. } => RATE_LIMIT_CODES.iter().any(|c| c == code),
            _ => false,
        }
    }

    /// Whether this is the "nothing to update" validation failure, which the
    /// dispatcher treats as a successful no-op rather than an error.
    pub fn is_no_op_update(&self) -> bool {
        matches!(
            self,
            CfnError::Api { code, message }
                if code == "ValidationError" && message == NO_OP_UPDATE_MESSAGE
        )
    }

    /// Best-effort guess at "the stack does not exist". Describe failures are
    /// conflated with non-existence either way; this only decides how loudly
    /// the resolver logs the failure.
    pub fn looks_not_found(&self) -> bool {
        matches!(
            self,
            CfnError::Api { code, message }
                if code == "ValidationError" && message.contains("does not exist")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: &str, message: &str) -> CfnError {
        CfnError::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    #[test]
    fn test_rate_limit_classification() {
        assert!(api("RequestLimitExceeded", "slow down").is_rate_limited());
        assert!(api("Throttling", "Rate exceeded").is_rate_limited());
        assert!(!api("ValidationError", "bad template").is_rate_limited());
        assert!(!CfnError::Transport("connection reset".into()).is_rate_limited());
    }

    #[test]
    fn test_no_op_update_classification() {
        assert!(api("ValidationError", "No updates are to be performed.").is_no_op_update());
        // Message must match exactly; code alone is not enough.
        assert!(!api("ValidationError", "No updates").is_no_op_update());
        assert!(!api("AccessDenied", "No updates are to be performed.").is_no_op_update());
    }

    #[test]
    fn test_not_found_classification() {
        assert!(api("ValidationError", "Stack with id foo does not exist").looks_not_found());
        assert!(!api("Throttling", "Rate exceeded").looks_not_found());
    }

    #[test]
    fn test_display() {
        let err = api("ValidationError", "Template format error");
        assert_eq!(err.to_string(), "ValidationError: Template format error");

        let err = CfnError::ChangeSetCount(2);
        assert!(err.to_string().contains("2 changesets"));
    }
}
