//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Classified provider failure, kept as the wrapped cause of gateway errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Resource was not found
    #[error("Resource not found ({code}): {message}")]
    NotFound { code: String, message: String },

    /// Resource already exists
    #[error("Resource already exists ({code}): {message}")]
    AlreadyExists { code: String, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {message}")]
    Throttled { message: String },

    /// Resource has dependent objects (e.g., SG with attached ENI)
    #[error("Resource has dependent objects: {message}")]
    DependencyViolation { message: String },

    /// Request was rejected because of a bad argument
    #[error("Invalid parameter ({code}): {message}")]
    InvalidParameter { code: String, message: String },

    /// Credentials missing, expired or rejected
    #[error("Not authorized ({code}): {message}")]
    Unauthorized { code: String, message: String },

    /// Request never got a response (dispatch failure, timeout)
    #[error("Request did not complete: {message}")]
    Transport { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl ProviderError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }

    /// Check if this error is transient.
    ///
    /// Throttling and transport failures look the same from the caller's side
    /// and are treated identically.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Throttled { .. } | ProviderError::Transport { .. }
        )
    }

    /// The AWS error code, if the provider sent one
    pub fn code(&self) -> Option<&str> {
        match self {
            ProviderError::NotFound { code, .. }
            | ProviderError::AlreadyExists { code, .. }
            | ProviderError::InvalidParameter { code, .. }
            | ProviderError::Unauthorized { code, .. } => Some(code),
            ProviderError::Throttled { .. } => Some("Throttling"),
            ProviderError::DependencyViolation { .. } => Some("DependencyViolation"),
            ProviderError::Transport { .. } => None,
            ProviderError::Sdk { code, .. } => code.as_deref(),
        }
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        self.code().and_then(suggestion_for_code)
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidInstanceID.NotFound",
    "InvalidGroup.NotFound",
    "InvalidKeyPair.NotFound",
    "InvalidVpcID.NotFound",
    "InvalidPermission.NotFound",
];

/// Known AWS error codes for "already exists" conditions
const ALREADY_EXISTS_CODES: &[&str] = &[
    "InvalidKeyPair.Duplicate",
    "InvalidGroup.Duplicate",
    "InvalidPermission.Duplicate",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Known AWS error codes for dependency violations (resource still in use)
const DEPENDENCY_CODES: &[&str] = &["DependencyViolation"];

/// Known AWS error codes for malformed or rejected arguments
const INVALID_PARAMETER_CODES: &[&str] = &[
    "InvalidParameter",
    "InvalidParameterValue",
    "InvalidParameterCombination",
    "MissingParameter",
    "InvalidAMIID.Malformed",
    "InvalidAMIID.NotFound",
    "InvalidInstanceID.Malformed",
    "InvalidGroupId.Malformed",
    "InvalidKeyPair.Format",
    "InvalidInstanceType",
];

/// Known AWS error codes for credential problems
const UNAUTHORIZED_CODES: &[&str] = &[
    "AuthFailure",
    "UnauthorizedOperation",
    "InvalidClientTokenId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "AccessDenied",
];

/// Classify an AWS error from its code and message.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> ProviderError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => ProviderError::NotFound {
            code: c.to_string(),
            message,
        },
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => ProviderError::AlreadyExists {
            code: c.to_string(),
            message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => ProviderError::Throttled { message },
        Some(c) if DEPENDENCY_CODES.contains(&c) => ProviderError::DependencyViolation { message },
        Some(c) if INVALID_PARAMETER_CODES.contains(&c) => ProviderError::InvalidParameter {
            code: c.to_string(),
            message,
        },
        Some(c) if UNAUTHORIZED_CODES.contains(&c) => ProviderError::Unauthorized {
            code: c.to_string(),
            message,
        },
        _ => ProviderError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an SDK error from any AWS service client.
///
/// Dispatch failures and timeouts carry no service metadata and become
/// [`ProviderError::Transport`]; everything else goes through the error code.
pub fn classify_sdk_error<E, R>(err: &SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => ProviderError::Transport {
            message: DisplayErrorContext(err).to_string(),
        },
        _ => {
            let message = err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(err).to_string());
            classify_aws_error(err.code(), Some(&message))
        }
    }
}

/// Extension to classify SDK results at the call site
pub trait ClassifyExt<T> {
    fn classify(self) -> Result<T, ProviderError>;
}

impl<T, E, R> ClassifyExt<T> for Result<T, SdkError<E, R>>
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn classify(self) -> Result<T, ProviderError> {
        self.map_err(|e| classify_sdk_error(&e))
    }
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "InsufficientInstanceCapacity",
        "Try a different availability zone or instance type.",
    ),
    (
        "InstanceLimitExceeded",
        "Request a service limit increase via AWS Service Quotas console.",
    ),
    (
        "VcpuLimitExceeded",
        "Request a service limit increase via AWS Service Quotas console.",
    ),
    (
        "InvalidAMIID.NotFound",
        "AMI ids are regional; check the AMI exists in the requested region.",
    ),
    (
        "InvalidKeyPair.Duplicate",
        "A key pair with this name already exists; delete it or pick another name.",
    ),
    (
        "InvalidGroup.Duplicate",
        "A security group with this name already exists in the VPC.",
    ),
    (
        "AuthFailure",
        "Check AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY or the selected profile.",
    ),
    (
        "RequestLimitExceeded",
        "AWS API rate limit hit. Retry the request later.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
            assert_eq!(err.code(), Some(*code));
        }
    }

    #[test]
    fn already_exists_codes() {
        for code in ALREADY_EXISTS_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(
                matches!(err, ProviderError::AlreadyExists { .. }),
                "Expected AlreadyExists for code: {code}"
            );
        }
    }

    #[test]
    fn throttling_codes_are_transient() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(err.is_transient(), "Expected transient for code: {code}");
            assert!(matches!(err, ProviderError::Throttled { .. }));
        }
    }

    #[test]
    fn invalid_parameter_is_not_transient() {
        let err = classify_aws_error(Some("InvalidParameterValue"), Some("port out of range"));
        assert!(matches!(err, ProviderError::InvalidParameter { .. }));
        assert!(!err.is_transient());
        assert!(!err.is_not_found());
    }

    #[test]
    fn ami_not_found_is_a_bad_argument() {
        // The missing AMI is an input to the launch, not the target resource
        let err = classify_aws_error(Some("InvalidAMIID.NotFound"), Some("no such ami"));
        assert!(matches!(err, ProviderError::InvalidParameter { .. }));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn unauthorized_codes() {
        for code in UNAUTHORIZED_CODES {
            let err = classify_aws_error(Some(code), Some("denied"));
            assert!(
                matches!(err, ProviderError::Unauthorized { .. }),
                "Expected Unauthorized for code: {code}"
            );
        }
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, ProviderError::Sdk { .. }));

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, ProviderError::Sdk { code: None, .. }));
        assert_eq!(err2.code(), None);
    }

    #[test]
    fn transport_is_transient() {
        let err = ProviderError::Transport {
            message: "connection reset".into(),
        };
        assert!(err.is_transient());
        assert_eq!(err.code(), None);
    }

    #[test]
    fn suggestions_for_known_codes() {
        for (code, _) in SUGGESTIONS {
            assert!(
                suggestion_for_code(code).is_some(),
                "No suggestion for code: {code}"
            );
        }
        assert!(suggestion_for_code("SomeUnknownCode").is_none());
    }
}
