//! AWS account validation and identity

use crate::aws::error::{ClassifyExt, ProviderError};
use serde::Serialize;
use tracing::info;

/// Strongly-typed AWS account ID (12-digit string)
///
/// This newtype prevents accidentally mixing account IDs with other strings.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, derive_more::Display, derive_more::Deref,
)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(s: impl Into<String>) -> Self {
        AccountId(s.into())
    }
}

/// Who the configured credentials belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerIdentity {
    pub account: AccountId,
    pub arn: String,
    pub user_id: String,
}

/// Fetch the caller identity via STS GetCallerIdentity
///
/// This operation requires no special permissions - it always succeeds if
/// credentials are valid, so it doubles as a credential check.
pub async fn get_caller_identity(
    sts: &aws_sdk_sts::Client,
) -> Result<CallerIdentity, ProviderError> {
    let identity = sts.get_caller_identity().send().await.classify()?;

    let missing = |field: &str| ProviderError::Sdk {
        code: None,
        message: format!("No {field} returned from STS GetCallerIdentity"),
    };

    let account = identity.account().ok_or_else(|| missing("account"))?;
    let arn = identity.arn().ok_or_else(|| missing("ARN"))?;

    info!(account_id = %account, arn = %arn, "AWS identity validated");

    Ok(CallerIdentity {
        account: AccountId::new(account),
        arn: arn.to_string(),
        user_id: identity.user_id().unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_derefs_to_str() {
        let id = AccountId::new("123456789012");
        assert_eq!(id.len(), 12);
        assert_eq!(id.to_string(), "123456789012");
    }

    #[test]
    fn identity_serializes_account_as_string() {
        let identity = CallerIdentity {
            account: AccountId::new("123456789012"),
            arn: "arn:aws:iam::123456789012:user/ops".into(),
            user_id: "AIDAEXAMPLE".into(),
        };
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["account"], "123456789012");
        assert_eq!(json["arn"], "arn:aws:iam::123456789012:user/ops");
    }
}
