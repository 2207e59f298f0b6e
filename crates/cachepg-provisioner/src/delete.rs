use crate::api::ParameterGroupApi;
use crate::error::{ApiError, ProvisionerError};
use crate::retry::{self, RetryError, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyGone,
}

/// Delete a parameter group. Idempotent: a group that no longer exists
/// counts as deleted.
///
/// While the group still has pending changes the delete is retried up to
/// `policy.delete_timeout`, followed by one last unretried attempt.
pub async fn delete_group(
    api: &dyn ParameterGroupApi,
    name: &str,
    policy: &RetryPolicy,
) -> Result<DeleteOutcome, ProvisionerError> {
    let result = retry::with_deadline(
        policy,
        policy.delete_timeout,
        ApiError::is_pending_changes,
        || api.delete_group(name),
    )
    .await;

    let result = match result {
        Ok(()) => Ok(()),
        Err(RetryError::Fatal(err)) => Err(err),
        Err(err) => {
            tracing::warn!(group = %name, error = %err, "delete still blocked, making a final attempt");
            api.delete_group(name).await
        }
    };

    match result {
        Ok(()) => {
            tracing::info!(group = %name, "parameter group deleted");
            Ok(DeleteOutcome::Deleted)
        }
        Err(err) if err.is_not_found() => {
            tracing::info!(group = %name, "parameter group already deleted");
            Ok(DeleteOutcome::AlreadyGone)
        }
        Err(err) => Err(ProvisionerError::DeleteFailed(err.to_string())
            .with_resource("parameter group", name)),
    }
}
