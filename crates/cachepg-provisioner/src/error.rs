use thiserror::Error;

/// Coarse classification of a control-plane failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The parameter group does not exist.
    NotFound,
    /// `InvalidCacheParameterGroupState`: a previous mutation has not settled.
    PendingChanges,
    /// Transport timeout or a server-side fault the SDK already retried.
    Timeout,
    Other,
}

/// An error returned by one call to the remote API.
#[derive(Debug, Clone, Error)]
#[error("{operation} failed: {message}")]
pub struct ApiError {
    pub operation: &'static str,
    pub kind: ApiErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(operation: &'static str, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }

    pub fn is_pending_changes(&self) -> bool {
        self.kind == ApiErrorKind::PendingChanges
    }

    /// Narrower than [`is_pending_changes`](Self::is_pending_changes): the
    /// invalid-state fault must also say the group "has pending changes".
    /// Only this form is retried when resetting parameters.
    pub fn has_pending_changes(&self) -> bool {
        self.is_pending_changes() && self.message.contains("has pending changes")
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ApiErrorKind::Timeout
    }
}

#[derive(Debug, Error)]
pub enum ProvisionerError {
    #[error("resource not found: {resource_type}/{resource_id}")]
    ResourceNotFound {
        resource_type: String,
        resource_id: String,
    },

    #[error("resource creation failed: {0}")]
    CreateFailed(String),

    #[error("resource read failed: {0}")]
    ReadFailed(String),

    #[error("resource update failed: {0}")]
    UpdateFailed(String),

    #[error("resource deletion failed: {0}")]
    DeleteFailed(String),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("invalid parameter group: {0}")]
    Invalid(#[from] cachepg_core::CoreError),

    #[error("state error: {0}")]
    State(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProvisionerError {
    /// Prepend resource identity to the error message.
    pub fn with_resource(self, label: &str, name: &str) -> Self {
        match self {
            Self::CreateFailed(msg) => Self::CreateFailed(format!("{label} ({name}): {msg}")),
            Self::ReadFailed(msg) => Self::ReadFailed(format!("{label} ({name}): {msg}")),
            Self::UpdateFailed(msg) => Self::UpdateFailed(format!("{label} ({name}): {msg}")),
            Self::DeleteFailed(msg) => Self::DeleteFailed(format!("{label} ({name}): {msg}")),
            other => other,
        }
    }
}

/// Walk the full error chain and join all causes into one string.
///
/// AWS SDK errors often have terse `Display` impls (e.g. "service error")
/// but useful detail in the source chain.
pub fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
