use std::future::Future;
use std::pin::Pin;

use cachepg_core::{Parameter, ParameterSet};

use crate::error::ApiError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A parameter group as the control plane describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDescription {
    pub name: String,
    pub family: String,
    pub description: String,
    pub arn: Option<String>,
}

/// The ElastiCache control-plane calls the reconciler needs.
///
/// Implemented over the AWS SDK by [`ElastiCacheApi`](crate::elasticache::ElastiCacheApi);
/// tests provide an in-memory fake. Methods return boxed futures for dyn
/// compatibility.
pub trait ParameterGroupApi: Send + Sync {
    fn create_group<'a>(
        &'a self,
        name: &'a str,
        family: &'a str,
        description: &'a str,
    ) -> BoxFuture<'a, Result<GroupDescription, ApiError>>;

    /// Fails with [`ApiErrorKind::NotFound`](crate::error::ApiErrorKind::NotFound)
    /// when the group does not exist.
    fn describe_group<'a>(&'a self, name: &'a str)
    -> BoxFuture<'a, Result<GroupDescription, ApiError>>;

    /// Only user-modified parameters; engine defaults are left out.
    fn describe_user_parameters<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<ParameterSet, ApiError>>;

    /// Reset the named parameters to their engine defaults. At most
    /// [`MAX_PARAMETERS_PER_CALL`](cachepg_core::MAX_PARAMETERS_PER_CALL) entries.
    fn reset_parameters<'a>(
        &'a self,
        name: &'a str,
        parameters: &'a [Parameter],
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    /// Set parameters explicitly. Same batch limit as `reset_parameters`.
    fn modify_parameters<'a>(
        &'a self,
        name: &'a str,
        parameters: &'a [Parameter],
    ) -> BoxFuture<'a, Result<(), ApiError>>;

    fn delete_group<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), ApiError>>;
}
