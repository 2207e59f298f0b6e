use aws_sdk_elasticache::Client;
use aws_sdk_elasticache::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_elasticache::types::{
    CacheParameterGroup, Parameter as SdkParameter, ParameterNameValue,
};
use cachepg_core::{Parameter, ParameterSet};

use crate::api::{BoxFuture, GroupDescription, ParameterGroupApi};
use crate::error::{format_err_chain, ApiError, ApiErrorKind};

const CREATE: &str = "elasticache:CreateCacheParameterGroup";
const DESCRIBE_GROUPS: &str = "elasticache:DescribeCacheParameterGroups";
const DESCRIBE_PARAMETERS: &str = "elasticache:DescribeCacheParameters";
const RESET: &str = "elasticache:ResetCacheParameterGroup";
const MODIFY: &str = "elasticache:ModifyCacheParameterGroup";
const DELETE: &str = "elasticache:DeleteCacheParameterGroup";

/// Restricts DescribeCacheParameters to parameters a user changed.
const SOURCE_USER: &str = "user";

/// [`ParameterGroupApi`] over the AWS ElastiCache SDK.
pub struct ElastiCacheApi {
    client: Client,
}

impl ElastiCacheApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

impl ParameterGroupApi for ElastiCacheApi {
    fn create_group<'a>(
        &'a self,
        name: &'a str,
        family: &'a str,
        description: &'a str,
    ) -> BoxFuture<'a, Result<GroupDescription, ApiError>> {
        Box::pin(async move {
            let resp = self
                .client
                .create_cache_parameter_group()
                .cache_parameter_group_name(name)
                .cache_parameter_group_family(family)
                .description(description)
                .send()
                .await
                .map_err(|e| classify(CREATE, e))?;

            resp.cache_parameter_group()
                .map(describe)
                .ok_or_else(|| {
                    ApiError::new(CREATE, ApiErrorKind::Other, "response carried no parameter group")
                })
        })
    }

    fn describe_group<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<GroupDescription, ApiError>> {
        Box::pin(async move {
            let resp = self
                .client
                .describe_cache_parameter_groups()
                .cache_parameter_group_name(name)
                .send()
                .await
                .map_err(|e| classify(DESCRIBE_GROUPS, e))?;

            match resp.cache_parameter_groups() {
                [group] if group.cache_parameter_group_name() == Some(name) => Ok(describe(group)),
                groups => Err(ApiError::new(
                    DESCRIBE_GROUPS,
                    ApiErrorKind::NotFound,
                    format!("unable to find parameter group {name} ({} returned)", groups.len()),
                )),
            }
        })
    }

    fn describe_user_parameters<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<ParameterSet, ApiError>> {
        Box::pin(async move {
            let mut parameters = ParameterSet::new();
            let mut marker: Option<String> = None;

            loop {
                let resp = self
                    .client
                    .describe_cache_parameters()
                    .cache_parameter_group_name(name)
                    .source(SOURCE_USER)
                    .set_marker(marker.take())
                    .send()
                    .await
                    .map_err(|e| classify(DESCRIBE_PARAMETERS, e))?;

                parameters.extend(flatten_parameters(resp.parameters()));

                match resp.marker() {
                    Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                    _ => break,
                }
            }

            Ok(parameters)
        })
    }

    fn reset_parameters<'a>(
        &'a self,
        name: &'a str,
        parameters: &'a [Parameter],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .reset_cache_parameter_group()
                .cache_parameter_group_name(name)
                .set_parameter_name_values(Some(expand_parameters(parameters)))
                .send()
                .await
                .map_err(|e| classify(RESET, e))?;
            Ok(())
        })
    }

    fn modify_parameters<'a>(
        &'a self,
        name: &'a str,
        parameters: &'a [Parameter],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .modify_cache_parameter_group()
                .cache_parameter_group_name(name)
                .set_parameter_name_values(Some(expand_parameters(parameters)))
                .send()
                .await
                .map_err(|e| classify(MODIFY, e))?;
            Ok(())
        })
    }

    fn delete_group<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.client
                .delete_cache_parameter_group()
                .cache_parameter_group_name(name)
                .send()
                .await
                .map_err(|e| classify(DELETE, e))?;
            Ok(())
        })
    }
}

fn describe(group: &CacheParameterGroup) -> GroupDescription {
    GroupDescription {
        name: group.cache_parameter_group_name().unwrap_or_default().to_string(),
        family: group
            .cache_parameter_group_family()
            .unwrap_or_default()
            .to_string(),
        description: group.description().unwrap_or_default().to_string(),
        arn: group.arn().map(String::from),
    }
}

/// SDK parameters to local ones. Entries without a name or value are
/// skipped; names are lowercased.
pub fn flatten_parameters(list: &[SdkParameter]) -> Vec<Parameter> {
    list.iter()
        .filter_map(|p| Some(Parameter::new(p.parameter_name()?, p.parameter_value()?)))
        .collect()
}

/// Local parameters to the name/value pairs the mutation calls take.
pub fn expand_parameters(parameters: &[Parameter]) -> Vec<ParameterNameValue> {
    parameters
        .iter()
        .map(|p| {
            ParameterNameValue::builder()
                .parameter_name(p.name())
                .parameter_value(p.value())
                .build()
        })
        .collect()
}

fn classify<E, R>(operation: &'static str, err: SdkError<E, R>) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let kind = match &err {
        SdkError::TimeoutError(_) => ApiErrorKind::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_timeout() => ApiErrorKind::Timeout,
        SdkError::ServiceError(_) => kind_for_code(err.as_service_error().and_then(|e| e.code())),
        _ => ApiErrorKind::Other,
    };
    ApiError::new(operation, kind, format_err_chain(&err))
}

fn kind_for_code(code: Option<&str>) -> ApiErrorKind {
    match code {
        Some("CacheParameterGroupNotFound" | "CacheParameterGroupNotFoundFault") => {
            ApiErrorKind::NotFound
        }
        Some("InvalidCacheParameterGroupState" | "InvalidCacheParameterGroupStateFault") => {
            ApiErrorKind::PendingChanges
        }
        // Surfaced only after the SDK's own retries gave up.
        Some("InternalFailure" | "ServiceUnavailable") => ApiErrorKind::Timeout,
        _ => ApiErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_lowercases_and_drops_unset_values() {
        let list = vec![
            SdkParameter::builder()
                .parameter_name("Maxmemory-Policy")
                .parameter_value("allkeys-lru")
                .build(),
            SdkParameter::builder().parameter_name("timeout").build(),
            SdkParameter::builder().parameter_value("orphan").build(),
        ];

        assert_eq!(
            flatten_parameters(&list),
            vec![Parameter::new("maxmemory-policy", "allkeys-lru")]
        );
    }

    #[test]
    fn expand_keeps_names_and_values() {
        let expanded = expand_parameters(&[
            Parameter::new("timeout", "300"),
            Parameter::new("reserved-memory-percentage", "0"),
        ]);

        let pairs: Vec<_> = expanded
            .iter()
            .map(|p| (p.parameter_name(), p.parameter_value()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (Some("timeout"), Some("300")),
                (Some("reserved-memory-percentage"), Some("0")),
            ]
        );
    }

    #[test]
    fn expand_then_flatten_is_identity() {
        let params = vec![Parameter::new("activerehashing", "no")];
        let as_sdk: Vec<SdkParameter> = expand_parameters(&params)
            .into_iter()
            .map(|p| {
                SdkParameter::builder()
                    .set_parameter_name(p.parameter_name().map(String::from))
                    .set_parameter_value(p.parameter_value().map(String::from))
                    .build()
            })
            .collect();
        assert_eq!(flatten_parameters(&as_sdk), params);
    }

    #[test]
    fn error_codes_map_to_kinds() {
        assert_eq!(
            kind_for_code(Some("CacheParameterGroupNotFound")),
            ApiErrorKind::NotFound
        );
        assert_eq!(
            kind_for_code(Some("InvalidCacheParameterGroupState")),
            ApiErrorKind::PendingChanges
        );
        assert_eq!(kind_for_code(Some("InternalFailure")), ApiErrorKind::Timeout);
        assert_eq!(
            kind_for_code(Some("InvalidParameterValue")),
            ApiErrorKind::Other
        );
        assert_eq!(kind_for_code(None), ApiErrorKind::Other);
    }
}
