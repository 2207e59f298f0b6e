#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use cachepg_core::{Parameter, ParameterSet};
use cachepg_provisioner::api::{BoxFuture, GroupDescription, ParameterGroupApi};
use cachepg_provisioner::{ApiError, ApiErrorKind};

pub const PENDING_CHANGES: &str =
    "Cache parameter group sessions has pending changes. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    DescribeGroup,
    DescribeParameters,
    Reset,
    Modify,
    Delete,
}

impl Op {
    fn operation(self) -> &'static str {
        match self {
            Op::Create => "CreateCacheParameterGroup",
            Op::DescribeGroup => "DescribeCacheParameterGroups",
            Op::DescribeParameters => "DescribeCacheParameters",
            Op::Reset => "ResetCacheParameterGroup",
            Op::Modify => "ModifyCacheParameterGroup",
            Op::Delete => "DeleteCacheParameterGroup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String),
    DescribeGroup(String),
    DescribeParameters(String),
    Reset(String, Vec<Parameter>),
    Modify(String, Vec<Parameter>),
    Delete(String),
}

#[derive(Debug, Clone)]
enum Fault {
    Fail(ApiErrorKind, String),
    /// Never returns; the caller's deadline has to cut it off.
    Hang,
}

struct Group {
    family: String,
    description: String,
    parameters: BTreeMap<String, String>,
}

#[derive(Default)]
struct Inner {
    groups: BTreeMap<String, Group>,
    calls: Vec<Call>,
    faults: HashMap<Op, VecDeque<Fault>>,
}

/// In-memory ElastiCache control plane. Records every call and fails
/// calls on demand, in the order the faults were queued.
#[derive(Default)]
pub struct FakeApi {
    inner: Mutex<Inner>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(self, name: &str, family: &str, parameters: &[(&str, &str)]) -> Self {
        self.lock().groups.insert(
            name.to_string(),
            Group {
                family: family.to_string(),
                description: cachepg_core::group::DEFAULT_DESCRIPTION.to_string(),
                parameters: parameters
                    .iter()
                    .map(|(n, v)| (n.to_string(), v.to_string()))
                    .collect(),
            },
        );
        self
    }

    /// Fail the next `times` calls of `op` with an error of `kind`.
    pub fn fail(&self, op: Op, kind: ApiErrorKind, message: &str, times: usize) {
        let mut inner = self.lock();
        let queue = inner.faults.entry(op).or_default();
        for _ in 0..times {
            queue.push_back(Fault::Fail(kind, message.to_string()));
        }
    }

    /// Make the next call of `op` hang forever.
    pub fn hang(&self, op: Op) {
        self.lock().faults.entry(op).or_default().push_back(Fault::Hang);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn resets(&self) -> Vec<Vec<Parameter>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Reset(_, p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn modifies(&self) -> Vec<Vec<Parameter>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Modify(_, p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Delete(_)))
            .count()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.lock().groups.contains_key(name)
    }

    pub fn family(&self, name: &str) -> Option<String> {
        self.lock().groups.get(name).map(|g| g.family.clone())
    }

    pub fn parameters(&self, name: &str) -> Option<ParameterSet> {
        self.lock().groups.get(name).map(|g| to_set(&g.parameters))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Record the call, then apply any queued fault for it.
    async fn enter(&self, op: Op, call: Call) -> Result<(), ApiError> {
        let fault = {
            let mut inner = self.lock();
            inner.calls.push(call);
            inner.faults.get_mut(&op).and_then(VecDeque::pop_front)
        };
        match fault {
            None => Ok(()),
            Some(Fault::Fail(kind, message)) => Err(ApiError::new(op.operation(), kind, message)),
            Some(Fault::Hang) => std::future::pending().await,
        }
    }

    fn not_found(op: Op, name: &str) -> ApiError {
        ApiError::new(
            op.operation(),
            ApiErrorKind::NotFound,
            format!("CacheParameterGroupNotFound: {name} not found"),
        )
    }

    fn describe(name: &str, group: &Group) -> GroupDescription {
        GroupDescription {
            name: name.to_string(),
            family: group.family.clone(),
            description: group.description.clone(),
            arn: Some(format!(
                "arn:aws:elasticache:us-east-1:123456789012:parametergroup:{name}"
            )),
        }
    }
}

fn to_set(parameters: &BTreeMap<String, String>) -> ParameterSet {
    parameters
        .iter()
        .map(|(n, v)| Parameter::new(n, v.clone()))
        .collect()
}

impl ParameterGroupApi for FakeApi {
    fn create_group<'a>(
        &'a self,
        name: &'a str,
        family: &'a str,
        description: &'a str,
    ) -> BoxFuture<'a, Result<GroupDescription, ApiError>> {
        Box::pin(async move {
            self.enter(Op::Create, Call::Create(name.to_string())).await?;
            let mut inner = self.lock();
            if inner.groups.contains_key(name) {
                return Err(ApiError::new(
                    Op::Create.operation(),
                    ApiErrorKind::Other,
                    format!("CacheParameterGroupAlreadyExists: {name}"),
                ));
            }
            let group = Group {
                family: family.to_string(),
                description: description.to_string(),
                parameters: BTreeMap::new(),
            };
            let created = Self::describe(name, &group);
            inner.groups.insert(name.to_string(), group);
            Ok(created)
        })
    }

    fn describe_group<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<GroupDescription, ApiError>> {
        Box::pin(async move {
            self.enter(Op::DescribeGroup, Call::DescribeGroup(name.to_string()))
                .await?;
            let inner = self.lock();
            inner
                .groups
                .get(name)
                .map(|g| Self::describe(name, g))
                .ok_or_else(|| Self::not_found(Op::DescribeGroup, name))
        })
    }

    fn describe_user_parameters<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<ParameterSet, ApiError>> {
        Box::pin(async move {
            self.enter(
                Op::DescribeParameters,
                Call::DescribeParameters(name.to_string()),
            )
            .await?;
            let inner = self.lock();
            inner
                .groups
                .get(name)
                .map(|g| to_set(&g.parameters))
                .ok_or_else(|| Self::not_found(Op::DescribeParameters, name))
        })
    }

    fn reset_parameters<'a>(
        &'a self,
        name: &'a str,
        parameters: &'a [Parameter],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.enter(Op::Reset, Call::Reset(name.to_string(), parameters.to_vec()))
                .await?;
            let mut inner = self.lock();
            let group = inner
                .groups
                .get_mut(name)
                .ok_or_else(|| Self::not_found(Op::Reset, name))?;
            for p in parameters {
                group.parameters.remove(p.name());
            }
            Ok(())
        })
    }

    fn modify_parameters<'a>(
        &'a self,
        name: &'a str,
        parameters: &'a [Parameter],
    ) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.enter(Op::Modify, Call::Modify(name.to_string(), parameters.to_vec()))
                .await?;
            let mut inner = self.lock();
            let group = inner
                .groups
                .get_mut(name)
                .ok_or_else(|| Self::not_found(Op::Modify, name))?;
            for p in parameters {
                group
                    .parameters
                    .insert(p.name().to_string(), p.value().to_string());
            }
            Ok(())
        })
    }

    fn delete_group<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), ApiError>> {
        Box::pin(async move {
            self.enter(Op::Delete, Call::Delete(name.to_string())).await?;
            let mut inner = self.lock();
            inner
                .groups
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| Self::not_found(Op::Delete, name))
        })
    }
}

pub fn params(pairs: &[(&str, &str)]) -> ParameterSet {
    pairs.iter().map(|(n, v)| Parameter::new(n, *v)).collect()
}

pub fn param(name: &str, value: &str) -> Parameter {
    Parameter::new(name, value)
}
