//! cachepg-core
//!
//! Pure domain types for ElastiCache parameter groups: parameters and
//! parameter sets, the set diff, batching, and family-specific rules.
//! No AWS SDK dependency.

pub mod batch;
pub mod diff;
pub mod error;
pub mod family;
pub mod group;
pub mod parameter;

pub use crate::batch::{batches, MAX_PARAMETERS_PER_CALL};
pub use crate::diff::ParameterDiff;
pub use crate::error::CoreError;
pub use crate::group::ParameterGroupSpec;
pub use crate::parameter::{Parameter, ParameterSet};
