//! cachepg-cli library root.
//!
//! Config loading and AWS client setup live here so integration tests can
//! exercise them without going through the command layer.

pub mod aws;
pub mod config;
