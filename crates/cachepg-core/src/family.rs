//! Family-specific rules for the `reserved-memory` reset.
//!
//! Resetting `reserved-memory` to its default can fail slowly on the
//! provider side. The same effect can be reached by setting the sibling
//! `reserved-memory-percentage` to 0 and then resetting it, which works
//! reliably. The sibling does not exist in the oldest Redis families.

use crate::parameter::ParameterSet;

pub const RESERVED_MEMORY: &str = "reserved-memory";
pub const RESERVED_MEMORY_PERCENTAGE: &str = "reserved-memory-percentage";

/// Value the sibling parameter is set to before it is reset.
pub const NEUTRAL_RESERVED_MEMORY_PERCENTAGE: &str = "0";

const FAMILIES_WITHOUT_PERCENTAGE: [&str; 2] = ["redis2.6", "redis2.8"];

pub fn supports_reserved_memory_percentage(family: &str) -> bool {
    !FAMILIES_WITHOUT_PERCENTAGE.contains(&family.to_lowercase().as_str())
}

/// What to do after dropping a `reserved-memory` reset that timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedMemoryReset {
    /// Go through `reserved-memory-percentage`.
    Indirect,
    /// The desired state sets one of the memory parameters itself, so the
    /// upcoming modify takes care of it.
    ExplicitlyConfigured,
    /// The family has no `reserved-memory-percentage`.
    UnsupportedFamily,
}

pub fn reserved_memory_reset(family: &str, desired: &ParameterSet) -> ReservedMemoryReset {
    if desired.contains_name(RESERVED_MEMORY) || desired.contains_name(RESERVED_MEMORY_PERCENTAGE)
    {
        return ReservedMemoryReset::ExplicitlyConfigured;
    }
    if !supports_reserved_memory_percentage(family) {
        return ReservedMemoryReset::UnsupportedFamily;
    }
    ReservedMemoryReset::Indirect
}
