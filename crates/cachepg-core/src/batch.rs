/// ModifyCacheParameterGroup and ResetCacheParameterGroup accept at most
/// this many parameters per call.
pub const MAX_PARAMETERS_PER_CALL: usize = 20;

/// Split `items` into consecutive batches of at most
/// [`MAX_PARAMETERS_PER_CALL`] entries, preserving order.
pub fn batches<T>(items: &[T]) -> std::slice::Chunks<'_, T> {
    items.chunks(MAX_PARAMETERS_PER_CALL)
}

/// Number of remote calls needed for `len` items.
pub fn batch_count(len: usize) -> usize {
    len.div_ceil(MAX_PARAMETERS_PER_CALL)
}
