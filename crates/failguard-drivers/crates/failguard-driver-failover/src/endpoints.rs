//! Splitting a multi-endpoint descriptor into individual candidates

/// Separator between endpoint descriptors in a multi-endpoint string
pub const ENDPOINT_SEPARATOR: char = ',';

/// Split a multi-endpoint descriptor into its ordered candidates.
///
/// The split is purely on [`ENDPOINT_SEPARATOR`]: no trimming, validation or
/// deduplication happens here, and the result is never empty (`""` yields a
/// single empty candidate). Malformed descriptors surface later as open
/// errors from the delegate driver.
pub fn split_endpoints(multi_endpoint: &str) -> Vec<String> {
    multi_endpoint
        .split(ENDPOINT_SEPARATOR)
        .map(str::to_owned)
        .collect()
}

/// Join individual endpoint descriptors into a multi-endpoint descriptor.
///
/// Descriptors must not themselves contain [`ENDPOINT_SEPARATOR`]; such a
/// descriptor would be split apart again on open.
pub fn join_endpoints<S: AsRef<str>>(endpoints: &[S]) -> String {
    endpoints
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(&ENDPOINT_SEPARATOR.to_string())
}
