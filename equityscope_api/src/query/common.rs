//! Shared query infrastructure.

use url::Url;

/// Trait implemented by all query builders.
pub trait Query {
    /// Path of the endpoint this query targets, relative to the API base URL.
    /// Each element is one path segment and is percent-encoded when appended.
    fn path_segments(&self) -> Vec<String>;

    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;
}
