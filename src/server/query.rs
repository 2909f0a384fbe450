//! Query string helpers

/// Collect every value of a repeated query parameter, in order
///
/// `channels=a&channels=b` yields `["a", "b"]`. Empty values are skipped.
pub fn repeated_param(query: Option<&str>, name: &str) -> Vec<String> {
    let Some(query) = query else {
        return Vec::new();
    };

    form_urlencoded::parse(query.as_bytes())
        .filter(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
        .collect()
}
