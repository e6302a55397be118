//! Query string merging.

use std::collections::BTreeMap;

use url::form_urlencoded;
use url::Url;

/// Merge `params` into the query of `url`.
///
/// Existing pairs are kept; a param whose key already exists adds another
/// value rather than replacing it. The result is re-encoded sorted by key,
/// with the values of one key in their original order. An empty result
/// removes the query component.
pub(crate) fn merge_params(url: &mut Url, params: &BTreeMap<String, String>) {
    let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        values.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    for (key, value) in params {
        values.entry(key.clone()).or_default().push(value.clone());
    }

    if values.is_empty() {
        url.set_query(None);
        return;
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, list) in &values {
        for value in list {
            serializer.append_pair(key, value);
        }
    }
    url.set_query(Some(&serializer.finish()));
}
