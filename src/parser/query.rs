//! Request target splitting and query-string decoding.

use std::collections::HashMap;

use crate::parser::error::Error;

/// Split a request target into the resource and its decoded query parameters.
///
/// The target is split on the first `?`. Each `&`-separated pair must contain
/// a `=`; `+` decodes to a space in both key and value. No percent-decoding is
/// performed. A bare trailing `?` is dropped from the resource, as are
/// trailing `&` separators.
pub fn split_target(target: &str) -> Result<(String, HashMap<String, String>), Error> {
    let Some((resource, query)) = target.split_once('?') else {
        return Ok((target.to_string(), HashMap::new()));
    };

    let query = query.trim_end_matches('&');
    if query.is_empty() {
        return Ok((resource.to_string(), HashMap::new()));
    }

    let mut params = HashMap::new();
    for pair in query.split('&') {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| Error::InvalidQueryParameter(pair.to_string()))?;
        params.insert(decode_plus(key), decode_plus(value));
    }

    Ok((resource.to_string(), params))
}

fn decode_plus(s: &str) -> String {
    s.replace('+', " ")
}
