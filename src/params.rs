//! Header value parameter parsing.
//!
//! Splits `type; name=value; name="value"` header values the way the platform header
//! helpers do: segments are cut at every `;`, names are matched after trimming, and
//! quotes are stripped only when they wrap the whole value.

/// Returns the value of the named parameter inside a header value, if present.
///
/// Empty parameter values are skipped, so a later segment with the same name can still
/// match.
pub(crate) fn header_param<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    let (_, params) = value.split_once(';')?;
    for segment in params.split(';') {
        let Some((key, val)) = segment.split_once('=') else {
            continue;
        };
        if key.trim() != name {
            continue;
        }
        let val = val.trim();
        if val.is_empty() {
            continue;
        }
        return Some(unquote(val));
    }
    None
}

/// Returns all parameters inside a header value, in order of first appearance.
///
/// A repeated name keeps its position but takes the later value.
pub(crate) fn header_params(value: &str) -> Vec<(&str, &str)> {
    let mut out: Vec<(&str, &str)> = Vec::new();
    let Some((_, params)) = value.split_once(';') else {
        return out;
    };
    for segment in params.split(';') {
        let Some((key, val)) = segment.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();
        if key.is_empty() || val.is_empty() {
            continue;
        }
        let val = unquote(val);
        match out.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = val,
            None => out.push((key, val)),
        }
    }
    out
}

fn unquote(val: &str) -> &str {
    if val.len() > 2 && val.starts_with('"') && val.ends_with('"') {
        &val[1..val.len() - 1]
    } else {
        val
    }
}
