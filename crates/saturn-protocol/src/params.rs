//! Job parameters and their query-string form.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::{ProtocolError, Result};

/// Parameters passed to a job handler (key -> value, keys unique).
pub type JobParams = BTreeMap<String, String>;

/// Encode parameters as an `application/x-www-form-urlencoded` query.
pub fn encode_query(params: &JobParams) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Decode a query string into parameters. Repeated keys keep their first value.
pub fn decode_query(query: &str) -> JobParams {
    let mut params = JobParams::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

/// Parse the legacy flat args string (`id=1&x=9`, optionally prefixed with `?`).
///
/// Unlike [`decode_query`] this is strict: malformed percent escapes and `;`
/// separators are rejected so a mistyped command line fails before any request
/// is sent.
pub fn parse_legacy_args(raw: &str) -> Result<JobParams> {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    for piece in raw.split('&').filter(|piece| !piece.is_empty()) {
        if piece.contains(';') {
            return Err(ProtocolError::InvalidArgs(format!(
                "invalid semicolon separator in {piece:?}"
            )));
        }
        validate_escapes(piece)?;
    }
    Ok(decode_query(raw))
}

fn validate_escapes(piece: &str) -> Result<()> {
    let bytes = piece.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(ProtocolError::InvalidArgs(format!(
                    "invalid escape in {piece:?}"
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}

/// Escape a job name as a single path segment.
pub fn encode_job_name(name: &str) -> String {
    format!("/{}", urlencoding::encode(name))
}

/// Recover a job name from a request path. Returns `None` for undecodable paths.
pub fn decode_job_name(path: &str) -> Option<String> {
    let segment = path.strip_prefix('/').unwrap_or(path);
    urlencoding::decode(segment).ok().map(|name| name.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> JobParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_query_escapes_values() {
        let query = encode_query(&params(&[("msg", "a b&c"), ("id", "1")]));
        assert_eq!(query, "id=1&msg=a+b%26c");
    }

    #[test]
    fn test_decode_query_first_value_wins() {
        let decoded = decode_query("id=1&id=2&x=9");
        assert_eq!(decoded, params(&[("id", "1"), ("x", "9")]));
    }

    #[test]
    fn test_legacy_args_strip_question_mark() {
        let parsed = parse_legacy_args("?id=33&ver=22").unwrap();
        assert_eq!(parsed, params(&[("id", "33"), ("ver", "22")]));
    }

    #[test]
    fn test_legacy_args_reject_bad_escape() {
        assert!(parse_legacy_args("id=%zz").is_err());
        assert!(parse_legacy_args("id=%4").is_err());
        assert!(parse_legacy_args("a=1;b=2").is_err());
    }

    #[test]
    fn test_legacy_args_empty() {
        assert!(parse_legacy_args("").unwrap().is_empty());
        assert!(parse_legacy_args("?").unwrap().is_empty());
    }

    #[test]
    fn test_job_name_path_segment() {
        assert_eq!(encode_job_name("hello"), "/hello");
        assert_eq!(encode_job_name("a/b c"), "/a%2Fb%20c");
        assert_eq!(decode_job_name("/a%2Fb%20c").as_deref(), Some("a/b c"));
        assert_eq!(decode_job_name("/hello").as_deref(), Some("hello"));
    }
}
