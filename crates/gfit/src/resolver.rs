//! Resolution of endpoint descriptors against caller parameter bags.
//!
//! [`resolve`] is the one shared code path behind every API operation: it
//! validates required parameters, substitutes percent-encoded path
//! parameters into the URL template, and partitions the rest of the bag into
//! query parameters and an optional request body. It performs no I/O and
//! holds no state; executing the result belongs to the transport.

use crate::descriptor::EndpointDescriptor;
use crate::error::{FitError, Result};
use reqwest::Method;
use serde_json::Value;
use url::Url;

/// Reserved bag key carrying the JSON request body.
pub const RESOURCE_PARAM: &str = "resource";

/// Reserved bag key carrying opaque per-call credentials for the transport.
pub const AUTH_PARAM: &str = "auth";

/// Caller-supplied parameter bag for one call.
pub type Params = serde_json::Map<String, Value>;

/// A descriptor resolved against a parameter bag, ready for the transport.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    /// Final URL: placeholders substituted, query string attached.
    pub url: Url,
    /// HTTP method from the descriptor.
    pub method: Method,
    /// Query parameters (raw key/value pairs, already applied to `url`).
    pub query: Vec<(String, String)>,
    /// JSON request body (the bag's `resource` key, if present).
    pub body: Option<Value>,
    /// Opaque per-call credentials (the bag's `auth` key, if present).
    /// Passed through to the transport untouched.
    pub auth: Option<Value>,
}

/// Resolve a descriptor against a parameter bag.
///
/// # Errors
///
/// Returns [`FitError::MissingParameters`] naming every absent required
/// parameter (checked before any URL work, so no request is attempted), or
/// [`FitError::MalformedTemplate`] if a placeholder survives substitution,
/// a descriptor defect that [`crate::descriptor::Registry`] construction
/// normally catches at startup.
pub fn resolve(
    descriptor: &EndpointDescriptor,
    base_url: &str,
    params: &Params,
) -> Result<ResolvedRequest> {
    let missing: Vec<String> = descriptor
        .required_params
        .iter()
        .filter(|name| !params.contains_key(**name))
        .map(|name| (*name).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(FitError::MissingParameters { names: missing });
    }

    let mut path = descriptor.path.to_string();
    if !path.starts_with('/') {
        path = format!("/{path}");
    }

    // Re-check presence per path parameter: path_params and required_params
    // are independently specified descriptor data.
    for name in descriptor.path_params {
        let value = params.get(*name).ok_or_else(|| FitError::MissingParameters {
            names: vec![(*name).to_string()],
        })?;
        let encoded = percent_encode(&value_to_string(value));
        path = path.replace(&format!("{{{name}}}"), &encoded);
    }

    if path.contains('{') || path.contains('}') {
        return Err(FitError::MalformedTemplate {
            operation: descriptor.id.to_string(),
            detail: format!("unsubstituted placeholder left in '{path}'"),
        });
    }

    let mut query: Vec<(String, String)> = Vec::new();
    let mut body = None;
    let mut auth = None;

    for (key, value) in params {
        if descriptor.path_params.contains(&key.as_str()) {
            continue;
        }
        match key.as_str() {
            RESOURCE_PARAM => body = Some(value.clone()),
            AUTH_PARAM => auth = Some(value.clone()),
            _ => query.push((key.clone(), value_to_string(value))),
        }
    }

    let url = build_url(descriptor, base_url, &path, &query)?;

    Ok(ResolvedRequest {
        url,
        method: descriptor.method.clone(),
        query,
        body,
        auth,
    })
}

fn build_url(
    descriptor: &EndpointDescriptor,
    base_url: &str,
    path: &str,
    query: &[(String, String)],
) -> Result<Url> {
    let joined = format!("{}{}", base_url.trim_end_matches('/'), path);
    let mut url = Url::parse(&joined).map_err(|e| {
        FitError::Config(format!(
            "Invalid URL '{joined}' for operation '{}': {e}",
            descriptor.id
        ))
    })?;

    if !query.is_empty() {
        let mut qs = String::new();
        for (i, (key, value)) in query.iter().enumerate() {
            if i > 0 {
                qs.push('&');
            }
            qs.push_str(&percent_encode(key));
            qs.push('=');
            qs.push_str(&percent_encode(value));
        }
        url.set_query(Some(&qs));
    }

    Ok(url)
}

/// Percent-encode every byte outside the RFC 3986 unreserved set.
///
/// Used for both path segments and query components; reserved characters
/// like `/`, `:` and `?` in parameter values must not survive into the URL
/// structure.
#[must_use]
pub fn percent_encode(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}

fn is_unreserved(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~')
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Params, percent_encode, resolve};
    use crate::descriptor::EndpointDescriptor;
    use crate::error::FitError;
    use reqwest::Method;
    use serde_json::{Value, json};
    use std::collections::BTreeSet;

    const BASE: &str = "https://www.googleapis.com/fitness/v1";

    static GET_DATA_SOURCE: EndpointDescriptor = EndpointDescriptor {
        id: "fitness.users.dataSources.get",
        path: "/users/{userId}/dataSources/{dataSourceId}",
        method: Method::GET,
        required_params: &["userId", "dataSourceId"],
        path_params: &["dataSourceId", "userId"],
    };

    static LIST_SESSIONS: EndpointDescriptor = EndpointDescriptor {
        id: "fitness.users.sessions.list",
        path: "/users/{userId}/sessions",
        method: Method::GET,
        required_params: &["userId"],
        path_params: &["userId"],
    };

    static UPDATE_SESSION: EndpointDescriptor = EndpointDescriptor {
        id: "fitness.users.sessions.update",
        path: "/users/{userId}/sessions/{sessionId}",
        method: Method::PUT,
        required_params: &["userId", "sessionId"],
        path_params: &["sessionId", "userId"],
    };

    fn bag(value: Value) -> Params {
        value.as_object().expect("test bag is an object").clone()
    }

    fn percent_decode(s: &str) -> String {
        let bytes = s.as_bytes();
        let mut out = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).expect("hex pair");
                out.push(u8::from_str_radix(hex, 16).expect("hex pair"));
                i += 3;
            } else {
                out.push(bytes[i]);
                i += 1;
            }
        }
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn resolves_path_params_with_percent_encoding() {
        let params = bag(json!({
            "userId": "me",
            "dataSourceId": "raw:com.google.step_count",
        }));

        let resolved = resolve(&GET_DATA_SOURCE, BASE, &params).expect("resolves");
        assert_eq!(
            resolved.url.as_str(),
            "https://www.googleapis.com/fitness/v1/users/me/dataSources/raw%3Acom.google.step_count"
        );
        assert_eq!(resolved.method, Method::GET);
        assert!(resolved.body.is_none());
        assert!(resolved.query.is_empty());
    }

    #[test]
    fn missing_single_required_param_is_reported() {
        let params = bag(json!({ "userId": "me" }));
        let err = resolve(&GET_DATA_SOURCE, BASE, &params).unwrap_err();
        match err {
            FitError::MissingParameters { names } => {
                assert_eq!(names, vec!["dataSourceId".to_string()]);
            }
            other => panic!("expected MissingParameters, got {other:?}"),
        }
    }

    #[test]
    fn all_missing_required_params_are_enumerated() {
        let params = bag(json!({}));
        let err = resolve(&GET_DATA_SOURCE, BASE, &params).unwrap_err();
        match err {
            FitError::MissingParameters { names } => {
                let got: BTreeSet<&str> = names.iter().map(String::as_str).collect();
                let want: BTreeSet<&str> = ["userId", "dataSourceId"].into_iter().collect();
                assert_eq!(got, want);
            }
            other => panic!("expected MissingParameters, got {other:?}"),
        }
    }

    #[test]
    fn reserved_characters_in_path_values_roundtrip() {
        let original = "a/b?c d#e";
        let params = bag(json!({ "userId": "me", "dataSourceId": original }));

        let resolved = resolve(&GET_DATA_SOURCE, BASE, &params).expect("resolves");
        let last_segment = resolved
            .url
            .path_segments()
            .and_then(|mut s| s.next_back())
            .expect("path segment")
            .to_string();

        assert!(!last_segment.contains('/'));
        assert!(!last_segment.contains('?'));
        assert!(!last_segment.contains(' '));
        assert_eq!(percent_decode(&last_segment), original);
    }

    #[test]
    fn resource_key_becomes_body_and_never_query() {
        let params = bag(json!({
            "userId": "me",
            "sessionId": "session-1",
            "currentTimeMillis": "1400000000000",
            "resource": { "name": "Morning run" },
        }));

        let resolved = resolve(&UPDATE_SESSION, BASE, &params).expect("resolves");
        assert_eq!(resolved.body, Some(json!({ "name": "Morning run" })));
        assert!(resolved.query.iter().all(|(k, _)| k != "resource"));
        assert!(!resolved.url.as_str().contains("resource"));

        // Dropping the body must not change the URL.
        let mut without_body = params.clone();
        without_body.remove("resource");
        let resolved_without = resolve(&UPDATE_SESSION, BASE, &without_body).expect("resolves");
        assert_eq!(resolved.url, resolved_without.url);
        assert!(resolved_without.body.is_none());
    }

    #[test]
    fn remaining_params_pass_through_as_query() {
        let params = bag(json!({
            "userId": "me",
            "includeDeleted": true,
            "pageToken": "abc 123",
            "startTime": "2015-01-01T00:00:00Z",
        }));

        let resolved = resolve(&LIST_SESSIONS, BASE, &params).expect("resolves");
        assert!(resolved.query.contains(&("includeDeleted".into(), "true".into())));
        assert!(resolved.query.contains(&("pageToken".into(), "abc 123".into())));

        let query = resolved.url.query().expect("query string");
        assert!(query.contains("includeDeleted=true"));
        assert!(query.contains("pageToken=abc%20123"));
        assert!(query.contains("startTime=2015-01-01T00%3A00%3A00Z"));
    }

    #[test]
    fn auth_key_is_passed_through_untouched() {
        let params = bag(json!({ "userId": "me", "auth": "ya29.token" }));
        let resolved = resolve(&LIST_SESSIONS, BASE, &params).expect("resolves");
        assert_eq!(resolved.auth, Some(json!("ya29.token")));
        assert!(resolved.query.is_empty());
        assert!(resolved.url.query().is_none());
    }

    #[test]
    fn substitution_rechecks_presence_independently_of_required_list() {
        // Descriptor defect: path param not covered by the required list.
        // The resolver must still fail deterministically before dispatch.
        static SKEWED: EndpointDescriptor = EndpointDescriptor {
            id: "svc.skewed",
            path: "/users/{userId}/items",
            method: Method::GET,
            required_params: &[],
            path_params: &["userId"],
        };

        let err = resolve(&SKEWED, BASE, &bag(json!({}))).unwrap_err();
        match err {
            FitError::MissingParameters { names } => {
                assert_eq!(names, vec!["userId".to_string()]);
            }
            other => panic!("expected MissingParameters, got {other:?}"),
        }
    }

    #[test]
    fn leftover_placeholder_is_a_malformed_template() {
        // Placeholder with no declared path param survives substitution.
        static BROKEN: EndpointDescriptor = EndpointDescriptor {
            id: "svc.broken",
            path: "/users/{userId}/items",
            method: Method::GET,
            required_params: &[],
            path_params: &[],
        };

        let err = resolve(&BROKEN, BASE, &bag(json!({}))).unwrap_err();
        assert!(matches!(err, FitError::MalformedTemplate { .. }));
    }

    #[test]
    fn query_values_are_stringified_without_interpretation() {
        let params = bag(json!({ "userId": "me", "limit": 1000 }));
        let resolved = resolve(&LIST_SESSIONS, BASE, &params).expect("resolves");
        assert_eq!(resolved.query, vec![("limit".to_string(), "1000".to_string())]);
    }
}
