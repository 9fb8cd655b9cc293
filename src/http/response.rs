//! Client-facing responses for terminal decisions.
//!
//! # Responsibilities
//! - Rejections: status only, empty body
//! - Redirects: 307 with an absolute `Location`
//! - Build same-host redirect targets, preserving the query string
//!
//! # Design Decisions
//! - 307 keeps the method and body on redirect
//! - Scheme for same-host redirects comes from `X-Forwarded-Proto`, then the
//!   request URI, then plain `http`; only `http` and `https` are accepted
//! - A location that cannot be a header value becomes a 500, never a panic

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

/// Header a TLS-terminating edge sets to the client-facing scheme.
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Empty-bodied response with the given status.
pub fn reject(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// `307 Temporary Redirect` to `location`.
pub fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::error!(location = %location, "Redirect target is not a valid header value");
            reject(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Absolute URL for a redirect to `path` on the requested host.
///
/// The original query string is carried over.
pub fn internal_redirect_location(
    headers: &HeaderMap,
    uri: &Uri,
    host: &str,
    path: &str,
) -> Result<String, url::ParseError> {
    let scheme = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(web_scheme)
        .or_else(|| uri.scheme_str().and_then(web_scheme))
        .unwrap_or("http");

    let mut url = url::Url::parse(&format!("{scheme}://{host}"))?;
    url.set_path(path);
    url.set_query(uri.query());
    Ok(url.into())
}

fn web_scheme(scheme: &str) -> Option<&'static str> {
    match scheme.trim() {
        s if s.eq_ignore_ascii_case("https") => Some("https"),
        s if s.eq_ignore_ascii_case("http") => Some("http"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_has_empty_body() {
        let response = reject(StatusCode::NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[test]
    fn test_redirect_is_temporary() {
        let response = redirect("https://demo.vercel.pub");
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://demo.vercel.pub"
        );
    }

    #[test]
    fn test_redirect_to_invalid_location() {
        let response = redirect("https://demo.vercel.pub/\n");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_location_preserves_query() {
        let uri: Uri = "/login?next=%2Fsite%2F1".parse().unwrap();
        let location =
            internal_redirect_location(&HeaderMap::new(), &uri, "app.example.com", "/").unwrap();
        assert_eq!(location, "http://app.example.com/?next=%2Fsite%2F1");
    }

    #[test]
    fn test_internal_location_without_query() {
        let uri: Uri = "/login".parse().unwrap();
        let location =
            internal_redirect_location(&HeaderMap::new(), &uri, "app.localhost:3000", "/").unwrap();
        assert_eq!(location, "http://app.localhost:3000/");
    }

    #[test]
    fn test_internal_location_scheme_sources() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("https, http"));
        let uri: Uri = "/login".parse().unwrap();
        assert_eq!(
            internal_redirect_location(&headers, &uri, "app.example.com", "/").unwrap(),
            "https://app.example.com/"
        );

        let uri: Uri = "https://app.example.com/login".parse().unwrap();
        assert_eq!(
            internal_redirect_location(&HeaderMap::new(), &uri, "app.example.com", "/").unwrap(),
            "https://app.example.com/"
        );
    }

    #[test]
    fn test_untrusted_forwarded_proto_falls_back() {
        let uri: Uri = "/login".parse().unwrap();
        for proto in ["javascript", "ftp", "data:text/html", "https:", ""] {
            let mut headers = HeaderMap::new();
            headers.insert(X_FORWARDED_PROTO, HeaderValue::from_str(proto).unwrap());
            assert_eq!(
                internal_redirect_location(&headers, &uri, "app.example.com", "/").unwrap(),
                "http://app.example.com/",
                "proto {proto:?}"
            );
        }

        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("HTTPS"));
        assert_eq!(
            internal_redirect_location(&headers, &uri, "app.example.com", "/").unwrap(),
            "https://app.example.com/"
        );
    }
}
