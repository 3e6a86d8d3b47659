//! Header filtering for relayed exchanges.
//!
//! Hop-by-hop headers are meaningful only between adjacent connection
//! endpoints and must not be relayed verbatim; everything else passes
//! through unchanged.

use axum::http::{header, HeaderMap};

/// Hop-by-hop response headers stripped before relaying.
pub const HOP_BY_HOP: [&str; 8] = [
    "transfer-encoding",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "upgrade",
];

/// Remove hop-by-hop headers from a backend response in place.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Copy request headers for the upstream request, dropping `Host` so the
/// client builds the correct one for the backend authority.
pub fn forwardable_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if name != &header::HOST {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn strips_every_hop_by_hop_header() {
        let mut headers = HeaderMap::new();
        for name in HOP_BY_HOP {
            headers.insert(name, HeaderValue::from_static("x"));
        }
        headers.insert("content-type", HeaderValue::from_static("text/html"));
        headers.insert("x-custom", HeaderValue::from_static("keep"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("content-type").unwrap(), "text/html");
        assert_eq!(headers.get("x-custom").unwrap(), "keep");
    }

    #[test]
    fn request_copy_drops_host_only() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("edge.example"));
        headers.insert("accept", HeaderValue::from_static("*/*"));
        headers.append("cookie", HeaderValue::from_static("a=1"));
        headers.append("cookie", HeaderValue::from_static("b=2"));

        let out = forwardable_request_headers(&headers);

        assert!(out.get("host").is_none());
        assert_eq!(out.get("accept").unwrap(), "*/*");
        assert_eq!(out.get_all("cookie").iter().count(), 2);
    }
}
