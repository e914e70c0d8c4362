use axum::http::{HeaderMap, HeaderValue, header};
use axum_extra::headers::{self, HeaderMapExt};
use base64::{Engine, prelude::BASE64_STANDARD};

/// Midtrans authenticates with HTTP basic auth: the server key as the user name
/// and an empty password.
pub fn authenticated_headers(server_key: &str) -> HeaderMap {
    let auth = BASE64_STANDARD.encode(format!("{server_key}:"));
    let mut map = HeaderMap::new();
    let mut value =
        HeaderValue::from_str(&format!("Basic {auth}")).expect("base64 header value is ascii");
    value.set_sensitive(true);
    map.insert(header::AUTHORIZATION, value);
    map.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    map.typed_insert(headers::ContentType::json());
    map
}
