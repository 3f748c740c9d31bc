use crate::tracing::{scope_request_id, RequestId};
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{debug, Instrument};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id that is echoed back as-is
const MAX_REQUEST_ID_LEN: usize = 128;

fn is_acceptable_id(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
}

/// Keeps the storefront's id when it is short and plain ASCII, otherwise
/// mints a fresh one.
fn resolve_request_id(headers: &HeaderMap) -> RequestId {
    match headers.get(REQUEST_ID_HEADER).map(|v| v.to_str()) {
        Some(Ok(raw)) if is_acceptable_id(raw.trim()) => RequestId::new(raw.trim()),
        Some(_) => {
            let fresh = RequestId::default();
            debug!(replacement = %fresh, "ignoring malformed x-request-id");
            fresh
        }
        None => RequestId::default(),
    }
}

/// Tags every request with an id: request header, extension, task-local for
/// error bodies, tracing span and response header.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(request.headers());
    let header = HeaderName::from_static(REQUEST_ID_HEADER);
    let value = HeaderValue::from_str(request_id.as_str()).ok();

    if let Some(value) = &value {
        request.headers_mut().insert(header.clone(), value.clone());
    }
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
    );
    let mut response = scope_request_id(request_id, next.run(request).instrument(span)).await;

    if let Some(value) = value {
        response.headers_mut().insert(header, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;
    use axum::{
        body::{to_bytes, Body},
        extract::Extension,
        http::Request as HttpRequest,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn echo(Extension(request_id): Extension<RequestId>) -> String {
        request_id.to_string()
    }

    async fn missing_product() -> Result<String, ServiceError> {
        Err(ServiceError::not_found("Product", 42))
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(echo))
            .route("/products/42", get(missing_product))
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    async fn send(uri: &str, request_id: Option<&str>) -> (Option<String>, String) {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let header = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (header, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn fresh_id_reaches_handler_and_response() {
        let (header, body) = send("/", None).await;
        assert_eq!(header.as_deref(), Some(body.as_str()));
        assert_eq!(body.len(), 36);
    }

    #[tokio::test]
    async fn storefront_id_is_kept() {
        let (header, body) = send("/", Some("checkout-7f3a:2")).await;
        assert_eq!(header.as_deref(), Some("checkout-7f3a:2"));
        assert_eq!(body, "checkout-7f3a:2");
    }

    #[tokio::test]
    async fn malformed_ids_are_replaced() {
        let too_long = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        for bad in ["has spaces in it", "semi;colon", too_long.as_str()] {
            let (header, body) = send("/", Some(bad)).await;
            assert_ne!(body, bad);
            assert_eq!(header.as_deref(), Some(body.as_str()));
        }
    }

    #[tokio::test]
    async fn error_body_carries_the_same_id() {
        let (header, body) = send("/products/42", Some("order-991")).await;
        assert_eq!(header.as_deref(), Some("order-991"));
        let payload: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(payload["request_id"], "order-991");
        assert_eq!(payload["error"], "Not Found");
    }

    #[test]
    fn acceptable_id_rules() {
        assert!(is_acceptable_id("req_1.2-3:4"));
        assert!(!is_acceptable_id(""));
        assert!(!is_acceptable_id("ünïcode"));
    }
}
