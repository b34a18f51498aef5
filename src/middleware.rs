use std::collections::HashMap;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::Value;
use tracing::info;
use url::form_urlencoded;

use crate::error::AppError;

/// 1 MiB cap on buffered request bodies.
const MAX_BODY_BYTES: usize = 1_048_576;

/// Cookies parsed from the `Cookie` header, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Cookies(pub HashMap<String, String>);

/// Request body parsed as JSON when the content type is `application/json`.
#[derive(Debug, Clone, Default)]
pub struct JsonBody(pub Option<Value>);

/// Form fields from a URL-encoded body. Repeated keys collect into arrays;
/// nested object syntax is not interpreted.
#[derive(Debug, Clone, Default)]
pub struct FormBody(pub Option<Value>);

/// Access log line: ISO timestamp, request line, status, latency,
/// referrer, user agent.
pub async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().to_string();
    let version = req.version();
    let referrer = header_or_dash(req.headers(), header::REFERER);
    let user_agent = header_or_dash(req.headers(), header::USER_AGENT);

    let start = Instant::now();
    let response = next.run(req).await;
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    info!(
        target: "access",
        "{} \"{} {} {:?}\" {} {:.3} ms \"{}\" \"{}\"",
        chrono::Utc::now().to_rfc3339(),
        method,
        path,
        version,
        response.status().as_u16(),
        latency_ms,
        referrer,
        user_agent,
    );

    response
}

/// Attaches a [`Cookies`] extension to every request.
pub async fn parse_cookies(mut req: Request, next: Next) -> Response {
    let cookies = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(parse_cookie_header)
        .unwrap_or_default();
    req.extensions_mut().insert(Cookies(cookies));
    next.run(req).await
}

/// Attaches a [`JsonBody`] extension. The body is buffered and reinstated
/// byte for byte so downstream signature checks still see the raw payload.
pub async fn parse_json_body(req: Request, next: Next) -> Result<Response, AppError> {
    let is_json = content_type_is(req.headers(), "application/json");
    let (mut req, bytes) = buffer_body(req).await?;

    let parsed = if is_json && !bytes.is_empty() {
        serde_json::from_slice(&bytes).ok()
    } else {
        None
    };
    req.extensions_mut().insert(JsonBody(parsed));

    Ok(next.run(req).await)
}

/// Attaches a [`FormBody`] extension, again reinstating the raw body.
pub async fn parse_urlencoded_body(req: Request, next: Next) -> Result<Response, AppError> {
    let is_form = content_type_is(req.headers(), "application/x-www-form-urlencoded");
    let (mut req, bytes) = buffer_body(req).await?;

    let parsed = if is_form && !bytes.is_empty() {
        Some(parse_form(&bytes))
    } else {
        None
    };
    req.extensions_mut().insert(FormBody(parsed));

    Ok(next.run(req).await)
}

async fn buffer_body(req: Request) -> Result<(Request, Bytes), AppError> {
    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::PayloadTooLarge)?;
    let req = Request::from_parts(parts, Body::from(bytes.clone()));
    Ok((req, bytes))
}

fn header_or_dash(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(&name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

fn content_type_is(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .eq_ignore_ascii_case(expected)
        })
        .unwrap_or(false)
}

fn parse_cookie_header(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn parse_form(bytes: &[u8]) -> Value {
    let mut fields = serde_json::Map::new();
    for (key, value) in form_urlencoded::parse(bytes) {
        let key = key.into_owned();
        let value = Value::String(value.into_owned());
        match fields.get_mut(&key) {
            None => {
                fields.insert(key, value);
            }
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
    Value::Object(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cookie_header_parses_into_map() {
        let cookies = parse_cookie_header("session=abc123; theme=dark ; =skipme");
        assert_eq!(cookies.get("session").map(String::as_str), Some("abc123"));
        assert_eq!(cookies.get("theme").map(String::as_str), Some("dark"));
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn form_parsing_keeps_strings_and_arrays_only() {
        let parsed = parse_form(b"name=bolt&tag=a&tag=b&tag=c&user%5Bid%5D=7");
        assert_eq!(parsed["name"], "bolt");
        assert_eq!(parsed["tag"], json!(["a", "b", "c"]));
        // Bracket syntax stays a flat key, never a nested object.
        assert_eq!(parsed["user[id]"], "7");
    }

    #[test]
    fn form_values_are_percent_decoded() {
        let parsed = parse_form(b"text=hello+world%21");
        assert_eq!(parsed["text"], "hello world!");
    }

    #[test]
    fn content_type_matching_ignores_parameters_and_case() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            "Application/JSON; charset=utf-8".parse().unwrap(),
        );
        assert!(content_type_is(&headers, "application/json"));
        assert!(!content_type_is(
            &headers,
            "application/x-www-form-urlencoded"
        ));
    }

    #[tokio::test]
    async fn buffered_body_is_reinstated_unchanged() {
        let raw = br#"{"type":"event_callback"}"#;
        let req = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .body(Body::from(&raw[..]))
            .unwrap();

        let (req, bytes) = buffer_body(req).await.unwrap();
        assert_eq!(&bytes[..], raw);

        let replayed = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
            .await
            .unwrap();
        assert_eq!(&replayed[..], raw);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from(vec![b'x'; MAX_BODY_BYTES + 1]))
            .unwrap();

        let err = buffer_body(req).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge));
    }
}
