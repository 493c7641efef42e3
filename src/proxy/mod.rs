// src/proxy/mod.rs
//! POST-only pass-through to the stock-picker run endpoint.

use bytes::Bytes;
use reqwest::Client;
use std::convert::Infallible;
use tracing::{error, info};
use url::Url;
use warp::{
    http::{header::ALLOW, HeaderMap, Method, Response, StatusCode},
    hyper::Body,
    reply::Reply,
    Filter, Rejection,
};

/// Connection-scoped headers that must not be forwarded in either direction.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| h.eq_ignore_ascii_case(name))
}

/// Copy of `headers` without hop-by-hop entries; repeated headers are kept.
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name.as_str()) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

#[derive(Clone)]
pub struct ProxyState {
    pub client: Client,
    pub upstream: Url,
}

fn error_reply(status: StatusCode, message: &str) -> warp::reply::Response {
    warp::reply::with_status(
        warp::reply::json(&serde_json::json!({ "error": message })),
        status,
    )
    .into_response()
}

async fn forward(
    state: ProxyState,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<warp::reply::Response, Infallible> {
    if method != Method::POST {
        let mut resp = error_reply(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        resp.headers_mut()
            .insert(ALLOW, warp::http::HeaderValue::from_static("POST"));
        return Ok(resp);
    }

    let upstream = state
        .client
        .post(state.upstream.clone())
        .headers(forwardable_headers(&headers))
        .body(body)
        .send()
        .await;

    let upstream = match upstream {
        Ok(resp) => resp,
        Err(e) => {
            error!("Stock picker proxy request failed: {}", e);
            return Ok(error_reply(StatusCode::BAD_GATEWAY, "Bad Gateway"));
        }
    };

    let status = upstream.status();
    let upstream_headers = forwardable_headers(upstream.headers());
    let body = match upstream.bytes().await {
        Ok(b) => b,
        Err(e) => {
            error!("Stock picker proxy body read failed: {}", e);
            return Ok(error_reply(StatusCode::BAD_GATEWAY, "Bad Gateway"));
        }
    };
    info!(status = status.as_u16(), bytes = body.len(), "proxied stock picker run");

    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = status;
    *resp.headers_mut() = upstream_headers;
    Ok(resp)
}

/// `/api/proxy/stock-picker/run` for any method; only POST is forwarded.
pub fn routes(
    state: ProxyState,
) -> impl Filter<Extract = (warp::reply::Response,), Error = Rejection> + Clone {
    warp::path!("api" / "proxy" / "stock-picker" / "run")
        .map(move || state.clone())
        .and(warp::method())
        .and(warp::header::headers_cloned())
        .and(warp::body::bytes())
        .and_then(forward)
}

pub fn health() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("health").and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({
            "status": "healthy",
            "service": "stock-picker-proxy"
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn spawn_upstream() -> SocketAddr {
        let route = warp::path!("api" / "stock-picker" / "run")
            .and(warp::post())
            .and(warp::header::headers_cloned())
            .and(warp::body::bytes())
            .map(|headers: HeaderMap, body: Bytes| {
                let seen_auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let seen_proxy_auth = headers.contains_key("proxy-authorization");
                let reply = warp::reply::with_status(body.to_vec(), StatusCode::ACCEPTED);
                let reply = warp::reply::with_header(reply, "x-seen-auth", seen_auth);
                let reply =
                    warp::reply::with_header(reply, "x-seen-proxy-auth", seen_proxy_auth.to_string());
                warp::reply::with_header(reply, "connection", "keep-alive")
            });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    fn state_for(upstream: &str) -> ProxyState {
        ProxyState {
            client: Client::new(),
            upstream: Url::parse(upstream).unwrap(),
        }
    }

    #[test]
    fn test_hop_by_hop_filtering() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", "close".parse().unwrap());
        headers.insert("host", "example.com".parse().unwrap());
        headers.insert("authorization", "Bearer t".parse().unwrap());
        headers.append("x-multi", "a".parse().unwrap());
        headers.append("x-multi", "b".parse().unwrap());

        let out = forwardable_headers(&headers);
        assert!(out.get("connection").is_none());
        assert!(out.get("host").is_none());
        assert_eq!(out.get("authorization").unwrap(), "Bearer t");
        assert_eq!(out.get_all("x-multi").iter().count(), 2);
        assert!(is_hop_by_hop("Transfer-Encoding"));
    }

    #[tokio::test]
    async fn test_non_post_is_rejected() {
        let api = routes(state_for("http://127.0.0.1:1/api/stock-picker/run"));
        let resp = warp::test::request()
            .method("GET")
            .path("/api/proxy/stock-picker/run")
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers().get(ALLOW).unwrap(), "POST");
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["error"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let api = routes(state_for("http://127.0.0.1:1/api/stock-picker/run"));
        let resp = warp::test::request()
            .method("POST")
            .path("/api/proxy/stock-picker/run")
            .body(r#"{"run_id":"x"}"#)
            .reply(&api)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["error"], "Bad Gateway");
    }

    #[tokio::test]
    async fn test_post_is_passed_through() {
        let addr = spawn_upstream();
        let api = routes(state_for(&format!("http://{addr}/api/stock-picker/run")));
        let payload = r#"{"run_id":"abc","strategy":"hold","cash":10,"positions":[]}"#;

        let resp = warp::test::request()
            .method("POST")
            .path("/api/proxy/stock-picker/run")
            .header("content-type", "application/json")
            .header("authorization", "Bearer token-1")
            .header("proxy-authorization", "Basic xyz")
            .body(payload)
            .reply(&api)
            .await;

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(resp.body().as_ref(), payload.as_bytes());
        assert_eq!(resp.headers().get("x-seen-auth").unwrap(), "Bearer token-1");
        assert_eq!(resp.headers().get("x-seen-proxy-auth").unwrap(), "false");
        assert!(resp.headers().get("connection").is_none());
    }

    #[tokio::test]
    async fn test_health() {
        let resp = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&health())
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
