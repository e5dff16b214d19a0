//! Stub transport and response fixtures for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue, LOCATION};
use serde_json::Value;

use crate::session::{HttpTransport, TransportError, TransportRequest, TransportResponse};

/// Replays canned responses in order and records every request.
pub struct StubTransport {
    responses: Mutex<Vec<TransportResponse>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl StubTransport {
    pub fn new(responses: Vec<TransportResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// `"METHOD /path"` for every request seen so far.
    pub fn paths(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| format!("{} {}", request.method, request.url.path()))
            .collect()
    }

    pub fn request(&self, index: usize) -> TransportRequest {
        self.requests.lock().unwrap()[index].clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        let wanted = format!("{method} {path}");
        self.paths().into_iter().filter(|seen| *seen == wanted).count()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| TransportError::Transport("no more stub responses".into()))
    }
}

pub fn html_page(nonce: &str) -> String {
    format!(
        r#"<html><head><script>
            var init = {{
                'urlRoot': "",
                'csrfNonce': "{nonce}",
                'userMode': "teams",
            }}
        </script></head><body></body></html>"#
    )
}

fn response(status: u16, headers: HeaderMap, body: Vec<u8>) -> TransportResponse {
    TransportResponse {
        status,
        headers,
        body,
        is_redirect: (300..400).contains(&status),
    }
}

pub fn ok_html(body: &str) -> TransportResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
    response(200, headers, body.as_bytes().to_vec())
}

pub fn json(status: u16, value: Value) -> TransportResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response(status, headers, serde_json::to_vec(&value).unwrap())
}

pub fn ok_json(value: Value) -> TransportResponse {
    json(200, value)
}

pub fn redirect(location: &str) -> TransportResponse {
    let mut headers = HeaderMap::new();
    headers.insert(LOCATION, HeaderValue::from_str(location).unwrap());
    response(302, headers, Vec::new())
}
