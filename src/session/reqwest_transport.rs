//! Reqwest-based implementation of the `HttpTransport` trait.
//!
//! The wrapped client owns the cookie jar for the lifetime of the session and
//! has redirects disabled so callers observe the intermediate 30x responses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, redirect::Policy};

use super::transport::{
    HttpTransport, RequestBody, TransportError, TransportRequest, TransportResponse,
};

/// Reqwest-backed transport with its own cookie store.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a new transport with a private cookie jar, redirects disabled,
    /// and the given request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .cookie_store(true)
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Transport(err.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url).headers(headers);

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Json(bytes) => builder.body(bytes),
            RequestBody::Multipart(form) => {
                let mut multipart = Form::new();
                for (name, value) in form.fields {
                    multipart = multipart.text(name, value);
                }
                for file in form.files {
                    multipart = multipart
                        .part(file.field, Part::bytes(file.content).file_name(file.file_name));
                }
                builder.multipart(multipart)
            }
        };

        let response = builder.send().await.map_err(map_error)?;
        to_transport_response(response).await
    }
}

fn map_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Transport(err.to_string())
    }
}

async fn to_transport_response(
    response: reqwest::Response,
) -> Result<TransportResponse, TransportError> {
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let is_redirect = response.status().is_redirection();
    let body = response.bytes().await.map_err(map_error)?.to_vec();

    Ok(TransportResponse {
        status,
        headers,
        body,
        is_redirect,
    })
}
