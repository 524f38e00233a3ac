//! Pluggable transports.
//!
//! The connection hands a transport a fully encoded [`HttpRequest`] and gets
//! back a [`RawResponse`]. Status codes are data here; interpreting them is
//! the client's job.

use std::io::Read as _;
use std::time::Duration;

use ureq::http;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, RawResponse};

/// Executes one encoded request.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

/// A blocking [`Transport`] backed by [`ureq`].
#[derive(Debug)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let mut builder = http::Request::builder()
            .method(to_http_method(request.method))
            .uri(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let result = match request.body {
            Some(body) => {
                let req = builder
                    .body(body)
                    .map_err(|e| TransportError::Other(Box::new(e)))?;
                self.agent.run(req)
            }
            None => {
                let req = builder
                    .body(())
                    .map_err(|e| TransportError::Other(Box::new(e)))?;
                self.agent.run(req)
            }
        };

        match result {
            Ok(response) => convert_response(response),
            Err(ureq::Error::Timeout(_)) => Err(TransportError::Timeout),
            Err(ureq::Error::HostNotFound) => {
                Err(TransportError::Connection("host not found".to_owned()))
            }
            Err(ureq::Error::ConnectionFailed) => {
                Err(TransportError::Connection("connection failed".to_owned()))
            }
            Err(ureq::Error::Io(e)) => Err(TransportError::Connection(e.to_string())),
            Err(e) => Err(TransportError::Other(Box::new(e))),
        }
    }
}

fn to_http_method(method: HttpMethod) -> http::Method {
    match method {
        HttpMethod::Get => http::Method::GET,
        HttpMethod::Post => http::Method::POST,
        HttpMethod::Patch => http::Method::PATCH,
    }
}

fn convert_response(response: http::Response<ureq::Body>) -> Result<RawResponse, TransportError> {
    let (parts, body) = response.into_parts();

    let mut bytes = Vec::new();
    body.into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    Ok(RawResponse {
        status: parts.status.as_u16(),
        headers,
        body: bytes,
    })
}
