//! The memoized connection a [`Client`](crate::Client) sends through.
//!
//! # Design
//! A connection snapshots the host and bearer token when it is built and
//! then composes, per request: parameter encoding (multipart when any part
//! is present, url-encoded otherwise), the `Authorization` header, the
//! transport round trip, and JSON decoding of `application/json` bodies.

use std::fmt;

use serde_json::Value;

use crate::body::Body;
use crate::config::ClientConfig;
use crate::encode;
use crate::error::{Error, ErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RawResponse};
use crate::params::Params;
use crate::transport::Transport;

pub struct Connection {
    host: String,
    oauth_token: Option<String>,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("authorized", &self.oauth_token.is_some())
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(config: &ClientConfig, transport: Box<dyn Transport>) -> Self {
        let oauth_token = config.oauth_token.clone().filter(|token| !token.is_empty());
        Self {
            host: config.host.trim_end_matches('/').to_string(),
            oauth_token,
            transport,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build the request for `path` (relative to the host) without sending it.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: &Params,
    ) -> Result<HttpRequest, Error> {
        let encoded = encode::encode(method, &format!("{}{path}", self.host), params)?;

        let mut headers = Vec::new();
        if let Some(content_type) = encoded.content_type {
            headers.push(("content-type".to_string(), content_type));
        }
        if let Some(token) = &self.oauth_token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }

        Ok(HttpRequest {
            method,
            url: encoded.url,
            headers,
            body: encoded.body,
        })
    }

    pub fn send(&self, method: HttpMethod, path: &str, params: &Params) -> Result<HttpResponse, Error> {
        let request = self.build_request(method, path, params)?;
        let raw = self.transport.send(request)?;
        parse_response(raw)
    }
}

/// Decode the body when the response declares JSON; otherwise keep the
/// text. An empty JSON body decodes to `null`. A malformed JSON body is an
/// error only for statuses outside the error table; mapped statuses keep the
/// text so their kind still reaches the caller.
fn parse_response(raw: RawResponse) -> Result<HttpResponse, Error> {
    let is_json = raw
        .header("content-type")
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false);

    let body = if is_json {
        if raw.body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            match serde_json::from_slice(&raw.body) {
                Ok(value) => value,
                Err(_) if ErrorKind::from_status(raw.status).is_some() => {
                    Value::String(String::from_utf8_lossy(&raw.body).into_owned())
                }
                Err(e) => return Err(Error::Decode(e)),
            }
        }
    } else {
        Value::String(String::from_utf8_lossy(&raw.body).into_owned())
    };

    Ok(HttpResponse {
        status: raw.status,
        headers: raw.headers,
        body: Body::new(body),
    })
}
