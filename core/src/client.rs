//! The happi API client.
//!
//! # Design
//! `Client` owns its configuration and a connection that is built on the
//! first call and then reused for the life of the client. Because the
//! connection snapshots the configuration, changing `host`, `timeout` or
//! `oauth_token` after the first call does not affect later calls.
//!
//! Every call is logged at `info` before it is sent. A response whose status
//! is in [`ERROR_TABLE`] becomes an [`Error::Api`]; any other status,
//! conventional or not, is returned to the caller as a success.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde_json::Value;

use crate::body::Body;
use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::{ApiError, Error, ErrorKind, ERROR_TABLE};
use crate::http::{HttpMethod, HttpResponse};
use crate::params::{ParamValue, Params};
use crate::transport::{Transport, UreqTransport};

type TransportFactory = Arc<dyn Fn(&ClientConfig) -> Box<dyn Transport> + Send + Sync>;

/// Synchronous client for a versioned JSON API.
pub struct Client {
    config: ClientConfig,
    transport_factory: TransportFactory,
    connection: OnceLock<Connection>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("connection", &self.connection.get())
            .finish_non_exhaustive()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// A client with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_transport(config, |config: &ClientConfig| {
            Box::new(UreqTransport::new(Duration::from_secs(config.timeout))) as Box<dyn Transport>
        })
    }

    /// Merge `options` (a JSON object) over the defaults. Unknown keys are
    /// rejected.
    pub fn from_options(options: Value) -> Result<Self, Error> {
        Ok(Self::with_config(ClientConfig::from_options(options)?))
    }

    /// Like [`from_options`](Self::from_options), then let `setup` adjust the
    /// configuration before the client is used.
    pub fn with_setup(options: Value, setup: impl FnOnce(&mut ClientConfig)) -> Result<Self, Error> {
        let mut config = ClientConfig::from_options(options)?;
        setup(&mut config);
        Ok(Self::with_config(config))
    }

    /// Use `factory` instead of the default `ureq` transport. The factory
    /// runs once, when the connection is first needed.
    pub fn with_transport<F>(config: ClientConfig, factory: F) -> Self
    where
        F: Fn(&ClientConfig) -> Box<dyn Transport> + Send + Sync + 'static,
    {
        Self {
            config,
            transport_factory: Arc::new(factory),
            connection: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Mutable access to the configuration. Has no effect on a connection
    /// that has already been built.
    pub fn config_mut(&mut self) -> &mut ClientConfig {
        &mut self.config
    }

    /// The status-to-error table this client raises from.
    pub fn errors(&self) -> &'static [(u16, ErrorKind)] {
        &ERROR_TABLE
    }

    /// The connection, built from the current configuration on first use.
    pub fn connection(&self) -> &Connection {
        self.connection.get_or_init(|| {
            tracing::debug!(host = %self.config.host, timeout = self.config.timeout, "building connection");
            Connection::new(&self.config, (self.transport_factory)(&self.config))
        })
    }

    /// `/api/{version}/{resource}`. `resource` is used verbatim.
    pub fn url(&self, resource: &str) -> String {
        format!("/api/{}/{}", self.config.version, resource)
    }

    pub fn get(&self, resource: &str, params: Params) -> Result<Body, Error> {
        self.request(HttpMethod::Get, resource, params)
    }

    pub fn post(&self, resource: &str, params: Params) -> Result<Body, Error> {
        self.request(HttpMethod::Post, resource, params)
    }

    pub fn patch(&self, resource: &str, params: Params) -> Result<Body, Error> {
        self.request(HttpMethod::Patch, resource, params)
    }

    fn request(&self, method: HttpMethod, resource: &str, params: Params) -> Result<Body, Error> {
        let response = self.call(method, &self.url(resource), &self.param_check(params))?;
        Ok(response.body)
    }

    /// Send one request and apply the error table to its status.
    pub fn call(&self, method: HttpMethod, url: &str, params: &Params) -> Result<HttpResponse, Error> {
        tracing::info!("{method}, {url}, {params}");
        let response = self.connection().send(method, url, params)?;
        if let Some(error) = self.raise_error(&response) {
            return Err(error);
        }
        Ok(response)
    }

    /// The error for `response`'s status, or `None` if the status is not
    /// mapped. The message is the body's `errors` field when that is present
    /// and truthy, otherwise the whole body.
    pub fn raise_error(&self, response: &HttpResponse) -> Option<Error> {
        let kind = ErrorKind::from_status(response.status)?;
        let message = match response.body.get("errors") {
            Some(errors) if is_truthy(errors) => errors.clone(),
            _ => response.body.as_value().clone(),
        };
        Some(Error::Api(ApiError { kind, message }))
    }

    /// Normalize parameters for sending: nested mappings are normalized
    /// recursively and multipart-capable values are converted to parts.
    pub fn param_check(&self, params: Params) -> Params {
        params
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    ParamValue::Map(map) => ParamValue::Map(self.param_check(map)),
                    ParamValue::Upload(upload) => ParamValue::Part(upload.multipart()),
                    other => other,
                };
                (key, value)
            })
            .collect()
    }
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}
