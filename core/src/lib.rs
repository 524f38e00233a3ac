//! Synchronous client for versioned JSON APIs.
//!
//! # Overview
//! [`Client`] issues GET/POST/PATCH calls against `{host}/api/{version}/...`,
//! authenticates with an OAuth2 bearer token, normalizes nested and
//! multipart parameters, and maps a fixed set of HTTP statuses to
//! [`ErrorKind`]s.
//!
//! # Design
//! - Configuration is an explicit [`ClientConfig`]; unknown option keys are
//!   rejected at construction.
//! - The connection is built on first use and reused afterwards.
//! - Transports are pluggable ([`Transport`]); the default is `ureq`.
//! - Statuses outside [`ERROR_TABLE`] are successes. Network failures are
//!   reported as [`Error::Transport`], never as API errors.

mod body;
mod client;
pub mod config;
mod connection;
mod encode;
pub mod error;
pub mod http;
pub mod logging;
pub mod params;
mod transport;

pub use body::Body;
pub use client::Client;
pub use config::ClientConfig;
pub use connection::Connection;
pub use error::{ApiError, Error, ErrorKind, TransportError, ERROR_TABLE};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RawResponse};
pub use params::{FileUpload, Multipart, ParamValue, Params, Part};
pub use transport::{Transport, UreqTransport};
