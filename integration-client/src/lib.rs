//! Typed API client for remote services.
//!
//! [`ApiClient`] executes [`Endpoint`] descriptions over HTTP(S), decoding
//! JSON responses into typed results or raw [`Payload`] maps, and opens
//! server-push streams whose `data:` frames are yielded lazily as they arrive.

#![warn(missing_docs, clippy::pedantic)]

mod client;
mod config;
mod endpoint;
mod error;
mod http_client;
mod sse;

pub use client::{ApiClient, EventStream};
pub use config::{ClientConfig, DEFAULT_POOL_IDLE_TIMEOUT, DEFAULT_TIMEOUT};
pub use endpoint::{ApiRequest, Endpoint};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use hyper::Method;
pub use integration_primitives::{DynamicValue, Payload};
